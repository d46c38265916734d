use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context;
use serde::Deserialize;
use url::Url;

use crate::webhooks::gitlab::ObjectKind;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProlabConfig {
    /// Which kinds of deliveries get announced
    #[serde(default)]
    pub events: EventToggles,
    /// Base URL of the GitLab instance, used for links when a payload doesn't carry any.
    /// May include a subpath (`https://example.org/gitlab`), with or without a trailing slash.
    pub gitlab_url: Option<Url>,
}

impl ProlabConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config_file =
            File::open(path).with_context(|| format!("couldn't open {}:", path.display()))?;
        serde_yaml::from_reader(BufReader::new(config_file)).context("couldn't parse config file")
    }
}

/// Same toggles as a GitLab project hook. Deliveries of a disabled kind are still decoded, they
/// just aren't announced.
#[derive(Debug, Clone, Deserialize)]
pub struct EventToggles {
    #[serde(default = "enabled")]
    pub push_events: bool,
    #[serde(default = "enabled")]
    pub tag_push_events: bool,
    #[serde(default = "enabled")]
    pub issues_events: bool,
    #[serde(default = "enabled")]
    pub merge_requests_events: bool,
    #[serde(default = "enabled")]
    pub note_events: bool,
    #[serde(default = "enabled")]
    pub pipeline_events: bool,
    #[serde(default = "enabled")]
    pub build_events: bool,
    #[serde(default = "enabled")]
    pub wiki_page_events: bool,
}

fn enabled() -> bool {
    true
}

impl Default for EventToggles {
    fn default() -> Self {
        Self {
            push_events: true,
            tag_push_events: true,
            issues_events: true,
            merge_requests_events: true,
            note_events: true,
            pipeline_events: true,
            build_events: true,
            wiki_page_events: true,
        }
    }
}

impl EventToggles {
    pub fn is_enabled(&self, kind: ObjectKind) -> bool {
        match kind {
            ObjectKind::Push => self.push_events,
            ObjectKind::TagPush => self.tag_push_events,
            ObjectKind::Issue => self.issues_events,
            ObjectKind::MergeRequest => self.merge_requests_events,
            ObjectKind::Note => self.note_events,
            ObjectKind::Pipeline => self.pipeline_events,
            ObjectKind::Build => self.build_events,
            ObjectKind::WikiPage => self.wiki_page_events,
        }
    }
}
