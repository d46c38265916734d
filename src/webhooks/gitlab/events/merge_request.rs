use std::fmt::Display;

use serde::Deserialize;

use crate::{
    announcer::utils::shorten_content,
    webhooks::gitlab::events::{Commit, Payload, Project, User},
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MergeRequestEvent {
    pub user: Option<User>,
    pub project: Option<Project>,
    pub object_attributes: MergeRequestAttributes,
}

impl Payload for MergeRequestEvent {
    const REQUIRED: &'static [&'static str] = &[
        "/object_attributes/source_project_id",
        "/object_attributes/target_project_id",
        "/object_attributes/target_branch",
    ];
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MergeRequestAttributes {
    pub id: Option<u64>,
    pub iid: Option<u64>,
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub state: Option<String>,
    pub merge_status: Option<String>,
    pub action: Option<String>,
    pub url: Option<String>,
    pub source_branch: Option<String>,
    pub target_branch: String,
    pub source_project_id: u64,
    pub target_project_id: u64,
    pub author_id: Option<u64>,
    pub assignee_id: Option<u64>,
    pub work_in_progress: Option<bool>,
    pub last_commit: Option<Commit>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl MergeRequestAttributes {
    /// Whether the MR comes from a fork.
    pub fn is_cross_project(&self) -> bool {
        self.source_project_id != self.target_project_id
    }
}

impl Display for MergeRequestAttributes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.iid.or(self.id) {
            Some(iid) => write!(f, "!{} ({})", iid, shorten_content(&self.title)),
            None => write!(f, "({})", shorten_content(&self.title)),
        }
    }
}
