use serde::Deserialize;

use crate::webhooks::gitlab::events::{Commit, Payload, Project, User};

/// Statuses after which a pipeline or a job won't change anymore.
const FINISHED_STATUSES: [&str; 3] = ["success", "failed", "canceled"];

pub fn is_finished(status: &str) -> bool {
    FINISHED_STATUSES.contains(&status)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PipelineEvent {
    pub user: Option<User>,
    pub project: Option<Project>,
    pub object_attributes: PipelineAttributes,
    pub commit: Option<Commit>,
    #[serde(default)]
    pub builds: Vec<PipelineBuild>,
}

impl Payload for PipelineEvent {
    const REQUIRED: &'static [&'static str] = &["/object_attributes"];
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PipelineAttributes {
    pub id: Option<u64>,
    pub r#ref: Option<String>,
    pub tag: Option<bool>,
    pub sha: Option<String>,
    pub before_sha: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub stages: Vec<String>,
    pub created_at: Option<String>,
    pub finished_at: Option<String>,
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PipelineBuild {
    pub id: Option<u64>,
    pub stage: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
}

impl PipelineEvent {
    /// Jobs of the pipeline that failed, in the order GitLab listed them.
    pub fn failed_builds(&self) -> impl Iterator<Item = &PipelineBuild> {
        self.builds
            .iter()
            .filter(|build| build.status.as_deref() == Some("failed"))
    }
}

/// A single job, GitLab still calls those builds in hook payloads.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BuildEvent {
    pub user: Option<User>,
    pub project: Option<Project>,
    pub object_attributes: BuildAttributes,
    pub commit: Option<Commit>,
}

impl Payload for BuildEvent {
    const REQUIRED: &'static [&'static str] = &["/object_attributes"];
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BuildAttributes {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub stage: Option<String>,
    pub status: Option<String>,
    pub r#ref: Option<String>,
    pub tag: Option<bool>,
    pub sha: Option<String>,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub duration: Option<f64>,
    pub allow_failure: Option<bool>,
}
