use serde::Deserialize;

use crate::webhooks::gitlab::events::{Payload, Project, User};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WikiPageEvent {
    pub user: Option<User>,
    pub project: Option<Project>,
    pub wiki: Option<Wiki>,
    pub object_attributes: WikiPageAttributes,
}

impl Payload for WikiPageEvent {
    const REQUIRED: &'static [&'static str] = &["/object_attributes"];
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Wiki {
    pub web_url: Option<String>,
    pub path_with_namespace: Option<String>,
    pub default_branch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WikiPageAttributes {
    #[serde(default)]
    pub title: String,
    pub content: Option<String>,
    pub format: Option<String>,
    pub message: Option<String>,
    pub slug: Option<String>,
    pub url: Option<String>,
    pub action: Option<String>,
}
