use std::fmt::Display;

use serde::Deserialize;

use crate::{
    announcer::utils::shorten_content,
    webhooks::gitlab::events::{Payload, Project, User},
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IssueEvent {
    pub user: Option<User>,
    pub project: Option<Project>,
    pub object_attributes: IssueAttributes,
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl Payload for IssueEvent {
    const REQUIRED: &'static [&'static str] = &["/object_attributes/id"];
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IssueAttributes {
    pub id: u64,
    pub iid: Option<u64>,
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub state: Option<String>,
    pub action: Option<String>,
    pub url: Option<String>,
    pub author_id: Option<u64>,
    pub assignee_id: Option<u64>,
    pub project_id: Option<u64>,
    pub milestone_id: Option<u64>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Display for IssueAttributes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // iid is what users see, id is global to the instance
        write!(
            f,
            "#{} ({})",
            self.iid.unwrap_or(self.id),
            shorten_content(&self.title)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Label {
    pub id: Option<u64>,
    #[serde(default)]
    pub title: String,
    pub color: Option<String>,
}

#[cfg(test)]
mod tests {
    use crate::webhooks::gitlab::{Delivery, GitLabEvent};

    #[test]
    fn decodes_issue() {
        let delivery = Delivery::decode(
            br##"{
                "object_kind": "issue",
                "user": {"name": "Administrator", "username": "root"},
                "project": {"id": 1, "name": "Gitlab Test", "web_url": "http://example.com/gitlabhq/gitlab-test"},
                "object_attributes": {
                    "id": 301,
                    "iid": 23,
                    "title": "New API: create/update/delete file",
                    "state": "opened",
                    "action": "open",
                    "url": "http://example.com/diaspora/issues/23",
                    "confidential": false,
                    "time_estimate": 0
                },
                "labels": [{"id": 206, "title": "API", "color": "#ffffff"}]
            }"##,
        )
        .unwrap();

        let issue = match delivery.event {
            GitLabEvent::Issue(issue) => issue,
            other => panic!("expected an issue, got {:?}", other),
        };
        assert_eq!(issue.object_attributes.id, 301);
        assert_eq!(issue.object_attributes.state.as_deref(), Some("opened"));
        assert_eq!(issue.labels[0].title, "API");
        assert_eq!(
            issue.object_attributes.to_string(),
            "#23 (New API: create/update/delete file)"
        );
    }
}
