use serde::Deserialize;
use url::Url;

use crate::webhooks::gitlab::{
    error::{AccessError, ValidationError},
    events::{Payload, Project},
    kind::ObjectKind,
};

const BRANCH_PREFIX: &str = "refs/heads/";
const TAG_PREFIX: &str = "refs/tags/";
/// `after` of a push that deleted its ref.
const NULL_SHA: &str = "0000000000000000000000000000000000000000";

/// Payload shared by `push` and `tag_push` deliveries.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PushEvent {
    pub before: Option<String>,
    pub after: String,
    pub r#ref: String,
    pub checkout_sha: Option<String>,
    pub user_id: Option<u64>,
    pub user_name: Option<String>,
    pub user_username: Option<String>,
    pub user_email: Option<String>,
    pub project_id: Option<u64>,
    pub project: Option<Project>,
    #[serde(default)]
    pub repository: Repository,
    /// Oldest first, as GitLab sends them.
    pub commits: Vec<Commit>,
    pub total_commits_count: Option<u64>,
}

impl Payload for PushEvent {
    const REQUIRED: &'static [&'static str] = &["/after", "/ref", "/commits"];

    fn validate(&self, kind: ObjectKind) -> Result<(), ValidationError> {
        if let Some(i) = self.commits.iter().position(|commit| commit.id.is_empty()) {
            return Err(ValidationError::InvalidField {
                kind,
                field: format!("commits.{}.id", i),
                reason: "commit id is empty".to_owned(),
            });
        }

        if !self.commits.is_empty() && self.repository.url.is_none() {
            return Err(ValidationError::MissingField {
                kind,
                field: "repository.url".to_owned(),
            });
        }

        Ok(())
    }
}

impl PushEvent {
    /// Name of the pushed branch, i.e. the ref without its `refs/heads/` prefix.
    ///
    /// Fails for refs outside of `refs/heads/`, tags included.
    pub fn branch(&self) -> Result<&str, AccessError> {
        self.r#ref
            .strip_prefix(BRANCH_PREFIX)
            .ok_or_else(|| AccessError::NotABranch(self.r#ref.clone()))
    }

    pub fn tag(&self) -> Result<&str, AccessError> {
        self.r#ref
            .strip_prefix(TAG_PREFIX)
            .ok_or_else(|| AccessError::NotATag(self.r#ref.clone()))
    }

    /// The most recent commit of the push.
    ///
    /// Pushes deleting a ref don't carry any commit, this is [`AccessError::Empty`] and not a
    /// malformed payload.
    pub fn head(&self) -> Result<&Commit, AccessError> {
        self.commits.last().ok_or(AccessError::Empty)
    }

    pub fn is_deletion(&self) -> bool {
        self.after == NULL_SHA
    }

    /// GitLab caps the commits it sends, the real count lives in `total_commits_count`.
    pub fn total_commits(&self) -> u64 {
        self.total_commits_count
            .unwrap_or(self.commits.len() as u64)
    }

    pub fn username(&self) -> &str {
        self.user_username
            .as_deref()
            .or(self.user_name.as_deref())
            .unwrap_or("someone")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Repository {
    pub name: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub homepage: Option<String>,
}

impl Repository {
    pub fn ref_url(&self, r#ref: &str) -> Option<Url> {
        let homepage = self.homepage.as_deref()?;
        Url::parse(&format!("{}/-/tree/{}", homepage.trim_end_matches('/'), r#ref)).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Commit {
    pub id: String,
    #[serde(default)]
    pub message: String,
    pub timestamp: Option<String>,
    pub url: Option<String>,
    pub author: Option<CommitAuthor>,
    #[serde(default)]
    pub added: Vec<String>,
    #[serde(default)]
    pub modified: Vec<String>,
    #[serde(default)]
    pub removed: Vec<String>,
}

impl Commit {
    pub fn title(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CommitAuthor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[cfg(test)]
mod tests {
    use crate::webhooks::gitlab::{error::DecodeError, Delivery};

    use super::*;

    fn push(payload: &str) -> PushEvent {
        match Delivery::decode(payload.as_bytes()).unwrap().event {
            crate::webhooks::gitlab::GitLabEvent::Push(event) => event,
            other => panic!("expected a push, got {:?}", other),
        }
    }

    #[test]
    fn branch_deletion_has_no_head() {
        let event = push(
            r#"{
                "before": "da1560886d4f094c3e6c9ef40349f7d38b5d27d7",
                "after": "0000000000000000000000000000000000000000",
                "ref": "refs/heads/feature",
                "commits": [],
                "total_commits_count": 0
            }"#,
        );

        assert!(event.is_deletion());
        assert_eq!(event.branch(), Ok("feature"));
        assert_eq!(event.head(), Err(AccessError::Empty));
        assert_eq!(event.total_commits(), 0);
    }

    #[test]
    fn branch_keeps_slashes() {
        let event = push(r#"{"after": "a", "ref": "refs/heads/feature/login", "commits": []}"#);
        assert_eq!(event.branch(), Ok("feature/login"));
        assert_eq!(
            event.tag(),
            Err(AccessError::NotATag("refs/heads/feature/login".to_owned()))
        );
    }

    #[test]
    fn only_a_leading_prefix_is_stripped() {
        let event = push(r#"{"after": "a", "ref": "master", "commits": []}"#);
        assert_eq!(
            event.branch(),
            Err(AccessError::NotABranch("master".to_owned()))
        );

        let event = push(r#"{"after": "a", "ref": "refs/remotes/refs/heads/x", "commits": []}"#);
        assert!(event.branch().is_err());
    }

    #[test]
    fn commit_order_is_kept() {
        let event = push(
            r#"{
                "after": "c2",
                "ref": "refs/heads/master",
                "repository": {"url": "git@localhost:diaspora.git"},
                "commits": [
                    {"id": "c0", "message": "first"},
                    {"id": "c1", "message": "second\n\nwith a body"},
                    {"id": "c2", "message": "third"}
                ]
            }"#,
        );

        let ids: Vec<_> = event.commits.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["c0", "c1", "c2"]);
        assert_eq!(event.head().unwrap().id, "c2");
        assert_eq!(event.commits[1].title(), "second");
        assert_eq!(event.total_commits(), 3);
        assert!(event.commits[0].author.is_none());
    }

    #[test]
    fn empty_commit_id_is_invalid() {
        let err = Delivery::decode(
            br#"{
                "after": "a",
                "ref": "refs/heads/master",
                "repository": {"url": "git@localhost:diaspora.git"},
                "commits": [{"id": "c0"}, {"id": ""}]
            }"#,
        )
        .unwrap_err();

        match err {
            DecodeError::Validation(ValidationError::InvalidField { field, .. }) => {
                assert_eq!(field, "commits.1.id")
            }
            other => panic!("expected an invalid field, got {:?}", other),
        }
    }

    #[test]
    fn commits_need_a_repository_url() {
        let err = Delivery::decode(
            br#"{"after": "a", "ref": "refs/heads/master", "commits": [{"id": "c0"}]}"#,
        )
        .unwrap_err();

        match err {
            DecodeError::Validation(ValidationError::MissingField { field, .. }) => {
                assert_eq!(field, "repository.url")
            }
            other => panic!("expected a missing field, got {:?}", other),
        }
    }

    #[test]
    fn ref_url_uses_homepage() {
        let repository = Repository {
            homepage: Some("http://localhost/diaspora/".to_owned()),
            ..Default::default()
        };

        assert_eq!(
            repository.ref_url("v1.0").unwrap().as_str(),
            "http://localhost/diaspora/-/tree/v1.0"
        );
        assert_eq!(Repository::default().ref_url("master"), None);
    }

    #[test]
    fn username_prefers_handle() {
        let mut event = push(r#"{"after": "a", "ref": "refs/heads/master", "commits": []}"#);
        assert_eq!(event.username(), "someone");

        event.user_name = Some("John Smith".to_owned());
        assert_eq!(event.username(), "John Smith");

        event.user_username = Some("jsmith".to_owned());
        assert_eq!(event.username(), "jsmith");
    }
}
