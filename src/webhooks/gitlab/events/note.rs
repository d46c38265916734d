use serde::Deserialize;

use crate::webhooks::gitlab::events::{
    Commit, IssueAttributes, MergeRequestAttributes, Payload, Project, User,
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NoteEvent {
    pub user: Option<User>,
    pub project: Option<Project>,
    pub object_attributes: NoteAttributes,
    // only the one matching `noteable_type` is sent
    pub commit: Option<Commit>,
    pub issue: Option<IssueAttributes>,
    pub merge_request: Option<MergeRequestAttributes>,
    pub snippet: Option<Snippet>,
}

impl Payload for NoteEvent {
    const REQUIRED: &'static [&'static str] = &["/object_attributes"];
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NoteAttributes {
    pub id: Option<u64>,
    #[serde(default)]
    pub note: String,
    pub noteable_type: Option<String>,
    pub noteable_id: Option<u64>,
    pub author_id: Option<u64>,
    pub project_id: Option<u64>,
    pub commit_id: Option<String>,
    pub line_code: Option<String>,
    pub url: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Snippet {
    pub id: Option<u64>,
    #[serde(default)]
    pub title: String,
    pub file_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use crate::webhooks::gitlab::{
        error::{DecodeError, ValidationError},
        Delivery, GitLabEvent,
    };

    #[test]
    fn decodes_note_on_merge_request() {
        let delivery = Delivery::decode(
            br#"{
                "object_kind": "note",
                "event_type": "note",
                "user": {"name": "Administrator", "username": "root"},
                "object_attributes": {
                    "id": 1244,
                    "note": "This MR needs work.",
                    "noteable_type": "MergeRequest",
                    "url": "http://example.com/gitlab-org/gitlab-test/merge_requests/1#note_1244"
                },
                "merge_request": {
                    "id": 7,
                    "iid": 1,
                    "target_branch": "markdown",
                    "source_branch": "master",
                    "source_project_id": 5,
                    "target_project_id": 5,
                    "title": "Tempora et eos debitis quae laborum et."
                }
            }"#,
        )
        .unwrap();

        let note = match delivery.event {
            GitLabEvent::Note(note) => note,
            other => panic!("expected a note, got {:?}", other),
        };
        assert_eq!(note.object_attributes.note, "This MR needs work.");
        assert_eq!(
            note.object_attributes.noteable_type.as_deref(),
            Some("MergeRequest")
        );
        assert_eq!(note.merge_request.unwrap().target_branch, "markdown");
        assert!(note.issue.is_none());
    }

    #[test]
    fn attributes_are_required() {
        let err = Delivery::decode(br#"{"object_kind": "note", "object_attributes": null}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Validation(ValidationError::MissingField { .. })
        ));

        let err = Delivery::decode(br#"{"object_kind": "note", "object_attributes": 3}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Validation(ValidationError::Malformed { .. })
        ));
    }
}
