use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use tracing::debug;

use crate::webhooks::gitlab::{
    error::{AccessError, DecodeError, ValidationError},
    kind::{Envelope, ObjectKind},
};

mod issue;
mod merge_request;
mod note;
mod pipeline;
mod push;
mod wiki_page;

pub use issue::*;
pub use merge_request::*;
pub use note::*;
pub use pipeline::*;
pub use push::*;
pub use wiki_page::*;

/// One decoded GitLab delivery.
///
/// The variant in [`Delivery::event`] is the only source for the delivery's kind, so the two
/// can't disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    /// Secondary discriminator some payloads carry next to `object_kind`.
    pub event_name: Option<String>,
    pub event: GitLabEvent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GitLabEvent {
    Push(PushEvent),
    TagPush(PushEvent),
    Issue(IssueEvent),
    MergeRequest(MergeRequestEvent),
    Note(NoteEvent),
    Pipeline(PipelineEvent),
    Build(BuildEvent),
    WikiPage(WikiPageEvent),
}

impl GitLabEvent {
    pub fn object_kind(&self) -> ObjectKind {
        match self {
            Self::Push(_) => ObjectKind::Push,
            Self::TagPush(_) => ObjectKind::TagPush,
            Self::Issue(_) => ObjectKind::Issue,
            Self::MergeRequest(_) => ObjectKind::MergeRequest,
            Self::Note(_) => ObjectKind::Note,
            Self::Pipeline(_) => ObjectKind::Pipeline,
            Self::Build(_) => ObjectKind::Build,
            Self::WikiPage(_) => ObjectKind::WikiPage,
        }
    }

    /// The push-family payload, if this is a push or a tag push.
    pub fn push(&self) -> Option<&PushEvent> {
        match self {
            Self::Push(event) | Self::TagPush(event) => Some(event),
            _ => None,
        }
    }

    pub fn project(&self) -> Option<&Project> {
        match self {
            Self::Push(event) | Self::TagPush(event) => event.project.as_ref(),
            Self::Issue(event) => event.project.as_ref(),
            Self::MergeRequest(event) => event.project.as_ref(),
            Self::Note(event) => event.project.as_ref(),
            Self::Pipeline(event) => event.project.as_ref(),
            Self::Build(event) => event.project.as_ref(),
            Self::WikiPage(event) => event.project.as_ref(),
        }
    }
}

impl Delivery {
    /// Decodes one raw delivery.
    ///
    /// The discriminator is read first, then the whole payload is decoded again into the shape
    /// that kind uses. Unknown fields are ignored everywhere.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let Envelope {
            kind,
            event_name,
            body,
        } = Envelope::open(payload)?;

        let event = match kind {
            ObjectKind::Push => GitLabEvent::Push(decode_as(kind, body)?),
            ObjectKind::TagPush => GitLabEvent::TagPush(decode_as(kind, body)?),
            ObjectKind::Issue => GitLabEvent::Issue(decode_as(kind, body)?),
            ObjectKind::MergeRequest => GitLabEvent::MergeRequest(decode_as(kind, body)?),
            ObjectKind::Note => GitLabEvent::Note(decode_as(kind, body)?),
            ObjectKind::Pipeline => GitLabEvent::Pipeline(decode_as(kind, body)?),
            ObjectKind::Build => GitLabEvent::Build(decode_as(kind, body)?),
            ObjectKind::WikiPage => GitLabEvent::WikiPage(decode_as(kind, body)?),
        };
        debug!("decoded {} delivery", kind);

        Ok(Self { event_name, event })
    }

    pub fn object_kind(&self) -> ObjectKind {
        self.event.object_kind()
    }

    pub fn push(&self) -> Option<&PushEvent> {
        self.event.push()
    }

    /// Branch targeted by a push, see [`PushEvent::branch`].
    pub fn branch(&self) -> Result<&str, AccessError> {
        self.push_family()?.branch()
    }

    /// Most recent commit of a push, see [`PushEvent::head`].
    pub fn head(&self) -> Result<&Commit, AccessError> {
        self.push_family()?.head()
    }

    fn push_family(&self) -> Result<&PushEvent, AccessError> {
        self.push()
            .ok_or_else(|| AccessError::NotPushFamily(self.object_kind()))
    }
}

/// A payload shape, as decoded from the body of a delivery.
pub(crate) trait Payload: DeserializeOwned {
    /// JSON pointers to the fields a delivery of this shape can't do without.
    const REQUIRED: &'static [&'static str];

    /// Checks that serde can't express, run once the payload is decoded.
    fn validate(&self, _kind: ObjectKind) -> Result<(), ValidationError> {
        Ok(())
    }
}

fn decode_as<T: Payload>(kind: ObjectKind, body: Value) -> Result<T, ValidationError> {
    // a `null` is as good as a missing field
    let missing = T::REQUIRED
        .iter()
        .find(|pointer| body.pointer(pointer).map_or(true, Value::is_null));
    if let Some(pointer) = missing {
        return Err(ValidationError::MissingField {
            kind,
            field: pointer.trim_start_matches('/').replace('/', "."),
        });
    }

    let payload: T = serde_path_to_error::deserialize(body).map_err(|e| {
        ValidationError::Malformed {
            kind,
            field: e.path().to_string(),
            source: e.into_inner(),
        }
    })?;
    payload.validate(kind)?;

    Ok(payload)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    pub id: Option<u64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

impl User {
    /// Username when GitLab sent one, display name otherwise.
    pub fn handle(&self) -> &str {
        if self.username.is_empty() {
            &self.name
        } else {
            &self.username
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Project {
    pub id: Option<u64>,
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub web_url: Option<String>,
    pub homepage: Option<String>,
    pub namespace: Option<String>,
    pub path_with_namespace: Option<String>,
    pub default_branch: Option<String>,
}
