use std::fmt::Display;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::trace;

use crate::webhooks::gitlab::error::{DecodeError, ParseError, UnknownKindError, ValidationError};

const OBJECT_KIND: &str = "object_kind";
const EVENT_NAME: &str = "event_name";

/// Kind assumed for deliveries that don't carry an `object_kind` at all.
///
/// Old GitLab push hooks were sent without the field. This isn't part of the documented payload
/// contract, it only keeps those deliveries decodable.
pub const LEGACY_DEFAULT_KIND: ObjectKind = ObjectKind::Push;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Push,
    TagPush,
    Issue,
    MergeRequest,
    Note,
    Pipeline,
    Build,
    WikiPage,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 8] = [
        Self::Push,
        Self::TagPush,
        Self::Issue,
        Self::MergeRequest,
        Self::Note,
        Self::Pipeline,
        Self::Build,
        Self::WikiPage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::TagPush => "tag_push",
            Self::Issue => "issue",
            Self::MergeRequest => "merge_request",
            Self::Note => "note",
            Self::Pipeline => "pipeline",
            Self::Build => "build",
            Self::WikiPage => "wiki_page",
        }
    }

    pub fn is_push_family(self) -> bool {
        matches!(self, Self::Push | Self::TagPush)
    }
}

impl Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First decoding pass: just enough of a delivery to know which shape the rest has.
#[derive(Debug)]
pub(crate) struct Envelope {
    pub(crate) kind: ObjectKind,
    pub(crate) event_name: Option<String>,
    /// The whole delivery, left for the kind-specific decoder.
    pub(crate) body: Value,
}

impl Envelope {
    pub(crate) fn open(payload: &[u8]) -> Result<Self, DecodeError> {
        let body: Value = serde_json::from_slice(payload).map_err(ParseError::Syntax)?;
        let fields = match &body {
            Value::Object(fields) => fields,
            other => {
                return Err(ParseError::NotAnObject {
                    found: json_type(other),
                }
                .into())
            }
        };

        let kind = sniff(fields).map_err(|value| UnknownKindError {
            value,
            payload: String::from_utf8_lossy(payload).into_owned(),
        })?;
        trace!("sniffed object_kind {}", kind);

        let event_name = match fields.get(EVENT_NAME) {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) => Some(name.clone()),
            Some(other) => {
                return Err(ValidationError::InvalidField {
                    kind,
                    field: EVENT_NAME.to_owned(),
                    reason: format!("expected a string, found a JSON {}", json_type(other)),
                }
                .into())
            }
        };

        Ok(Self {
            kind,
            event_name,
            body,
        })
    }
}

/// Reads the discriminator, returning the raw value when it isn't a kind we know.
fn sniff(fields: &Map<String, Value>) -> Result<ObjectKind, String> {
    match fields.get(OBJECT_KIND) {
        None => Ok(LEGACY_DEFAULT_KIND),
        // only strings, serde would also accept `{"push": null}` as a unit variant
        Some(Value::String(raw)) => {
            serde_json::from_value(Value::String(raw.clone())).map_err(|_| raw.clone())
        }
        Some(other) => Err(other.to_string()),
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
