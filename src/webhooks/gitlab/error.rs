use thiserror::Error;

use crate::webhooks::gitlab::ObjectKind;

/// Everything that can go wrong while turning one delivery into a [`Delivery`].
///
/// [`Delivery`]: crate::webhooks::gitlab::Delivery
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    UnknownKind(#[from] UnknownKindError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// The delivery isn't a JSON object at all.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("payload isn't valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),
    #[error("payload is a JSON {found}, expected an object")]
    NotAnObject { found: &'static str },
}

/// The delivery names an `object_kind` we don't know how to decode.
///
/// The raw payload is kept around so callers can log or quarantine the delivery.
#[derive(Debug, Error)]
#[error("unknown object_kind `{value}`")]
pub struct UnknownKindError {
    pub value: String,
    pub payload: String,
}

/// The kind is known, but the payload doesn't have the shape that kind requires.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{kind} payload is missing required field `{field}`")]
    MissingField { kind: ObjectKind, field: String },

    #[error("{kind} payload has an invalid `{field}`: {reason}")]
    InvalidField {
        kind: ObjectKind,
        field: String,
        reason: String,
    },

    #[error("{kind} payload has a malformed `{field}`: {source}")]
    Malformed {
        kind: ObjectKind,
        field: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ValidationError {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::MissingField { kind, .. }
            | Self::InvalidField { kind, .. }
            | Self::Malformed { kind, .. } => *kind,
        }
    }
}

/// Returned by the derived accessors when the question doesn't apply to a delivery.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("ref `{0}` isn't a branch")]
    NotABranch(String),
    #[error("ref `{0}` isn't a tag")]
    NotATag(String),
    #[error("{0} events don't carry a ref or commits")]
    NotPushFamily(ObjectKind),
    #[error("push doesn't carry any commit")]
    Empty,
}

impl AccessError {
    /// Whether the accessor didn't apply to this kind of delivery, as opposed to an empty push.
    pub fn is_inapplicable(&self) -> bool {
        !matches!(self, Self::Empty)
    }
}
