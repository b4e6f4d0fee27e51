//! Error types for the marshalling engine.

use std::fmt;
use thiserror::Error;

/// Fixed note appended when the id field of a row cannot be decoded.
pub const ID_CONVERSION_NOTE: &str = "The id of a table row can be either an integer or a \
string. If the service table was migrated to string ids, change the type of the id member \
to a string to match the ids returned by the service.";

/// Type-shape errors found while resolving a contract.
///
/// These are deterministic: once a type fails to resolve, every later use
/// of that type fails with the same value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// The type declares no id member, or the id member holds no value yet.
    #[error("no id {missing} found on type `{type_name}`")]
    NoIdMember { type_name: String, missing: MissingId },

    #[error(
        "only one member may have the property name `{id_name}` (regardless of casing) on type `{type_name}`"
    )]
    DuplicateId {
        type_name: String,
        id_name: String,
    },

    #[error(
        "type `{type_name}` has more than one member with the wire name `{wire_name}` (regardless of casing): `{first}` and `{second}`"
    )]
    DuplicateWireName {
        type_name: String,
        wire_name: String,
        first: String,
        second: String,
    },

    #[error("type `{type_name}` binds the `{role}` system property to both `{first}` and `{second}`")]
    DuplicateSystemMember {
        type_name: String,
        role: &'static str,
        first: String,
        second: String,
    },

    #[error(
        "type `{derived}` and its base type `{base}` must both opt in to data contract serialization, or neither may"
    )]
    InconsistentHierarchy { derived: String, base: String },

    #[error("the descriptor cached for type `{type_name}` belongs to another type")]
    CachedTypeMismatch { type_name: String },
}

/// What is missing when a table row has no usable id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingId {
    /// No member of the type resolves to the id.
    Member,
    /// The id member still holds its default value.
    Value,
}

impl fmt::Display for MissingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingId::Member => write!(f, "member"),
            MissingId::Value => write!(f, "value"),
        }
    }
}

/// All possible errors from the engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error("the value {value} for member '{member}' is outside the valid range for numeric columns")]
    ValueRange { value: String, member: String },

    #[error("error converting value {value} to type '{target}'. Path '{path}'")]
    TypeConversion {
        value: String,
        target: String,
        path: String,
    },

    #[error("the value {value} at path '{path}' is not a recognized date/time")]
    InvalidDateTime { value: String, path: String },

    #[error("error converting value {value} to type '{target}'. Path '{path}'. {}", ID_CONVERSION_NOTE)]
    IdConversion {
        value: String,
        target: String,
        path: String,
    },

    #[error("invalid id {value}: {reason}")]
    InvalidId { value: String, reason: String },

    #[error("the local time {value} at path '{path}' does not exist in the configured time zone")]
    NonexistentLocalTime { value: String, path: String },

    #[error("invalid JSON: {0}")]
    Json(String),
}

impl Error {
    /// Rewrites a conversion failure raised while decoding the id member.
    pub(crate) fn into_id_error(self) -> Self {
        match self {
            Error::TypeConversion {
                value,
                target,
                path,
            } => Error::IdConversion {
                value,
                target,
                path,
            },
            other => other,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err.to_string())
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
