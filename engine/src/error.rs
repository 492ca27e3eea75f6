//! Error types for the attrsync engine.

use crate::{CollectionName, FieldName, RecordId, RelationName, Version};
use thiserror::Error;

/// All possible errors from the attrsync engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Validation errors
    #[error("collection not found: {0}")]
    CollectionNotFound(CollectionName),

    #[error("record not found: {0}")]
    RecordNotFound(RecordId),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("missing required field: {0}")]
    MissingRequiredField(String),

    #[error("type mismatch for field '{field}': expected {expected}, got {got}")]
    TypeMismatch {
        field: String,
        expected: String,
        got: String,
    },

    // Save errors
    #[error("record already exists: {0}")]
    RecordAlreadyExists(RecordId),

    #[error("version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: Version, actual: Version },

    #[error("operation on deleted record: {0}")]
    OperationOnDeleted(RecordId),

    // Relation and rule configuration errors
    #[error("relation '{relation}' is not declared on collection '{collection}'")]
    RelationNotFound {
        collection: CollectionName,
        relation: RelationName,
    },

    #[error("sync rule for '{collection}.{field}' refers to unknown relation '{relation}'")]
    UnknownRelation {
        collection: CollectionName,
        relation: RelationName,
        field: FieldName,
    },

    #[error("invalid sync rule: {0}")]
    InvalidRule(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
