//! Error types for the form engine
//!
//! Field validation failures are never errors: they are reported as data in
//! [`FormErrors`](crate::value::FormErrors). The types here cover broken
//! schemas, rejected structural edits and edits addressed to ids the schema
//! does not declare.

use thiserror::Error;

/// Problems found while loading or checking a form schema
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse schema: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate section id '{0}'")]
    DuplicateSection(String),

    #[error("duplicate field id '{field}' in section '{section}'")]
    DuplicateField { section: String, field: String },

    #[error("section '{section}': max_items ({max}) must be at least 1 and not below min_items ({min})")]
    InvalidItemBounds { section: String, min: usize, max: usize },

    #[error("select field '{field}' in section '{section}' has no options")]
    MissingOptions { section: String, field: String },
}

/// An add/remove/move on a repeatable section that the bounds do not allow
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("section '{section}' already has the maximum of {max} items")]
    MaxItemsReached { section: String, max: usize },

    #[error("section '{section}' needs at least {min} items")]
    MinItemsReached { section: String, min: usize },

    #[error("section '{section}' has no item at index {index} (len {len})")]
    IndexOutOfRange {
        section: String,
        index: usize,
        len: usize,
    },
}

/// Errors returned by form state transitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("unknown section '{0}'")]
    UnknownSection(String),

    #[error("unknown field '{field}' in section '{section}'")]
    UnknownField { section: String, field: String },

    #[error("section '{0}' is not repeatable")]
    NotRepeatable(String),

    #[error("section '{0}' is repeatable; address its items by index")]
    NotFlat(String),

    #[error(transparent)]
    Structural(#[from] StructuralError),
}
