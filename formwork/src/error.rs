//! Error types for form construction.
//!
//! Validation failures are never reported here: they are data and live in
//! [`ValidationResult`](crate::validation::ValidationResult). `FormError` only
//! covers mistakes made while assembling a form definition.

use thiserror::Error;

/// Errors raised while building descriptors, rules or form trees.
#[derive(Debug, Error)]
pub enum FormError {
    /// Two fields in the same tree share an identifier.
    #[error("Duplicate field id '{id}' in form tree")]
    DuplicateFieldId { id: String },

    /// A field descriptor with an empty identifier was placed in a tree.
    #[error("Field id must not be empty")]
    EmptyFieldId,

    /// A pattern rule was built from an invalid regular expression.
    #[error("Invalid validation pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl FormError {
    /// Creates a new duplicate field id error.
    pub fn duplicate(id: impl Into<String>) -> Self {
        Self::DuplicateFieldId { id: id.into() }
    }
}
