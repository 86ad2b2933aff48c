use std::fmt;

use serde::{Deserialize, Serialize};

/// Information about a single validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidationError {
    /// Human-readable message shown next to the field.
    pub message: String,
    /// Machine-readable error code (e.g. `required`).
    pub code: Option<String>,
    /// Field the error belongs to, filled in by the validator.
    pub field_id: Option<String>,
}

impl ValidationError {
    /// Creates an error with a message only.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            field_id: None,
        }
    }

    /// Creates an error with a message and an error code.
    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: Some(code.into()),
            field_id: None,
        }
    }

    /// Attach the owning field id.
    pub fn for_field(mut self, field_id: impl Into<String>) -> Self {
        self.field_id = Some(field_id.into());
        self
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.field_id, &self.code) {
            (Some(field), Some(code)) => write!(f, "{}: {} ({})", field, self.message, code),
            (Some(field), None) => write!(f, "{}: {}", field, self.message),
            (None, Some(code)) => write!(f, "{} ({})", self.message, code),
            (None, None) => f.write_str(&self.message),
        }
    }
}

/// Outcome of validating one value.
///
/// A result is valid exactly when it carries no errors. The error list is
/// private so the two can never disagree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// A passing result.
    pub fn valid() -> Self {
        Self::default()
    }

    /// A failing result with a single error.
    pub fn invalid(error: ValidationError) -> Self {
        Self {
            errors: vec![error],
        }
    }

    /// Build a result from collected errors (valid if empty).
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }

    /// Check if validation passed.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Check if validation failed.
    pub fn is_invalid(&self) -> bool {
        !self.is_valid()
    }

    /// Get all validation errors.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Get the first validation error (if any).
    pub fn first_error(&self) -> Option<&ValidationError> {
        self.errors.first()
    }

    /// Check if any error carries the given code.
    pub fn has_code(&self, code: &str) -> bool {
        self.errors.iter().any(|e| e.code() == Some(code))
    }

    /// Append another result's errors, preserving order.
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
    }

    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}
