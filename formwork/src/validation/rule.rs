//! Validation rules.
//!
//! A rule is a pure function from a [`FieldValue`] to a [`ValidationResult`].
//! Every rule is total over all variants: variants outside its concern are
//! either skipped (valid) or treated as a failure, as documented per rule.

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::result::{ValidationError, ValidationResult};
use crate::error::FormError;
use crate::value::FieldValue;

/// Shared handle to a rule, as stored in field descriptors.
pub type SharedRule = Arc<dyn ValidationRule>;

/// Error codes emitted by the built-in rules and kind constraints.
pub mod codes {
    pub const REQUIRED: &str = "required";
    pub const MIN_LENGTH: &str = "minLength";
    pub const MAX_LENGTH: &str = "maxLength";
    pub const INVALID_EMAIL: &str = "invalidEmail";
    pub const PATTERN: &str = "pattern";
    pub const OUT_OF_RANGE: &str = "outOfRange";
    pub const INVALID_OPTION: &str = "invalidOption";
    pub const DATE_OUT_OF_RANGE: &str = "dateOutOfRange";
    pub const TOO_MANY_SELECTIONS: &str = "tooManySelections";
}

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,64}$").expect("email regex is valid")
});

/// A synchronous, side-effect free validation rule.
pub trait ValidationRule: Send + Sync {
    /// Validate a value. Must be deterministic.
    fn validate(&self, value: &FieldValue) -> ValidationResult;

    /// Short rule name for debug output.
    fn name(&self) -> &'static str {
        "custom"
    }
}

impl<F> ValidationRule for F
where
    F: Fn(&FieldValue) -> ValidationResult + Send + Sync,
{
    fn validate(&self, value: &FieldValue) -> ValidationResult {
        self(value)
    }
}

fn fail(code: &str, message: String) -> ValidationResult {
    ValidationResult::invalid(ValidationError::with_code(code, message))
}

// =============================================================================
// Required
// =============================================================================

/// Fails for `Empty`, empty text, empty selection and empty multi-selection.
///
/// `Number(0)`, `Boolean(false)` and any date are considered provided.
#[derive(Debug, Clone, Default)]
pub struct Required {
    message: Option<String>,
}

impl Required {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

impl ValidationRule for Required {
    fn validate(&self, value: &FieldValue) -> ValidationResult {
        if value.is_absent() {
            let message = self
                .message
                .clone()
                .unwrap_or_else(|| "This field is required".to_string());
            fail(codes::REQUIRED, message)
        } else {
            ValidationResult::valid()
        }
    }

    fn name(&self) -> &'static str {
        "required"
    }
}

// =============================================================================
// Length
// =============================================================================

/// Requires text of at least `n` characters.
///
/// Any non-text value (including `Empty`) fails with the same error rather
/// than being skipped.
#[derive(Debug, Clone)]
pub struct MinLength {
    min: usize,
    message: Option<String>,
}

impl MinLength {
    pub fn new(min: usize) -> Self {
        Self { min, message: None }
    }

    pub fn with_message(min: usize, message: impl Into<String>) -> Self {
        Self {
            min,
            message: Some(message.into()),
        }
    }
}

impl ValidationRule for MinLength {
    fn validate(&self, value: &FieldValue) -> ValidationResult {
        match value {
            FieldValue::Text(s) if s.chars().count() >= self.min => ValidationResult::valid(),
            _ => {
                let message = self
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("Must be at least {} characters", self.min));
                fail(codes::MIN_LENGTH, message)
            }
        }
    }

    fn name(&self) -> &'static str {
        "minLength"
    }
}

/// Requires text of at most `n` characters. Non-text values fail.
#[derive(Debug, Clone)]
pub struct MaxLength {
    max: usize,
    message: Option<String>,
}

impl MaxLength {
    pub fn new(max: usize) -> Self {
        Self { max, message: None }
    }

    pub fn with_message(max: usize, message: impl Into<String>) -> Self {
        Self {
            max,
            message: Some(message.into()),
        }
    }
}

impl ValidationRule for MaxLength {
    fn validate(&self, value: &FieldValue) -> ValidationResult {
        match value {
            FieldValue::Text(s) if s.chars().count() <= self.max => ValidationResult::valid(),
            _ => {
                let message = self
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("Must be at most {} characters", self.max));
                fail(codes::MAX_LENGTH, message)
            }
        }
    }

    fn name(&self) -> &'static str {
        "maxLength"
    }
}

// =============================================================================
// Format
// =============================================================================

/// Requires a plausible email address. Non-text values fail.
#[derive(Debug, Clone, Default)]
pub struct Email {
    message: Option<String>,
}

impl Email {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

impl ValidationRule for Email {
    fn validate(&self, value: &FieldValue) -> ValidationResult {
        match value {
            FieldValue::Text(s) if EMAIL_RE.is_match(s) => ValidationResult::valid(),
            _ => {
                let message = self
                    .message
                    .clone()
                    .unwrap_or_else(|| "Please enter a valid email address".to_string());
                fail(codes::INVALID_EMAIL, message)
            }
        }
    }

    fn name(&self) -> &'static str {
        "email"
    }
}

/// Requires text matching a regular expression. Non-text values fail.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    message: String,
}

impl Pattern {
    /// Compile a pattern rule.
    pub fn new(pattern: &str, message: impl Into<String>) -> Result<Self, FormError> {
        let regex = Regex::new(pattern).map_err(|source| FormError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            regex,
            message: message.into(),
        })
    }
}

impl ValidationRule for Pattern {
    fn validate(&self, value: &FieldValue) -> ValidationResult {
        match value {
            FieldValue::Text(s) if self.regex.is_match(s) => ValidationResult::valid(),
            _ => fail(codes::PATTERN, self.message.clone()),
        }
    }

    fn name(&self) -> &'static str {
        "pattern"
    }
}

// =============================================================================
// Numeric
// =============================================================================

/// Bounds a number (inclusive). Values that are not numbers are skipped.
#[derive(Debug, Clone, Default)]
pub struct NumberRange {
    min: Option<f64>,
    max: Option<f64>,
}

impl NumberRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn between(min: f64, max: f64) -> Self {
        Self::new(Some(min), Some(max))
    }

    pub(crate) fn check(&self, n: f64) -> ValidationResult {
        match (self.min, self.max) {
            (Some(min), _) if n < min => {
                fail(codes::OUT_OF_RANGE, format!("Must be at least {}", min))
            }
            (_, Some(max)) if n > max => {
                fail(codes::OUT_OF_RANGE, format!("Must be at most {}", max))
            }
            _ => ValidationResult::valid(),
        }
    }
}

impl ValidationRule for NumberRange {
    fn validate(&self, value: &FieldValue) -> ValidationResult {
        match value {
            FieldValue::Number(n) => self.check(*n),
            _ => ValidationResult::valid(),
        }
    }

    fn name(&self) -> &'static str {
        "numberRange"
    }
}

// =============================================================================
// Custom
// =============================================================================

/// A predicate rule with its own code and message.
///
/// # Example
///
/// ```ignore
/// let accepted = Custom::new("mustAccept", "You must accept the terms", |v| {
///     v.as_bool() == Some(true)
/// });
/// ```
pub struct Custom {
    code: String,
    message: String,
    predicate: Box<dyn Fn(&FieldValue) -> bool + Send + Sync>,
}

impl Custom {
    pub fn new<F>(code: impl Into<String>, message: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&FieldValue) -> bool + Send + Sync + 'static,
    {
        Self {
            code: code.into(),
            message: message.into(),
            predicate: Box::new(predicate),
        }
    }
}

impl fmt::Debug for Custom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Custom").field("code", &self.code).finish_non_exhaustive()
    }
}

impl ValidationRule for Custom {
    fn validate(&self, value: &FieldValue) -> ValidationResult {
        if (self.predicate)(value) {
            ValidationResult::valid()
        } else {
            fail(&self.code, self.message.clone())
        }
    }
}
