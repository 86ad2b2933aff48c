use chrono::{DateTime, Utc};

use crate::validation::rule::{NumberRange, codes};
use crate::validation::{ValidationError, ValidationResult};
use crate::value::FieldValue;

/// Kind-specific configuration of a field.
///
/// The kind decides which input the rendering layer draws and carries the
/// constraints the validator checks in addition to the field's own rules.
/// `Empty` never violates a kind constraint; use `required()` for that.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Free text input
    Text {
        placeholder: String,
        /// Mask the input (passwords)
        secure: bool,
        multiline: bool,
    },
    /// Numeric input with optional inclusive bounds
    Number { min: Option<f64>, max: Option<f64> },
    /// Boolean switch
    Toggle,
    /// Date picker with optional inclusive bounds
    Date {
        min: Option<DateTime<Utc>>,
        max: Option<DateTime<Utc>>,
    },
    /// Single choice among options
    Picker { options: Vec<String> },
    /// Multiple choices among options
    MultiPicker {
        options: Vec<String>,
        max_selections: Option<usize>,
    },
}

impl Default for FieldKind {
    fn default() -> Self {
        Self::Text {
            placeholder: String::new(),
            secure: false,
            multiline: false,
        }
    }
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Number { .. } => "number",
            Self::Toggle => "toggle",
            Self::Date { .. } => "date",
            Self::Picker { .. } => "picker",
            Self::MultiPicker { .. } => "multiPicker",
        }
    }

    /// Allowed options for pickers (empty for other kinds).
    pub fn options(&self) -> &[String] {
        match self {
            Self::Picker { options } | Self::MultiPicker { options, .. } => options,
            _ => &[],
        }
    }

    /// Check the kind constraints against a value.
    ///
    /// Values of a variant the kind does not constrain pass.
    pub fn check(&self, value: &FieldValue) -> ValidationResult {
        match (self, value) {
            (Self::Number { min, max }, FieldValue::Number(n)) => {
                NumberRange::new(*min, *max).check(*n)
            }
            (Self::Date { min, max }, FieldValue::Date(d)) => {
                let too_early = min.is_some_and(|min| *d < min);
                let too_late = max.is_some_and(|max| *d > max);
                if too_early || too_late {
                    ValidationResult::invalid(ValidationError::with_code(
                        codes::DATE_OUT_OF_RANGE,
                        "Date is outside the allowed range",
                    ))
                } else {
                    ValidationResult::valid()
                }
            }
            (Self::Picker { options }, FieldValue::Selection(s)) => {
                if s.is_empty() || is_allowed(options, s) {
                    ValidationResult::valid()
                } else {
                    invalid_option(s)
                }
            }
            (
                Self::MultiPicker {
                    options,
                    max_selections,
                },
                FieldValue::MultiSelection(set),
            ) => {
                let mut errors = Vec::new();
                if let Some(bad) = set.iter().find(|s| !is_allowed(options, s)) {
                    errors.extend(invalid_option(bad).into_errors());
                }
                if let Some(max) = max_selections.filter(|max| set.len() > *max) {
                    errors.push(ValidationError::with_code(
                        codes::TOO_MANY_SELECTIONS,
                        format!("Select at most {} options", max),
                    ));
                }
                ValidationResult::from_errors(errors)
            }
            _ => ValidationResult::valid(),
        }
    }
}

/// An empty option list places no restriction on the selection.
fn is_allowed(options: &[String], value: &str) -> bool {
    options.is_empty() || options.iter().any(|o| o == value)
}

fn invalid_option(value: &str) -> ValidationResult {
    ValidationResult::invalid(ValidationError::with_code(
        codes::INVALID_OPTION,
        format!("'{}' is not an available option", value),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_picker_rejects_unknown_option() {
        let kind = FieldKind::Picker {
            options: vec!["red".into(), "green".into()],
        };
        assert!(kind.check(&FieldValue::selection("red")).is_valid());
        assert!(kind.check(&FieldValue::selection("blue")).has_code(codes::INVALID_OPTION));
        assert!(kind.check(&FieldValue::selection("")).is_valid());
        assert!(kind.check(&FieldValue::Empty).is_valid());
    }

    #[test]
    fn test_multi_picker_limits() {
        let kind = FieldKind::MultiPicker {
            options: vec!["a".into(), "b".into(), "c".into()],
            max_selections: Some(2),
        };
        assert!(kind.check(&FieldValue::multi(["a", "b"])).is_valid());

        let result = kind.check(&FieldValue::multi(["a", "b", "z"]));
        assert!(result.has_code(codes::INVALID_OPTION));
        assert!(result.has_code(codes::TOO_MANY_SELECTIONS));
    }

    #[test]
    fn test_date_bounds() {
        let min = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let max = Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap();
        let kind = FieldKind::Date {
            min: Some(min),
            max: Some(max),
        };
        let inside = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let outside = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        assert!(kind.check(&FieldValue::Date(inside)).is_valid());
        assert!(kind.check(&FieldValue::Date(outside)).has_code(codes::DATE_OUT_OF_RANGE));
    }

    #[test]
    fn test_number_bounds_ignore_other_variants() {
        let kind = FieldKind::Number {
            min: Some(0.0),
            max: None,
        };
        assert!(kind.check(&FieldValue::Number(-1.0)).has_code(codes::OUT_OF_RANGE));
        assert!(kind.check(&FieldValue::text("-1")).is_valid());
    }
}
