//! Field payload values.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of every stored field value, keyed by field id.
pub type FormValues = HashMap<String, FieldValue>;

/// Display format used by [`FieldValue::string_value`] for dates.
const DATE_FORMAT: &str = "%b %-d, %Y";

/// The runtime payload of a single field.
///
/// `Empty` is the only representation of "no input yet". It is distinct from
/// `Text("")`, although the required rule treats both as absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    Selection(String),
    MultiSelection(BTreeSet<String>),
    #[default]
    Empty,
}

impl FieldValue {
    /// Create a text value
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Create a single selection value
    pub fn selection(value: impl Into<String>) -> Self {
        Self::Selection(value.into())
    }

    /// Create a multi-selection value from any iterator of options
    pub fn multi<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MultiSelection(values.into_iter().map(Into::into).collect())
    }

    /// Check if this is the `Empty` variant
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Check if the value counts as "not provided" for required fields.
    ///
    /// `Number(0)`, `Boolean(false)` and every date count as provided.
    pub fn is_absent(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) | Self::Selection(s) => s.is_empty(),
            Self::MultiSelection(set) => set.is_empty(),
            Self::Number(_) | Self::Boolean(_) | Self::Date(_) => false,
        }
    }

    /// Name of the active variant, used in log output.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Number(_) => "number",
            Self::Boolean(_) => "boolean",
            Self::Date(_) => "date",
            Self::Selection(_) => "selection",
            Self::MultiSelection(_) => "multiSelection",
            Self::Empty => "empty",
        }
    }

    /// Lossy string projection for display and logging.
    ///
    /// Validation never goes through this projection.
    pub fn string_value(&self) -> String {
        match self {
            Self::Text(s) | Self::Selection(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::Date(d) => d.format(DATE_FORMAT).to_string(),
            Self::MultiSelection(set) => set.iter().map(String::as_str).collect::<Vec<_>>().join(","),
            Self::Empty => String::new(),
        }
    }

    /// Lossy boolean projection. Presence of any non-text value is truthy.
    pub fn bool_value(&self) -> bool {
        match self {
            Self::Boolean(b) => *b,
            Self::Text(s) => !s.is_empty(),
            Self::Empty => false,
            Self::Number(_) | Self::Date(_) | Self::Selection(_) | Self::MultiSelection(_) => true,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Lossless, hashable identity of this value for memoization.
    pub(crate) fn cache_key(&self) -> ValueKey {
        match self {
            Self::Text(s) => ValueKey::Text(s.clone()),
            Self::Number(n) => ValueKey::Number(n.to_bits()),
            Self::Boolean(b) => ValueKey::Boolean(*b),
            Self::Date(d) => ValueKey::Date(d.timestamp(), d.timestamp_subsec_nanos()),
            Self::Selection(s) => ValueKey::Selection(s.clone()),
            Self::MultiSelection(set) => ValueKey::MultiSelection(set.iter().cloned().collect()),
            Self::Empty => ValueKey::Empty,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.string_value())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}

/// Hashable mirror of [`FieldValue`]. Numbers are keyed by their bit pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ValueKey {
    Text(String),
    Number(u64),
    Boolean(bool),
    Date(i64, u32),
    Selection(String),
    MultiSelection(Vec<String>),
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_string_projection() {
        assert_eq!(FieldValue::text("hi").string_value(), "hi");
        assert_eq!(FieldValue::Number(2.5).string_value(), "2.5");
        assert_eq!(FieldValue::Boolean(false).string_value(), "false");
        assert_eq!(FieldValue::selection("red").string_value(), "red");
        assert_eq!(FieldValue::multi(["b", "a"]).string_value(), "a,b");
        assert_eq!(FieldValue::Empty.string_value(), "");

        let date = Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap();
        assert_eq!(FieldValue::Date(date).string_value(), "Mar 4, 2024");
    }

    #[test]
    fn test_bool_projection() {
        assert!(FieldValue::Boolean(true).bool_value());
        assert!(!FieldValue::Boolean(false).bool_value());
        assert!(FieldValue::text("x").bool_value());
        assert!(!FieldValue::text("").bool_value());
        assert!(!FieldValue::Empty.bool_value());
        assert!(FieldValue::Number(0.0).bool_value());
        assert!(FieldValue::multi(Vec::<String>::new()).bool_value());
    }

    #[test]
    fn test_absent_values() {
        assert!(FieldValue::Empty.is_absent());
        assert!(FieldValue::text("").is_absent());
        assert!(FieldValue::selection("").is_absent());
        assert!(FieldValue::multi(Vec::<String>::new()).is_absent());
        assert!(!FieldValue::Number(0.0).is_absent());
        assert!(!FieldValue::Boolean(false).is_absent());
    }

    #[test]
    fn test_cache_key_distinguishes_variants_with_same_projection() {
        let text = FieldValue::text("true");
        let boolean = FieldValue::Boolean(true);
        assert_eq!(text.string_value(), boolean.string_value());
        assert_ne!(text.cache_key(), boolean.cache_key());
    }
}
