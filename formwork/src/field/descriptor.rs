use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::FieldKind;
use crate::validation::{SharedRule, ValidationRule};
use crate::value::FieldValue;

/// Immutable description of one input.
///
/// Every configuration method consumes the descriptor and returns a new one
/// with a fresh revision, so a descriptor that has been shared with a
/// renderer or cached by the validator is never changed underneath it.
///
/// # Example
///
/// ```ignore
/// let email = FieldDescriptor::text("email")
///     .label("Email")
///     .placeholder("you@example.com")
///     .required()
///     .rule(Email::new());
/// ```
#[derive(Clone)]
pub struct FieldDescriptor {
    id: String,
    label: String,
    required: bool,
    rules: Vec<SharedRule>,
    kind: FieldKind,
    default_value: Option<FieldValue>,
    revision: Uuid,
}

impl FieldDescriptor {
    /// Create a descriptor of the given kind
    pub fn new(id: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            label: String::new(),
            required: false,
            rules: Vec::new(),
            kind,
            default_value: None,
            revision: Uuid::new_v4(),
        }
    }

    /// Create a text field
    pub fn text(id: impl Into<String>) -> Self {
        Self::new(id, FieldKind::default())
    }

    /// Create a numeric field
    pub fn number(id: impl Into<String>) -> Self {
        Self::new(id, FieldKind::Number { min: None, max: None })
    }

    /// Create a toggle (boolean) field
    pub fn toggle(id: impl Into<String>) -> Self {
        Self::new(id, FieldKind::Toggle)
    }

    /// Create a date field
    pub fn date(id: impl Into<String>) -> Self {
        Self::new(id, FieldKind::Date { min: None, max: None })
    }

    /// Create a single-choice picker
    pub fn picker<I, S>(id: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            id,
            FieldKind::Picker {
                options: options.into_iter().map(Into::into).collect(),
            },
        )
    }

    /// Create a multiple-choice picker
    pub fn multi_picker<I, S>(id: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            id,
            FieldKind::MultiPicker {
                options: options.into_iter().map(Into::into).collect(),
                max_selections: None,
            },
        )
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label_text(&self) -> &str {
        &self.label
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn rules(&self) -> &[SharedRule] {
        &self.rules
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Value seeded into the store on mount, if any.
    pub fn initial_value(&self) -> Option<&FieldValue> {
        self.default_value.as_ref()
    }

    /// Identity of this exact configuration. Changes on every builder call.
    pub fn revision(&self) -> Uuid {
        self.revision
    }

    // -------------------------------------------------------------------------
    // Builder methods
    // -------------------------------------------------------------------------

    fn configure(mut self, f: impl FnOnce(&mut Self)) -> Self {
        f(&mut self);
        self.revision = Uuid::new_v4();
        self
    }

    /// Set the label shown next to the input.
    pub fn label(self, label: impl Into<String>) -> Self {
        let label = label.into();
        self.configure(|d| d.label = label)
    }

    /// Mark the field as required.
    pub fn required(self) -> Self {
        self.configure(|d| d.required = true)
    }

    /// Mark the field as optional (the default).
    pub fn optional(self) -> Self {
        self.configure(|d| d.required = false)
    }

    /// Append a validation rule. Rules run in the order they were added.
    pub fn rule(self, rule: impl ValidationRule + 'static) -> Self {
        self.shared_rule(Arc::new(rule))
    }

    /// Append an already shared rule.
    pub fn shared_rule(self, rule: SharedRule) -> Self {
        self.configure(|d| d.rules.push(rule))
    }

    /// Value the store is seeded with when the form mounts.
    pub fn default_value(self, value: impl Into<FieldValue>) -> Self {
        let value = value.into();
        self.configure(|d| d.default_value = Some(value))
    }

    /// Set the placeholder. Only affects text fields.
    pub fn placeholder(self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.configure(|d| {
            if let FieldKind::Text { placeholder, .. } = &mut d.kind {
                *placeholder = text;
            }
        })
    }

    /// Mask input. Only affects text fields.
    pub fn secure(self) -> Self {
        self.configure(|d| {
            if let FieldKind::Text { secure, .. } = &mut d.kind {
                *secure = true;
            }
        })
    }

    /// Allow multiple lines. Only affects text fields.
    pub fn multiline(self) -> Self {
        self.configure(|d| {
            if let FieldKind::Text { multiline, .. } = &mut d.kind {
                *multiline = true;
            }
        })
    }

    /// Set inclusive numeric bounds. Only affects number fields.
    pub fn range(self, min: Option<f64>, max: Option<f64>) -> Self {
        self.configure(|d| {
            if let FieldKind::Number { min: lo, max: hi } = &mut d.kind {
                *lo = min;
                *hi = max;
            }
        })
    }

    /// Set inclusive date bounds. Only affects date fields.
    pub fn date_range(self, min: Option<DateTime<Utc>>, max: Option<DateTime<Utc>>) -> Self {
        self.configure(|d| {
            if let FieldKind::Date { min: lo, max: hi } = &mut d.kind {
                *lo = min;
                *hi = max;
            }
        })
    }

    /// Cap the number of selections. Only affects multi pickers.
    pub fn max_selections(self, max: usize) -> Self {
        self.configure(|d| {
            if let FieldKind::MultiPicker { max_selections, .. } = &mut d.kind {
                *max_selections = Some(max);
            }
        })
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rules: Vec<&str> = self.rules.iter().map(|r| r.name()).collect();
        f.debug_struct("FieldDescriptor")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("required", &self.required)
            .field("rules", &rules)
            .field("kind", &self.kind)
            .field("default_value", &self.default_value)
            .finish()
    }
}
