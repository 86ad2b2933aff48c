//! Context handed down the render chain.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};

use crate::config::FormBehavior;
use crate::debounce::Debouncer;
use crate::field::FieldDescriptor;
use crate::state::FormState;
use crate::validation::{ValidationError, ValidationResult, Validator};
use crate::value::FieldValue;

#[derive(Debug)]
struct Shared {
    state: FormState,
    validator: Arc<Validator>,
    behavior: FormBehavior,
    mounted: AtomicBool,
}

impl Shared {
    fn commit(&self, field: &FieldDescriptor, value: FieldValue) {
        self.state.set_value(field.id(), value);
        if self.behavior.validate_on_change {
            self.validate(field);
        }
    }

    fn validate(&self, field: &FieldDescriptor) -> ValidationResult {
        let value = self.state.value(field.id());
        let result = self.validator.validate(field, &value);
        self.state
            .set_validation_result(field.id(), Some(result.clone()));
        result
    }
}

/// Everything a field renderer needs to read and write form state.
///
/// The context is passed explicitly to every renderer; nothing is looked up
/// through globals. Clones share the same store, validator and pending
/// debounced commits.
///
/// Renderers write through [`commit`](Self::commit) (or
/// [`commit_debounced`](Self::commit_debounced) for keystroke-level edits)
/// rather than calling [`FormState::set_value`] directly, so the configured
/// validate-on-change policy is applied in one place.
///
/// Debounced commits land when the owner drains them with
/// [`run_due`](Self::run_due) or [`run_next`](Self::run_next), so the store
/// is only written from the thread that renders it.
///
/// # Example
///
/// ```ignore
/// fn on_text_input(cx: &FormContext, field: &FieldDescriptor, text: &str) {
///     cx.commit_debounced(field, FieldValue::text(text));
/// }
///
/// fn on_blur(cx: &FormContext, field: &FieldDescriptor) {
///     cx.validate_field(field);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FormContext {
    shared: Arc<Shared>,
    debouncer: Debouncer,
}

impl FormContext {
    pub fn new(state: FormState, validator: Arc<Validator>, behavior: FormBehavior) -> Self {
        Self {
            shared: Arc::new(Shared {
                state,
                validator,
                behavior,
                mounted: AtomicBool::new(false),
            }),
            debouncer: Debouncer::new(),
        }
    }

    pub fn state(&self) -> &FormState {
        &self.shared.state
    }

    pub fn validator(&self) -> &Validator {
        &self.shared.validator
    }

    pub fn behavior(&self) -> &FormBehavior {
        &self.shared.behavior
    }

    /// Current value of a field (`Empty` if unset).
    pub fn value(&self, field_id: &str) -> FieldValue {
        self.shared.state.value(field_id)
    }

    /// Errors to display next to a field.
    pub fn errors(&self, field_id: &str) -> Vec<ValidationError> {
        self.shared.state.errors(field_id)
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Store a field's value now, validating it if `validate_on_change` is set.
    ///
    /// Cancels a debounced commit still pending for the field, so an older
    /// edit can never overwrite this one.
    pub fn commit(&self, field: &FieldDescriptor, value: FieldValue) {
        self.debouncer.cancel(field.id());
        self.shared.commit(field, value);
    }

    /// Store a field's value after the configured quiet period.
    ///
    /// Each call replaces the commit still pending for the same field.
    /// Without a tokio runtime the value is committed immediately. Returns
    /// whether the commit was deferred.
    pub fn commit_debounced(&self, field: &FieldDescriptor, value: FieldValue) -> bool {
        let shared = Arc::clone(&self.shared);
        let descriptor = field.clone();
        self.debouncer
            .schedule(field.id(), self.shared.behavior.debounce, move || {
                if !shared.mounted.load(Ordering::SeqCst) {
                    warn!(
                        "FormContext: dropping debounced commit for '{}', form is not mounted",
                        descriptor.id()
                    );
                    return;
                }
                shared.commit(&descriptor, value);
            })
    }

    /// Apply every debounced commit whose quiet period has elapsed. Returns
    /// how many were applied.
    pub fn run_due(&self) -> usize {
        self.debouncer.run_due()
    }

    /// Wait for the next debounced commit to come due and apply it, unless
    /// it was cancelled or replaced in the meantime.
    pub async fn run_next(&self) -> bool {
        self.debouncer.run_next().await
    }

    /// Whether a debounced commit is pending for the field.
    pub fn has_pending(&self, field_id: &str) -> bool {
        self.debouncer.is_pending(field_id)
    }

    /// Drop every pending debounced commit.
    pub fn cancel_pending(&self) {
        self.debouncer.cancel_all();
    }

    // -------------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------------

    /// Validate the field's stored value and record the result.
    pub fn validate_field(&self, field: &FieldDescriptor) -> ValidationResult {
        self.shared.validate(field)
    }

    /// Forget a field's validation result.
    pub fn clear_validation(&self, field_id: &str) {
        self.shared.state.set_validation_result(field_id, None);
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    pub fn is_mounted(&self) -> bool {
        self.shared.mounted.load(Ordering::SeqCst)
    }

    pub(crate) fn set_mounted(&self, mounted: bool) {
        let was = self.shared.mounted.swap(mounted, Ordering::SeqCst);
        if was != mounted {
            debug!("FormContext: mounted={}", mounted);
        }
        if !mounted {
            self.debouncer.cancel_all();
        }
    }
}
