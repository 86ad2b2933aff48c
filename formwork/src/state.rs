use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard};

use log::debug;

use crate::events::{EventChannel, FieldValidated, Subscription};
use crate::validation::{ValidationError, ValidationResult};
use crate::value::{FieldValue, FormValues};

#[derive(Debug, Default)]
struct StoreInner {
    values: FormValues,
    results: HashMap<String, ValidationResult>,
}

impl StoreInner {
    fn is_valid(&self) -> bool {
        self.results.values().all(ValidationResult::is_valid)
    }
}

/// Authoritative store of field values and validation results.
///
/// `FormState` is a cheap-to-clone handle: every clone refers to the same
/// maps and the same notification channels. It is the only writer of those
/// maps; everything else reads through accessors or receives snapshots.
///
/// Writing a value never validates it. Validation is a separate step whose
/// result is written back with [`set_validation_result`](Self::set_validation_result).
///
/// Notifications are delivered synchronously after the internal lock is
/// released, in call order: a `set_value` followed by a
/// `set_validation_result` is always observed in that order, and each value
/// snapshot reflects the map as of its own call.
///
/// # Example
///
/// ```ignore
/// let state = FormState::new();
/// let _sub = state.on_value_changed(|values| println!("{} values", values.len()));
///
/// state.set_value("name", FieldValue::text("Ada"));
/// state.set_validation_result("name", Some(ValidationResult::valid()));
/// assert!(state.is_form_valid());
/// ```
#[derive(Debug, Clone)]
pub struct FormState {
    inner: Arc<RwLock<StoreInner>>,
    dirty: Arc<AtomicBool>,
    value_changed: EventChannel<FormValues>,
    validity_changed: EventChannel<bool>,
    field_validated: EventChannel<FieldValidated>,
}

impl FormState {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner::default())),
            dirty: Arc::new(AtomicBool::new(false)),
            value_changed: EventChannel::new(),
            validity_changed: EventChannel::new(),
            field_validated: EventChannel::new(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // -------------------------------------------------------------------------
    // Values
    // -------------------------------------------------------------------------

    /// Overwrite a field's value and broadcast the full value map.
    pub fn set_value(&self, field_id: impl Into<String>, value: FieldValue) {
        let field_id = field_id.into();
        let snapshot = match self.inner.write() {
            Ok(mut guard) => {
                debug!("FormState: set '{}' ({})", field_id, value.kind_name());
                guard.values.insert(field_id, value);
                guard.values.clone()
            }
            Err(_) => return,
        };
        self.dirty.store(true, Ordering::SeqCst);
        self.value_changed.emit(&snapshot);
    }

    /// Get a field's value, `Empty` if it was never set.
    pub fn value(&self, field_id: &str) -> FieldValue {
        self.read().values.get(field_id).cloned().unwrap_or_default()
    }

    /// Check if a value was ever stored for the field.
    pub fn has_value(&self, field_id: &str) -> bool {
        self.read().values.contains_key(field_id)
    }

    /// Snapshot of every stored value.
    pub fn values(&self) -> FormValues {
        self.read().values.clone()
    }

    // -------------------------------------------------------------------------
    // Validation results
    // -------------------------------------------------------------------------

    /// Store (or clear, with `None`) a field's validation result, then
    /// broadcast the field result and the recomputed overall validity.
    pub fn set_validation_result(&self, field_id: impl Into<String>, result: Option<ValidationResult>) {
        let field_id = field_id.into();
        let valid = match self.inner.write() {
            Ok(mut guard) => {
                match &result {
                    Some(result) => {
                        debug!(
                            "FormState: '{}' validated ({} errors)",
                            field_id,
                            result.errors().len()
                        );
                        guard.results.insert(field_id.clone(), result.clone());
                    }
                    None => {
                        debug!("FormState: cleared result for '{}'", field_id);
                        guard.results.remove(&field_id);
                    }
                }
                guard.is_valid()
            }
            Err(_) => return,
        };
        self.dirty.store(true, Ordering::SeqCst);
        self.field_validated.emit(&FieldValidated { field_id, result });
        self.validity_changed.emit(&valid);
    }

    /// Last stored result, `None` if the field was never validated.
    pub fn validation_result(&self, field_id: &str) -> Option<ValidationResult> {
        self.read().results.get(field_id).cloned()
    }

    /// Errors of the last stored result (empty if none).
    pub fn errors(&self, field_id: &str) -> Vec<ValidationError> {
        self.read()
            .results
            .get(field_id)
            .map(|r| r.errors().to_vec())
            .unwrap_or_default()
    }

    /// True iff every stored result is valid. Fields that were never
    /// validated do not count against validity.
    pub fn is_form_valid(&self) -> bool {
        self.read().is_valid()
    }

    /// Validity restricted to the given fields. Unvalidated fields pass.
    pub fn is_valid_among<'a, I>(&self, field_ids: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let inner = self.read();
        field_ids
            .into_iter()
            .all(|id| inner.results.get(id).is_none_or(ValidationResult::is_valid))
    }

    /// Ids of fields whose stored result is invalid, sorted.
    pub fn invalid_fields(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .read()
            .results
            .iter()
            .filter(|(_, r)| r.is_invalid())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Forget a field's value and result (e.g. a removed list item).
    pub fn remove(&self, field_id: &str) {
        let (snapshot, valid) = match self.inner.write() {
            Ok(mut guard) => {
                guard.values.remove(field_id);
                guard.results.remove(field_id);
                (guard.values.clone(), guard.is_valid())
            }
            Err(_) => return,
        };
        debug!("FormState: removed '{}'", field_id);
        self.dirty.store(true, Ordering::SeqCst);
        self.value_changed.emit(&snapshot);
        self.field_validated.emit(&FieldValidated {
            field_id: field_id.to_string(),
            result: None,
        });
        self.validity_changed.emit(&valid);
    }

    /// Clear every value and result.
    pub fn reset(&self) {
        match self.inner.write() {
            Ok(mut guard) => {
                guard.values.clear();
                guard.results.clear();
            }
            Err(_) => return,
        }
        debug!("FormState: reset");
        self.dirty.store(true, Ordering::SeqCst);
        self.value_changed.emit(&FormValues::new());
        self.validity_changed.emit(&true);
    }

    /// Check if the store changed since the last [`clear_dirty`](Self::clear_dirty).
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Clear the dirty flag (after a render)
    pub fn clear_dirty(&self) {
        self.dirty.store(false, Ordering::SeqCst);
    }

    // -------------------------------------------------------------------------
    // Notifications
    // -------------------------------------------------------------------------

    /// Subscribe to full value-map snapshots, one per mutation.
    pub fn on_value_changed<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&FormValues) + Send + Sync + 'static,
    {
        self.value_changed.subscribe(handler)
    }

    /// Subscribe to overall validity, broadcast after every result change.
    pub fn on_validity_changed<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&bool) + Send + Sync + 'static,
    {
        self.validity_changed.subscribe(handler)
    }

    /// Subscribe to per-field result changes.
    pub fn on_field_validated<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&FieldValidated) + Send + Sync + 'static,
    {
        self.field_validated.subscribe(handler)
    }

    pub fn value_changed(&self) -> &EventChannel<FormValues> {
        &self.value_changed
    }

    pub fn validity_changed(&self) -> &EventChannel<bool> {
        &self.validity_changed
    }

    pub fn field_validated(&self) -> &EventChannel<FieldValidated> {
        &self.field_validated
    }
}

impl Default for FormState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::Utc;

    use crate::validation::ValidationError;

    fn invalid() -> ValidationResult {
        ValidationResult::invalid(ValidationError::with_code("required", "This field is required"))
    }

    #[test]
    fn test_unset_value_is_empty() {
        let state = FormState::new();
        assert_eq!(state.value("missing"), FieldValue::Empty);
        assert!(!state.has_value("missing"));
    }

    #[test]
    fn test_round_trip_every_variant() {
        let state = FormState::new();
        let values = [
            FieldValue::text("a"),
            FieldValue::Number(1.5),
            FieldValue::Boolean(false),
            FieldValue::Date(Utc::now()),
            FieldValue::selection("x"),
            FieldValue::multi(["x", "y"]),
            FieldValue::Empty,
        ];
        for (i, value) in values.into_iter().enumerate() {
            let id = format!("field{}", i);
            state.set_value(id.as_str(), value.clone());
            assert_eq!(state.value(&id), value);
        }
    }

    #[test]
    fn test_set_value_does_not_validate() {
        let state = FormState::new();
        state.set_value("name", FieldValue::Empty);
        assert!(state.validation_result("name").is_none());
        assert!(state.is_form_valid());
    }

    #[test]
    fn test_validity_aggregation() {
        let state = FormState::new();
        assert!(state.is_form_valid());

        state.set_validation_result("a", Some(ValidationResult::valid()));
        state.set_validation_result("b", Some(invalid()));
        assert!(!state.is_form_valid());
        assert_eq!(state.invalid_fields(), ["b"]);

        state.set_validation_result("b", Some(ValidationResult::valid()));
        assert!(state.is_form_valid());

        state.set_validation_result("b", Some(invalid()));
        state.set_validation_result("b", None);
        assert!(state.is_form_valid());
    }

    #[test]
    fn test_validity_among_subset() {
        let state = FormState::new();
        state.set_validation_result("hidden", Some(invalid()));
        assert!(!state.is_form_valid());
        assert!(state.is_valid_among(["visible"]));
        assert!(!state.is_valid_among(["visible", "hidden"]));
    }

    #[test]
    fn test_value_snapshot_reflects_call() {
        let state = FormState::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let _sub = {
            let seen = Arc::clone(&seen);
            state.on_value_changed(move |values| {
                seen.lock().unwrap().push(values.get("n").cloned());
            })
        };

        state.set_value("n", FieldValue::Number(1.0));
        state.set_value("n", FieldValue::Number(2.0));

        assert_eq!(
            *seen.lock().unwrap(),
            [Some(FieldValue::Number(1.0)), Some(FieldValue::Number(2.0))]
        );
    }

    #[test]
    fn test_value_then_result_ordering() {
        let state = FormState::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let _values = {
            let log = Arc::clone(&log);
            state.on_value_changed(move |_| log.lock().unwrap().push("value"))
        };
        let _fields = {
            let log = Arc::clone(&log);
            state.on_field_validated(move |_| log.lock().unwrap().push("result"))
        };
        let _validity = {
            let log = Arc::clone(&log);
            state.on_validity_changed(move |_| log.lock().unwrap().push("validity"))
        };

        state.set_value("name", FieldValue::text("Ada"));
        state.set_validation_result("name", Some(ValidationResult::valid()));

        assert_eq!(*log.lock().unwrap(), ["value", "result", "validity"]);
    }

    #[test]
    fn test_handler_can_read_store() {
        let state = FormState::new();
        let reader = state.clone();
        let seen = Arc::new(Mutex::new(None));
        let _sub = {
            let seen = Arc::clone(&seen);
            state.on_value_changed(move |_| {
                *seen.lock().unwrap() = Some(reader.value("a"));
            })
        };

        state.set_value("a", FieldValue::Boolean(true));
        assert_eq!(*seen.lock().unwrap(), Some(FieldValue::Boolean(true)));
    }

    #[test]
    fn test_reset_and_remove() {
        let state = FormState::new();
        state.set_value("a", FieldValue::text("x"));
        state.set_value("b", FieldValue::text("y"));
        state.set_validation_result("a", Some(invalid()));

        state.remove("a");
        assert!(!state.has_value("a"));
        assert!(state.is_form_valid());

        state.reset();
        assert!(state.values().is_empty());
    }

    #[test]
    fn test_dirty_flag() {
        let state = FormState::new();
        assert!(!state.is_dirty());
        state.set_value("a", FieldValue::Empty);
        assert!(state.is_dirty());
        state.clear_dirty();
        assert!(!state.is_dirty());
    }
}
