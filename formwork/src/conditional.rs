//! Conditional branch activation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;

use crate::events::{EventChannel, Subscription};
use crate::node::Predicate;
use crate::state::FormState;
use crate::value::FormValues;

/// Tracks whether one conditional branch is active.
///
/// The evaluator subscribes to the store's value-changed channel and
/// re-runs its predicate against the full value map on every broadcast,
/// whichever field changed. The predicate alone decides which keys matter.
/// Dropping the evaluator detaches it from the store.
///
/// # Example
///
/// ```ignore
/// let shipping = ConditionalEvaluator::attach(
///     &state,
///     "shipping",
///     Predicate::new(|v| v.get("ship").is_some_and(|s| s.bool_value())),
/// );
///
/// state.set_value("ship", FieldValue::Boolean(true));
/// assert!(shipping.is_active());
/// ```
pub struct ConditionalEvaluator {
    key: String,
    predicate: Predicate,
    active: Arc<AtomicBool>,
    toggled: EventChannel<bool>,
    _subscription: Subscription,
}

impl ConditionalEvaluator {
    /// Attach to a store. The initial state is evaluated immediately.
    pub fn attach(state: &FormState, key: impl Into<String>, predicate: Predicate) -> Self {
        let key = key.into();
        let active = Arc::new(AtomicBool::new(predicate.eval(&state.values())));
        let toggled = EventChannel::new();

        let subscription = {
            let key = key.clone();
            let predicate = predicate.clone();
            let active = Arc::clone(&active);
            let toggled = toggled.clone();
            state.on_value_changed(move |values| {
                apply(&key, &predicate, &active, &toggled, values);
            })
        };

        debug!(
            "conditional '{}' attached ({})",
            key,
            if active.load(Ordering::SeqCst) { "active" } else { "inactive" }
        );

        Self {
            key,
            predicate,
            active,
            toggled,
            _subscription: subscription,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the branch is currently active
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Re-evaluate against an explicit value map.
    pub fn evaluate(&self, values: &FormValues) -> bool {
        apply(&self.key, &self.predicate, &self.active, &self.toggled, values)
    }

    /// Subscribe to activation changes. Only real transitions are reported.
    pub fn on_toggle<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&bool) + Send + Sync + 'static,
    {
        self.toggled.subscribe(handler)
    }
}

fn apply(
    key: &str,
    predicate: &Predicate,
    active: &AtomicBool,
    toggled: &EventChannel<bool>,
    values: &FormValues,
) -> bool {
    let now = predicate.eval(values);
    let was = active.swap(now, Ordering::SeqCst);
    if was != now {
        debug!(
            "conditional '{}' {}",
            key,
            if now { "activated" } else { "deactivated" }
        );
        toggled.emit(&now);
    }
    now
}

impl std::fmt::Debug for ConditionalEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionalEvaluator")
            .field("key", &self.key)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::value::FieldValue;

    fn flag_predicate() -> Predicate {
        Predicate::new(|v| v.get("a").is_some_and(FieldValue::bool_value))
    }

    #[test]
    fn test_follows_field_value() {
        let state = FormState::new();
        let cond = ConditionalEvaluator::attach(&state, "c", flag_predicate());
        assert!(!cond.is_active());

        state.set_value("a", FieldValue::Boolean(true));
        assert!(cond.is_active());

        state.set_value("a", FieldValue::Boolean(false));
        assert!(!cond.is_active());
    }

    #[test]
    fn test_unrelated_field_does_not_toggle() {
        let state = FormState::new();
        let cond = ConditionalEvaluator::attach(&state, "c", flag_predicate());
        let toggles = Arc::new(Mutex::new(Vec::new()));
        let _sub = {
            let toggles = Arc::clone(&toggles);
            cond.on_toggle(move |active| toggles.lock().unwrap().push(*active))
        };

        state.set_value("a", FieldValue::Boolean(true));
        state.set_value("b", FieldValue::text("unrelated"));
        state.set_value("b", FieldValue::text("still unrelated"));

        assert!(cond.is_active());
        assert_eq!(*toggles.lock().unwrap(), [true]);
    }

    #[test]
    fn test_initial_state_uses_current_values() {
        let state = FormState::new();
        state.set_value("a", FieldValue::Boolean(true));
        let cond = ConditionalEvaluator::attach(&state, "c", flag_predicate());
        assert!(cond.is_active());
    }

    #[test]
    fn test_drop_detaches() {
        let state = FormState::new();
        let cond = ConditionalEvaluator::attach(&state, "c", flag_predicate());
        assert_eq!(state.value_changed().len(), 1);
        drop(cond);
        assert!(state.value_changed().is_empty());
    }
}
