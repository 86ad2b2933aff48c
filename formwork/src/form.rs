//! Form lifecycle and submission.

use std::sync::Arc;

use log::debug;

use crate::conditional::ConditionalEvaluator;
use crate::config::FormBehavior;
use crate::context::FormContext;
use crate::events::{EventChannel, Subscription};
use crate::field::FieldDescriptor;
use crate::node::{FormTree, WalkScope};
use crate::state::FormState;
use crate::validation::Validator;
use crate::value::FormValues;

/// Result of [`Form::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The submit handlers received this snapshot.
    Submitted(FormValues),
    /// Submission was prevented because a reachable field is invalid.
    Blocked {
        /// First invalid field in tree order, when `auto_scroll` is enabled.
        scroll_to: Option<String>,
    },
}

impl SubmitOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted(_))
    }
}

/// A mounted form: tree, store, validator and submission.
///
/// `Form` owns the conditional evaluators of its tree while mounted and
/// coordinates submission. Field renderers only ever see the
/// [`FormContext`].
///
/// Only fields reachable in the active tree take part in submission.
/// Fields inside an inactive conditional branch are neither validated nor
/// allowed to block it; their values and results stay in the store while
/// the form is mounted. Unmounting clears the store.
///
/// # Example
///
/// ```ignore
/// let tree = form![FieldDescriptor::text("name").label("Name").required()]?;
/// let mut form = Form::new(tree, FormBehavior::default());
/// form.mount();
///
/// let _sub = form.on_submit(|values| println!("submitted {:?}", values));
///
/// assert!(!form.submit().is_submitted());
/// form.context().commit(&form.field("name").unwrap(), FieldValue::text("Ada"));
/// assert!(form.submit().is_submitted());
/// ```
pub struct Form {
    tree: FormTree,
    context: FormContext,
    submitted: EventChannel<FormValues>,
    evaluators: Vec<ConditionalEvaluator>,
}

impl Form {
    /// Create an unmounted form with a default validator.
    pub fn new(tree: FormTree, behavior: FormBehavior) -> Self {
        Self::with_validator(tree, behavior, Arc::new(Validator::new()))
    }

    /// Create an unmounted form sharing `validator` (and its cache).
    pub fn with_validator(tree: FormTree, behavior: FormBehavior, validator: Arc<Validator>) -> Self {
        Self {
            tree,
            context: FormContext::new(FormState::new(), validator, behavior),
            submitted: EventChannel::new(),
            evaluators: Vec::new(),
        }
    }

    pub fn tree(&self) -> &FormTree {
        &self.tree
    }

    /// Context to hand to field renderers.
    pub fn context(&self) -> &FormContext {
        &self.context
    }

    pub fn state(&self) -> &FormState {
        self.context.state()
    }

    pub fn behavior(&self) -> &FormBehavior {
        self.context.behavior()
    }

    /// Look up a field anywhere in the tree.
    pub fn field(&self, field_id: &str) -> Option<FieldDescriptor> {
        self.tree.field(field_id)
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Seed default values, attach conditional evaluators and, if configured,
    /// validate every reachable field. Mounting twice is a no-op.
    pub fn mount(&mut self) {
        if self.context.is_mounted() {
            return;
        }
        self.context.set_mounted(true);
        self.seed_defaults();

        self.evaluators = self
            .tree
            .conditionals()
            .into_iter()
            .map(|(key, predicate)| ConditionalEvaluator::attach(self.state(), key, predicate))
            .collect();

        if self.behavior().validate_on_mount {
            self.validate_all();
        }
        debug!(
            "Form: mounted ({} fields, {} conditionals)",
            self.tree.fields(WalkScope::All).len(),
            self.evaluators.len()
        );
    }

    /// Drop pending debounced commits, detach evaluators and clear the
    /// store. A later [`mount`](Self::mount) starts from the defaults.
    pub fn unmount(&mut self) {
        if !self.context.is_mounted() {
            return;
        }
        self.context.set_mounted(false);
        self.evaluators.clear();
        self.state().reset();
        debug!("Form: unmounted");
    }

    pub fn is_mounted(&self) -> bool {
        self.context.is_mounted()
    }

    /// Clear the store and reseed defaults.
    pub fn reset(&self) {
        self.context.cancel_pending();
        self.state().reset();
        self.seed_defaults();
        if self.is_mounted() && self.behavior().validate_on_mount {
            self.validate_all();
        }
        debug!("Form: reset");
    }

    fn seed_defaults(&self) {
        for field in self.tree.fields(WalkScope::All) {
            if let Some(value) = field.initial_value() {
                self.state().set_value(field.id(), value.clone());
            }
        }
    }

    // -------------------------------------------------------------------------
    // Host handlers
    // -------------------------------------------------------------------------

    /// Called with the value snapshot on every successful submission.
    pub fn on_submit<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&FormValues) + Send + Sync + 'static,
    {
        self.submitted.subscribe(handler)
    }

    /// Called with the store's overall validity after every validation write.
    pub fn on_validation_changed<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&bool) + Send + Sync + 'static,
    {
        self.state().on_validity_changed(handler)
    }

    /// Called with the full value map after every value write.
    pub fn on_value_changed<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&FormValues) + Send + Sync + 'static,
    {
        self.state().on_value_changed(handler)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Fields reachable in the active tree, in tree order.
    pub fn active_fields(&self) -> Vec<FieldDescriptor> {
        let values = self.state().values();
        self.tree.fields(WalkScope::Active(&values))
    }

    /// Activation of a conditional branch by key. `None` while unmounted or
    /// if no branch has that key.
    pub fn is_active(&self, key: &str) -> Option<bool> {
        self.evaluators
            .iter()
            .find(|e| e.key() == key)
            .map(ConditionalEvaluator::is_active)
    }

    /// Conditional evaluators attached while mounted.
    pub fn conditionals(&self) -> &[ConditionalEvaluator] {
        &self.evaluators
    }

    /// First active field, in tree order, whose stored result is invalid.
    pub fn first_invalid_field(&self) -> Option<String> {
        self.active_fields()
            .into_iter()
            .find(|field| {
                self.state()
                    .validation_result(field.id())
                    .is_some_and(|result| result.is_invalid())
            })
            .map(|field| field.id().to_string())
    }

    /// Whether the reachable fields are currently valid.
    pub fn is_valid(&self) -> bool {
        let fields = self.active_fields();
        self.state().is_valid_among(fields.iter().map(FieldDescriptor::id))
    }

    /// Whether a submit control should be enabled.
    pub fn can_submit(&self) -> bool {
        !self.behavior().disable_submit_when_invalid || self.is_valid()
    }

    // -------------------------------------------------------------------------
    // Validation and submission
    // -------------------------------------------------------------------------

    /// Validate every field reachable in the active tree. Returns whether
    /// all of them passed.
    pub fn validate_all(&self) -> bool {
        let mut valid = true;
        for field in self.active_fields() {
            valid &= self.context.validate_field(&field).is_valid();
        }
        valid
    }

    /// Validate (if configured) and hand the value snapshot to the submit
    /// handlers unless an invalid reachable field prevents it.
    pub fn submit(&self) -> SubmitOutcome {
        let behavior = self.behavior();
        if behavior.validate_on_submit {
            self.validate_all();
        }

        if behavior.prevent_submit_when_invalid && !self.is_valid() {
            let scroll_to = if behavior.auto_scroll {
                self.first_invalid_field()
            } else {
                None
            };
            debug!("Form: submit blocked (scroll_to={:?})", scroll_to);
            return SubmitOutcome::Blocked { scroll_to };
        }

        let values = self.state().values();
        debug!("Form: submitting {} values", values.len());
        self.submitted.emit(&values);
        SubmitOutcome::Submitted(values)
    }
}

impl Drop for Form {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form")
            .field("tree", &self.tree)
            .field("mounted", &self.is_mounted())
            .field("conditionals", &self.evaluators)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::node::FormNode;
    use crate::validation::rule::{MinLength, codes};
    use crate::value::FieldValue;

    fn tree() -> FormTree {
        FormTree::new(vec![
            FieldDescriptor::text("name").required().into(),
            FieldDescriptor::toggle("ship").default_value(false).into(),
            FormNode::when(
                |v| v.get("ship").is_some_and(FieldValue::bool_value),
                vec![FieldDescriptor::text("address").required().into()],
            ),
            FieldDescriptor::text("bio")
                .rule(MinLength::new(3))
                .default_value("about me")
                .into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_mount_seeds_defaults_and_attaches_evaluators() {
        let mut form = Form::new(tree(), FormBehavior::default());
        assert_eq!(form.is_active("c"), None);

        form.mount();
        assert_eq!(form.state().value("ship"), FieldValue::Boolean(false));
        assert_eq!(form.conditionals().len(), 1);
        assert!(!form.conditionals()[0].is_active());
        // lazy by default
        assert!(form.state().validation_result("name").is_none());
    }

    #[test]
    fn test_remount_starts_from_defaults() {
        let mut form = Form::new(tree(), FormBehavior::default());
        form.mount();
        form.state().set_value("name", FieldValue::text("Ada"));
        assert!(form.submit().is_submitted());
        assert!(form.state().validation_result("name").is_some());
        form.state().set_value("ship", FieldValue::Boolean(true));

        form.unmount();
        assert_eq!(form.state().value("name"), FieldValue::Empty);

        form.mount();
        assert_eq!(form.state().value("name"), FieldValue::Empty);
        assert!(form.state().validation_result("name").is_none());
        assert_eq!(form.state().value("ship"), FieldValue::Boolean(false));
        assert!(!form.conditionals()[0].is_active());
    }

    #[test]
    fn test_mount_overrides_values_set_before_mount() {
        let mut form = Form::new(tree(), FormBehavior::default());
        form.state().set_value("bio", FieldValue::text("draft"));
        form.mount();
        assert_eq!(form.state().value("bio"), FieldValue::text("about me"));
    }

    #[test]
    fn test_validate_on_mount() {
        let mut form = Form::new(tree(), FormBehavior::default().validate_on_mount(true));
        form.mount();
        assert!(form.state().validation_result("name").is_some_and(|r| r.has_code(codes::REQUIRED)));
        // inactive branch untouched
        assert!(form.state().validation_result("address").is_none());
    }

    #[test]
    fn test_blocked_submit_reports_first_invalid_field() {
        let mut form = Form::new(tree(), FormBehavior::default());
        form.mount();
        form.state().set_value("bio", FieldValue::text("x"));

        match form.submit() {
            SubmitOutcome::Blocked { scroll_to } => assert_eq!(scroll_to.as_deref(), Some("name")),
            other => panic!("expected blocked submit, got {:?}", other),
        }
        assert_eq!(form.first_invalid_field().as_deref(), Some("name"));
    }

    #[test]
    fn test_no_scroll_target_without_auto_scroll() {
        let form = Form::new(tree(), FormBehavior::default().auto_scroll(false));
        assert_eq!(form.submit(), SubmitOutcome::Blocked { scroll_to: None });
    }

    #[test]
    fn test_inactive_branch_does_not_block() {
        let mut form = Form::new(tree(), FormBehavior::default());
        form.mount();
        form.state().set_value("name", FieldValue::text("Ada"));
        assert!(form.submit().is_submitted());

        form.state().set_value("ship", FieldValue::Boolean(true));
        assert!(form.conditionals()[0].is_active());
        assert_eq!(
            form.submit(),
            SubmitOutcome::Blocked {
                scroll_to: Some("address".to_string())
            }
        );

        // hiding the branch again lifts the block; the stale result stays stored
        form.state().set_value("ship", FieldValue::Boolean(false));
        assert!(form.submit().is_submitted());
        assert!(form.state().validation_result("address").is_some());
        assert!(!form.state().is_form_valid());
    }

    #[test]
    fn test_invalid_submission_allowed_when_not_prevented() {
        let form = Form::new(tree(), FormBehavior::default().prevent_submit_when_invalid(false));
        let calls = Arc::new(Mutex::new(0));
        let _sub = {
            let calls = Arc::clone(&calls);
            form.on_submit(move |_| *calls.lock().unwrap() += 1)
        };

        assert!(form.submit().is_submitted());
        assert_eq!(*calls.lock().unwrap(), 1);
        assert!(form.state().validation_result("name").is_some_and(|r| r.is_invalid()));
    }

    #[test]
    fn test_submit_without_validate_on_submit_trusts_lazy_state() {
        let form = Form::new(tree(), FormBehavior::default().validate_on_submit(false));
        assert!(form.submit().is_submitted());
        assert!(form.state().validation_result("name").is_none());
    }

    #[test]
    fn test_can_submit() {
        let form = Form::new(tree(), FormBehavior::default());
        form.validate_all();
        // disable_submit_when_invalid is off by default
        assert!(form.can_submit());

        let form = Form::new(tree(), FormBehavior::default().disable_submit_when_invalid(true));
        assert!(form.can_submit());
        form.validate_all();
        assert!(!form.can_submit());
    }

    #[test]
    fn test_reset_reseeds_defaults() {
        let mut form = Form::new(tree(), FormBehavior::default());
        form.mount();
        form.state().set_value("ship", FieldValue::Boolean(true));
        form.state().set_value("name", FieldValue::text("Ada"));
        form.validate_all();

        form.reset();
        assert_eq!(form.state().value("name"), FieldValue::Empty);
        assert_eq!(form.state().value("ship"), FieldValue::Boolean(false));
        assert!(form.state().invalid_fields().is_empty());
        assert!(!form.conditionals()[0].is_active());
    }

    #[test]
    fn test_unmount_detaches_evaluators() {
        let mut form = Form::new(tree(), FormBehavior::default());
        form.mount();
        assert_eq!(form.state().value_changed().len(), 1);
        form.unmount();
        assert!(form.state().value_changed().is_empty());
        assert!(!form.is_mounted());
    }
}
