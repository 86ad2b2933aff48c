use std::sync::{Arc, Mutex};

use formwork::node::Predicate;
use formwork::prelude::*;

fn flag(id: &'static str) -> impl Fn(&FormValues) -> bool + Send + Sync + 'static {
    move |values: &FormValues| values.get(id).is_some_and(FieldValue::bool_value)
}

fn shipping_form() -> Form {
    let tree = form![
        FieldDescriptor::toggle("a").label("Ship to a different address"),
        FieldDescriptor::text("b"),
        FormNode::when(
            flag("a"),
            vec![
                FieldDescriptor::text("street").required().into(),
                FormNode::when(
                    |values| values.get("country").is_some_and(|c| c.string_value() == "US"),
                    vec![FieldDescriptor::text("state").required().into()],
                )
                .key("us-only"),
            ],
        )
        .key("shipping"),
    ]
    .unwrap();
    let mut form = Form::new(tree, FormBehavior::default());
    form.mount();
    form
}

// ============================================================================
// Evaluation
// ============================================================================

#[test]
fn test_flag_toggles_subtree() {
    let form = shipping_form();
    assert_eq!(form.is_active("shipping"), Some(false));

    form.state().set_value("a", FieldValue::Boolean(true));
    assert_eq!(form.is_active("shipping"), Some(true));

    form.state().set_value("a", FieldValue::Boolean(false));
    assert_eq!(form.is_active("shipping"), Some(false));
}

#[test]
fn test_unrelated_field_does_not_toggle() {
    let form = shipping_form();
    let evaluator = form
        .conditionals()
        .iter()
        .find(|e| e.key() == "shipping")
        .unwrap();
    let toggles = Arc::new(Mutex::new(Vec::new()));
    let _sub = {
        let toggles = Arc::clone(&toggles);
        evaluator.on_toggle(move |active| toggles.lock().unwrap().push(*active))
    };

    form.state().set_value("b", FieldValue::text("x"));
    form.state().set_value("b", FieldValue::text("y"));
    assert!(toggles.lock().unwrap().is_empty());

    form.state().set_value("a", FieldValue::Boolean(true));
    form.state().set_value("b", FieldValue::text("z"));
    assert_eq!(*toggles.lock().unwrap(), [true]);
}

#[test]
fn test_level_triggered_after_reset() {
    let form = shipping_form();
    form.state().set_value("a", FieldValue::Boolean(true));
    assert_eq!(form.is_active("shipping"), Some(true));

    form.reset();
    assert_eq!(form.is_active("shipping"), Some(false));
}

#[test]
fn test_standalone_evaluator() {
    let state = FormState::new();
    let evaluator = ConditionalEvaluator::attach(&state, "c", Predicate::new(flag("a")));
    assert!(!evaluator.is_active());

    let mut values = FormValues::new();
    values.insert("a".to_string(), FieldValue::Boolean(true));
    assert!(evaluator.evaluate(&values));
    assert!(evaluator.is_active());
}

#[test]
fn test_derived_value_set_from_handler_is_seen_last() {
    let tree = form![
        FieldDescriptor::text("country"),
        FieldDescriptor::toggle("ship"),
        FormNode::when(flag("ship"), vec![FieldDescriptor::text("street").into()])
            .key("shipping"),
    ]
    .unwrap();
    let mut form = Form::new(tree, FormBehavior::default());

    // registered before mount, so it runs ahead of the evaluators
    let _derive = {
        let state = form.state().clone();
        form.on_value_changed(move |values| {
            let us = values.get("country").is_some_and(|c| c.string_value() == "US");
            let shipping = values.get("ship").is_some_and(FieldValue::bool_value);
            if us && !shipping {
                state.set_value("ship", FieldValue::Boolean(true));
            }
        })
    };
    form.mount();

    form.state().set_value("country", FieldValue::text("US"));

    assert_eq!(form.state().value("ship"), FieldValue::Boolean(true));
    assert_eq!(form.is_active("shipping"), Some(true));
    assert!(form.active_fields().iter().any(|f| f.id() == "street"));
}

// ============================================================================
// Active Tree
// ============================================================================

#[test]
fn test_nested_branch_needs_both_predicates() {
    let form = shipping_form();
    let ids = |form: &Form| -> Vec<String> {
        form.active_fields().iter().map(|f| f.id().to_string()).collect()
    };

    assert_eq!(ids(&form), ["a", "b"]);

    form.state().set_value("country", FieldValue::text("US"));
    assert_eq!(ids(&form), ["a", "b"]);

    form.state().set_value("a", FieldValue::Boolean(true));
    assert_eq!(ids(&form), ["a", "b", "street", "state"]);
}

#[test]
fn test_hidden_required_fields_do_not_block() {
    let form = shipping_form();
    assert!(form.submit().is_submitted());

    form.state().set_value("a", FieldValue::Boolean(true));
    assert_eq!(
        form.submit(),
        SubmitOutcome::Blocked {
            scroll_to: Some("street".to_string())
        }
    );

    form.state().set_value("a", FieldValue::Boolean(false));
    assert!(form.submit().is_submitted());
    // last result of the hidden field is kept
    assert!(form.state().validation_result("street").is_some_and(|r| r.is_invalid()));
}

#[test]
fn test_hidden_values_stay_in_store() {
    let form = shipping_form();
    form.state().set_value("a", FieldValue::Boolean(true));
    form.state().set_value("street", FieldValue::text("1 Main St"));
    form.state().set_value("a", FieldValue::Boolean(false));

    assert_eq!(form.state().value("street"), FieldValue::text("1 Main St"));
}

// ============================================================================
// Dynamic Lists
// ============================================================================

#[test]
fn test_list_items_get_scoped_ids() {
    let guests = FormNode::list("guests", ["Ada", "Grace"], |scope, name| {
        FormNode::card(vec![
            FormNode::text(format!("Guest {}", name)),
            FieldDescriptor::text(scope.id("email")).rule(Email::new()).into(),
        ])
    });
    let tree = FormTree::new(vec![guests]).unwrap();

    assert_eq!(
        tree.field_ids(WalkScope::All),
        ["guests[0].email", "guests[1].email"]
    );
}

#[test]
fn test_duplicate_ids_across_branches_fail_fast() {
    let result = form![
        FormNode::when(flag("a"), vec![FieldDescriptor::text("email").into()]),
        FormNode::when(|v| !flag("a")(v), vec![FieldDescriptor::text("email").into()]),
    ];

    match result {
        Err(FormError::DuplicateFieldId { id }) => assert_eq!(id, "email"),
        other => panic!("expected duplicate id error, got {:?}", other),
    }
}
