use std::collections::HashSet;

use super::{FormNode, Predicate};
use crate::error::FormError;
use crate::field::FieldDescriptor;
use crate::value::FormValues;

/// Which conditional branches a walk descends into.
#[derive(Debug, Clone, Copy)]
pub enum WalkScope<'a> {
    /// Only branches whose predicate holds for these values (and whose
    /// ancestors are active too).
    Active(&'a FormValues),
    /// Every branch, regardless of predicates.
    All,
}

/// An immutable, validated form definition.
///
/// Construction walks every branch (all conditional branches and every list
/// item) and rejects empty or duplicate field ids, so a field id is always a
/// unique join key into the form state.
#[derive(Debug, Clone)]
pub struct FormTree {
    nodes: Vec<FormNode>,
}

impl FormTree {
    /// Build a tree from its top-level nodes.
    pub fn new(nodes: Vec<FormNode>) -> Result<Self, FormError> {
        let tree = Self { nodes };
        let mut seen = HashSet::new();
        let mut error = None;

        tree.walk(WalkScope::All, &mut |node| {
            if error.is_some() {
                return;
            }
            if let Some(field) = node.as_field() {
                if field.id().is_empty() {
                    error = Some(FormError::EmptyFieldId);
                } else if !seen.insert(field.id().to_string()) {
                    error = Some(FormError::duplicate(field.id()));
                }
            }
        });

        match error {
            Some(error) => Err(error),
            None => Ok(tree),
        }
    }

    /// Top-level nodes
    pub fn nodes(&self) -> &[FormNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Visit nodes depth-first in tree order.
    ///
    /// Conditional nodes themselves are always visited; their children only
    /// when the scope allows it.
    pub fn walk(&self, scope: WalkScope<'_>, visit: &mut dyn FnMut(&FormNode)) {
        for node in &self.nodes {
            walk_node(node, scope, visit);
        }
    }

    /// Field descriptors reachable in `scope`, in tree order.
    pub fn fields(&self, scope: WalkScope<'_>) -> Vec<FieldDescriptor> {
        let mut fields = Vec::new();
        self.walk(scope, &mut |node| {
            if let Some(field) = node.as_field() {
                fields.push(field.clone());
            }
        });
        fields
    }

    /// Field ids reachable in `scope`, in tree order.
    pub fn field_ids(&self, scope: WalkScope<'_>) -> Vec<String> {
        let mut ids = Vec::new();
        self.walk(scope, &mut |node| {
            if let Some(field) = node.as_field() {
                ids.push(field.id().to_string());
            }
        });
        ids
    }

    /// Look up a field anywhere in the tree.
    pub fn field(&self, field_id: &str) -> Option<FieldDescriptor> {
        let mut found = None;
        self.walk(WalkScope::All, &mut |node| {
            if found.is_some() {
                return;
            }
            if let Some(field) = node.as_field().filter(|f| f.id() == field_id) {
                found = Some(field.clone());
            }
        });
        found
    }

    /// Every conditional node as `(key, predicate)`, including nested ones.
    pub fn conditionals(&self) -> Vec<(String, Predicate)> {
        let mut conditionals = Vec::new();
        self.walk(WalkScope::All, &mut |node| {
            if let FormNode::Conditional { key, predicate, .. } = node {
                conditionals.push((key.clone(), predicate.clone()));
            }
        });
        conditionals
    }
}

fn walk_node(node: &FormNode, scope: WalkScope<'_>, visit: &mut dyn FnMut(&FormNode)) {
    visit(node);
    match node {
        FormNode::Field(_)
        | FormNode::Spacer { .. }
        | FormNode::Divider { .. }
        | FormNode::StaticText { .. } => {}
        FormNode::Row { children, .. }
        | FormNode::Column { children, .. }
        | FormNode::Section { children, .. }
        | FormNode::Card { children, .. }
        | FormNode::List { children, .. } => {
            for child in children {
                walk_node(child, scope, visit);
            }
        }
        FormNode::Conditional {
            predicate,
            children,
            ..
        } => {
            let active = match scope {
                WalkScope::All => true,
                WalkScope::Active(values) => predicate.eval(values),
            };
            if active {
                for child in children {
                    walk_node(child, scope, visit);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldValue;

    fn shipping_tree() -> FormTree {
        FormTree::new(vec![
            FormNode::section(vec![
                FormNode::row(vec![
                    FieldDescriptor::text("first").into(),
                    FieldDescriptor::text("last").into(),
                ]),
                FormNode::card(vec![FieldDescriptor::toggle("gift").into()]),
            ]),
            FormNode::when(
                |v| v.get("gift").is_some_and(FieldValue::bool_value),
                vec![FormNode::column(vec![FieldDescriptor::text("message").into()])],
            ),
            FormNode::list("items", ["a", "b"], |scope, _| {
                FormNode::field(FieldDescriptor::number(scope.id("qty")))
            }),
            FormNode::divider(),
        ])
        .unwrap()
    }

    #[test]
    fn test_active_walk_skips_inactive_branches() {
        let tree = shipping_tree();
        let values = FormValues::new();
        assert_eq!(
            tree.field_ids(WalkScope::Active(&values)),
            ["first", "last", "gift", "items[0].qty", "items[1].qty"]
        );
    }

    #[test]
    fn test_active_walk_includes_active_branches() {
        let tree = shipping_tree();
        let mut values = FormValues::new();
        values.insert("gift".into(), FieldValue::Boolean(true));
        assert!(tree
            .field_ids(WalkScope::Active(&values))
            .contains(&"message".to_string()));
    }

    #[test]
    fn test_all_walk_includes_everything() {
        let tree = shipping_tree();
        assert_eq!(tree.fields(WalkScope::All).len(), 6);
        assert!(tree.field("message").is_some());
        assert!(tree.field("nope").is_none());
        assert_eq!(tree.conditionals().len(), 1);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = FormTree::new(vec![
            FieldDescriptor::text("email").into(),
            FormNode::when(|_| false, vec![FieldDescriptor::text("email").into()]),
        ])
        .unwrap_err();
        assert!(matches!(err, FormError::DuplicateFieldId { id } if id == "email"));
    }

    #[test]
    fn test_duplicate_ids_inside_lists_rejected() {
        let result = FormTree::new(vec![FormNode::list("l", ["a", "b"], |_, _| {
            FormNode::field(FieldDescriptor::text("unscoped"))
        })]);
        assert!(matches!(result, Err(FormError::DuplicateFieldId { .. })));
    }

    #[test]
    fn test_empty_id_rejected() {
        let result = FormTree::new(vec![FieldDescriptor::text("").into()]);
        assert!(matches!(result, Err(FormError::EmptyFieldId)));
    }

    #[test]
    fn test_form_macro() {
        let tree = crate::form![
            FieldDescriptor::text("name"),
            FormNode::divider(),
            FormNode::text("Optional details"),
        ]
        .unwrap();
        assert_eq!(tree.nodes().len(), 3);
        assert_eq!(tree.field_ids(WalkScope::All), ["name"]);
    }
}
