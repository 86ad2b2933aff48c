//! Dynamic lists: one generated subtree per item.

use std::fmt;
use std::sync::Arc;

use super::FormNode;

/// Position of one generated list item.
///
/// Factories should derive their field ids from the scope so ids are
/// qualified by the list and the item index:
///
/// ```ignore
/// FormNode::list("guests", ["Ada", "Grace"], |scope, _name| {
///     FormNode::field(FieldDescriptor::text(scope.id("email")).required())
/// })
/// // -> fields "guests[0].email" and "guests[1].email"
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListScope {
    list: String,
    index: usize,
}

impl ListScope {
    pub(crate) fn new(list: impl Into<String>, index: usize) -> Self {
        Self {
            list: list.into(),
            index,
        }
    }

    /// Qualify a field name with the list key and item index.
    pub fn id(&self, name: &str) -> String {
        format!("{}[{}].{}", self.list, self.index, name)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn list_key(&self) -> &str {
        &self.list
    }
}

/// Builds the subtree for one list item.
#[derive(Clone)]
pub struct ItemFactory(Arc<dyn Fn(&ListScope, &str) -> FormNode + Send + Sync>);

impl ItemFactory {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&ListScope, &str) -> FormNode + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Generate the subtrees for every item, in item order.
    pub fn build(&self, list: &str, items: &[String]) -> Vec<FormNode> {
        items
            .iter()
            .enumerate()
            .map(|(index, item)| (self.0)(&ListScope::new(list, index), item))
            .collect()
    }
}

impl fmt::Debug for ItemFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ItemFactory(..)")
    }
}
