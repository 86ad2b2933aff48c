//! Form tree nodes.
//!
//! A form definition is a tree of [`FormNode`]s: field leaves, layout
//! containers, conditional branches, dynamic lists and inert display nodes.
//! The node set is closed; renderers and tree walks dispatch on it with an
//! exhaustive `match`.

mod layout;
mod list;
mod tree;

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

pub use layout::{Align, CardStyle, DEFAULT_SPACING};
pub use list::{ItemFactory, ListScope};
pub use tree::{FormTree, WalkScope};

use crate::field::FieldDescriptor;
use crate::value::FormValues;

/// Visibility predicate of a conditional branch.
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&FormValues) -> bool + Send + Sync>);

impl Predicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&FormValues) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Evaluate against a full value map.
    pub fn eval(&self, values: &FormValues) -> bool {
        (self.0)(values)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

fn generated_key() -> String {
    format!("__node_{}", Uuid::new_v4().simple())
}

/// A node in the form tree.
///
/// Every node has a stable key for diffing. Field nodes are keyed by their
/// field id; other nodes get a generated key unless one is set with
/// [`FormNode::key`]. Keys of non-field nodes carry no form state.
#[derive(Debug, Clone)]
pub enum FormNode {
    /// Interactive input
    Field(FieldDescriptor),

    /// Horizontal container
    Row {
        key: String,
        children: Vec<FormNode>,
        spacing: u16,
        align: Align,
    },

    /// Vertical container
    Column {
        key: String,
        children: Vec<FormNode>,
        spacing: u16,
        align: Align,
    },

    /// Titled group of children
    Section {
        key: String,
        title: Option<String>,
        children: Vec<FormNode>,
    },

    /// Boxed group of children
    Card {
        key: String,
        title: Option<String>,
        subtitle: Option<String>,
        children: Vec<FormNode>,
        style: CardStyle,
    },

    /// Children shown only while the predicate holds
    Conditional {
        key: String,
        predicate: Predicate,
        children: Vec<FormNode>,
    },

    /// One generated subtree per item. `children` is generated by `factory`
    /// when the node is built, so keys inside items stay stable.
    List {
        key: String,
        items: Vec<String>,
        factory: ItemFactory,
        children: Vec<FormNode>,
    },

    /// Empty space
    Spacer { key: String, size: Option<u16> },

    /// Horizontal rule
    Divider { key: String },

    /// Read-only text
    StaticText { key: String, content: String },
}

impl FormNode {
    /// Create a field leaf
    pub fn field(descriptor: FieldDescriptor) -> Self {
        Self::Field(descriptor)
    }

    /// Create a row
    pub fn row(children: Vec<FormNode>) -> Self {
        Self::Row {
            key: generated_key(),
            children,
            spacing: DEFAULT_SPACING,
            align: Align::default(),
        }
    }

    /// Create a column
    pub fn column(children: Vec<FormNode>) -> Self {
        Self::Column {
            key: generated_key(),
            children,
            spacing: DEFAULT_SPACING,
            align: Align::default(),
        }
    }

    /// Create an untitled section
    pub fn section(children: Vec<FormNode>) -> Self {
        Self::Section {
            key: generated_key(),
            title: None,
            children,
        }
    }

    /// Create a plain card
    pub fn card(children: Vec<FormNode>) -> Self {
        Self::Card {
            key: generated_key(),
            title: None,
            subtitle: None,
            children,
            style: CardStyle::default(),
        }
    }

    /// Create a conditional branch, active while `predicate` returns true.
    pub fn when<F>(predicate: F, children: Vec<FormNode>) -> Self
    where
        F: Fn(&FormValues) -> bool + Send + Sync + 'static,
    {
        Self::Conditional {
            key: generated_key(),
            predicate: Predicate::new(predicate),
            children,
        }
    }

    /// Create a dynamic list. `key` also qualifies the generated field ids.
    pub fn list<I, S, F>(key: impl Into<String>, items: I, factory: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&ListScope, &str) -> FormNode + Send + Sync + 'static,
    {
        let key = key.into();
        let items: Vec<String> = items.into_iter().map(Into::into).collect();
        let factory = ItemFactory::new(factory);
        let children = factory.build(&key, &items);
        Self::List {
            key,
            items,
            factory,
            children,
        }
    }

    /// Replace the items of a list, regenerating its children.
    pub fn with_items<I, S>(mut self, new_items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Self::List {
            key,
            items,
            factory,
            children,
        } = &mut self
        {
            *items = new_items.into_iter().map(Into::into).collect();
            *children = factory.build(key, items);
        }
        self
    }

    pub fn spacer() -> Self {
        Self::Spacer {
            key: generated_key(),
            size: None,
        }
    }

    pub fn divider() -> Self {
        Self::Divider {
            key: generated_key(),
        }
    }

    /// Create a static text node
    pub fn text(content: impl Into<String>) -> Self {
        Self::StaticText {
            key: generated_key(),
            content: content.into(),
        }
    }

    // -------------------------------------------------------------------------
    // Modifiers (no-ops on variants without the property)
    // -------------------------------------------------------------------------

    /// Set an explicit key. Ignored for fields (keyed by id) and lists
    /// (keyed at construction, since the key qualifies their field ids).
    pub fn key(mut self, new_key: impl Into<String>) -> Self {
        if let Some(key) = self.key_mut() {
            *key = new_key.into();
        }
        self
    }

    /// Gap between children of a row or column.
    pub fn spacing(mut self, gap: u16) -> Self {
        if let Self::Row { spacing, .. } | Self::Column { spacing, .. } = &mut self {
            *spacing = gap;
        }
        self
    }

    /// Cross-axis alignment of a row or column.
    pub fn align(mut self, value: Align) -> Self {
        if let Self::Row { align, .. } | Self::Column { align, .. } = &mut self {
            *align = value;
        }
        self
    }

    /// Title of a section or card.
    pub fn title(mut self, text: impl Into<String>) -> Self {
        if let Self::Section { title, .. } | Self::Card { title, .. } = &mut self {
            *title = Some(text.into());
        }
        self
    }

    /// Subtitle of a card.
    pub fn subtitle(mut self, text: impl Into<String>) -> Self {
        if let Self::Card { subtitle, .. } = &mut self {
            *subtitle = Some(text.into());
        }
        self
    }

    /// Visual style of a card.
    pub fn style(mut self, value: CardStyle) -> Self {
        if let Self::Card { style, .. } = &mut self {
            *style = value;
        }
        self
    }

    /// Fixed size of a spacer.
    pub fn size(mut self, value: u16) -> Self {
        if let Self::Spacer { size, .. } = &mut self {
            *size = Some(value);
        }
        self
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    /// Stable key of this node.
    pub fn node_key(&self) -> &str {
        match self {
            Self::Field(descriptor) => descriptor.id(),
            Self::Row { key, .. }
            | Self::Column { key, .. }
            | Self::Section { key, .. }
            | Self::Card { key, .. }
            | Self::Conditional { key, .. }
            | Self::List { key, .. }
            | Self::Spacer { key, .. }
            | Self::Divider { key }
            | Self::StaticText { key, .. } => key,
        }
    }

    fn key_mut(&mut self) -> Option<&mut String> {
        match self {
            Self::Field(_) | Self::List { .. } => None,
            Self::Row { key, .. }
            | Self::Column { key, .. }
            | Self::Section { key, .. }
            | Self::Card { key, .. }
            | Self::Conditional { key, .. }
            | Self::Spacer { key, .. }
            | Self::Divider { key }
            | Self::StaticText { key, .. } => Some(key),
        }
    }

    /// Field descriptor of a field leaf.
    pub fn as_field(&self) -> Option<&FieldDescriptor> {
        match self {
            Self::Field(descriptor) => Some(descriptor),
            _ => None,
        }
    }

    /// Check if this node holds form state
    pub fn is_field(&self) -> bool {
        matches!(self, Self::Field(_))
    }

    /// Check if this node is purely presentational
    pub fn is_display(&self) -> bool {
        matches!(
            self,
            Self::Spacer { .. } | Self::Divider { .. } | Self::StaticText { .. }
        )
    }
}

impl From<FieldDescriptor> for FormNode {
    fn from(descriptor: FieldDescriptor) -> Self {
        Self::Field(descriptor)
    }
}

/// Build a [`FormTree`] from a sequence of nodes or field descriptors.
///
/// ```ignore
/// let tree = form![
///     FieldDescriptor::text("name").label("Name").required(),
///     FormNode::when(|v| v.get("subscribe").is_some_and(|s| s.bool_value()), vec![
///         FieldDescriptor::text("email").rule(Email::new()).into(),
///     ]),
/// ]?;
/// ```
#[macro_export]
macro_rules! form {
    ($($node:expr),* $(,)?) => {
        $crate::node::FormTree::new(vec![$($crate::node::FormNode::from($node)),*])
    };
}
