//! Declarative form state and validation.
//!
//! A form is described once as an immutable [`FormTree`](node::FormTree) of
//! field descriptors, layout containers, conditional branches and dynamic
//! lists. At runtime a [`FormState`](state::FormState) store owns every value
//! and validation result, conditional branches follow the store through
//! [`ConditionalEvaluator`](conditional::ConditionalEvaluator)s, and
//! [`Form`](form::Form) coordinates validation and submission.
//!
//! Rendering is left to the host: renderers walk the tree and read and write
//! through the [`FormContext`](context::FormContext) they are handed.

pub mod conditional;
pub mod config;
pub mod context;
pub mod debounce;
pub mod error;
pub mod events;
pub mod field;
pub mod form;
pub mod node;
pub mod state;
pub mod validation;
pub mod value;

pub use error::FormError;
pub use form::{Form, SubmitOutcome};

pub mod prelude {
    pub use crate::conditional::ConditionalEvaluator;
    pub use crate::config::{FormBehavior, ValidatorConfig};
    pub use crate::context::FormContext;
    pub use crate::error::FormError;
    pub use crate::events::{FieldValidated, Subscription, SubscriptionId};
    pub use crate::field::{FieldDescriptor, FieldKind};
    pub use crate::form::{Form, SubmitOutcome};
    pub use crate::node::{Align, CardStyle, FormNode, FormTree, ListScope, WalkScope};
    pub use crate::state::FormState;
    pub use crate::validation::{
        Custom, Email, MaxLength, MinLength, NumberRange, Pattern, Required, ValidationError,
        ValidationResult, ValidationRule, Validator,
    };
    pub use crate::value::{FieldValue, FormValues};

    pub use crate::form;
}
