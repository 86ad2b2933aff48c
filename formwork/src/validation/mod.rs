//! Form validation system.
//!
//! Rules are pure functions over [`FieldValue`](crate::value::FieldValue)s.
//! The [`Validator`] composes a field's required flag, kind constraints and
//! rule list into one [`ValidationResult`].
//!
//! # Example
//!
//! ```ignore
//! use formwork::validation::{Email, MinLength, Validator};
//!
//! let email = FieldDescriptor::text("email")
//!     .required()
//!     .rule(MinLength::new(3))
//!     .rule(Email::new());
//!
//! let result = Validator::new().validate(&email, &FieldValue::text("a@b.co"));
//! assert!(result.is_valid());
//! ```

mod result;
pub mod rule;
mod validator;

pub use result::{ValidationError, ValidationResult};
pub use rule::{
    Custom, Email, MaxLength, MinLength, NumberRange, Pattern, Required, SharedRule,
    ValidationRule,
};
pub use validator::Validator;
