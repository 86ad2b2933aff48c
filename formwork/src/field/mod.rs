//! Field descriptors.

mod descriptor;
mod kind;

pub use descriptor::FieldDescriptor;
pub use kind::FieldKind;
