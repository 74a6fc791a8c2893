//! The `Model` trait: a struct whose fields bind to procedure parameters and
//! result columns.

use std::sync::Arc;

use crate::descriptor::{TypeDescriptor, descriptor_for};
use crate::error::Result;
use crate::field::FieldDef;
use crate::params::{BoundParameter, build_parameters};
use crate::value::Value;

/// A model type.
///
/// Normally implemented with `#[derive(Model)]`; a hand-written impl is the
/// explicit registration route and must keep `fields()` in declaration order.
///
/// # Example
///
/// ```ignore
/// use procmodel::prelude::*;
///
/// #[derive(Model, Debug, Default)]
/// struct User {
///     #[procmodel(return_value)]
///     id: i32,
///     #[procmodel(alias = "FullName")]
///     name: String,
///     #[procmodel(output(size = 4))]
///     score: Option<i32>,
///     #[procmodel(ignore)]
///     cached: bool,
/// }
/// ```
pub trait Model: Default + Sized + 'static {
    /// Type name, used in diagnostics.
    const MODEL_NAME: &'static str;

    /// Declared fields, in declaration order.
    fn fields() -> &'static [FieldDef];

    /// Current value of a field.
    ///
    /// Unknown names are [`Error::UnknownField`](crate::Error::UnknownField);
    /// a payload that cannot be encoded is a conversion error.
    fn field_value(&self, field: &str) -> Result<Value>;

    /// Write a raw value into a field.
    ///
    /// Null resets the field to its default. Unknown names are
    /// [`Error::UnknownField`](crate::Error::UnknownField).
    fn set_field(&mut self, field: &str, value: Value) -> Result<()>;

    /// The cached descriptor of this type.
    fn descriptor() -> Result<Arc<TypeDescriptor>> {
        descriptor_for::<Self>()
    }

    /// Build this instance's procedure parameters.
    fn to_parameters(&self) -> Result<Vec<BoundParameter>> {
        let descriptor = Self::descriptor()?;
        build_parameters(self, &descriptor)
    }
}
