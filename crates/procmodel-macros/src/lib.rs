//! Procedural macros for procmodel.
//!
//! - `#[derive(Model)]` implements `procmodel_core::Model` from the struct's
//!   fields and their `#[procmodel(...)]` markers.
//! - `#[derive(SqlEnum)]` lets a fieldless enum be a model field, stored as its
//!   integer discriminant.
//!
//! Generated code refers to `procmodel_core` by path, so crates using the
//! derives depend on `procmodel-core` (the `procmodel` facade re-exports
//! everything else).
//!
//! # Field markers
//!
//! ```ignore
//! #[derive(Model, Debug, Default)]
//! struct Order {
//!     #[procmodel(return_value)]
//!     id: i32,
//!     #[procmodel(alias = "CustomerName, Customer")]
//!     customer: String,
//!     #[procmodel(output(db_type = "Decimal", scale = 2, precision = 10))]
//!     total: Option<rust_decimal::Decimal>,
//!     #[procmodel(output(size = 64, alias = "StatusText"))]
//!     status: String,
//!     #[procmodel(ignore)]
//!     dirty: bool,
//! }
//! ```
//!
//! A field may carry several markers; exactly one takes effect, by precedence
//! `ignore` > `output` > `return_value` > `alias`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod enum_derive;
mod model_derive;

/// Derive `procmodel_core::Model`.
#[proc_macro_derive(Model, attributes(procmodel))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match model_derive::parse_model(&input) {
        Ok(def) => model_derive::generate_model_impl(&def).into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Derive `procmodel_core::SqlEnum` and `procmodel_core::SqlField` for a
/// fieldless enum. The enum must also be `Copy`.
#[proc_macro_derive(SqlEnum)]
pub fn derive_sql_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match enum_derive::parse_enum(&input) {
        Ok(def) => enum_derive::generate_enum_impl(&def).into(),
        Err(err) => err.to_compile_error().into(),
    }
}
