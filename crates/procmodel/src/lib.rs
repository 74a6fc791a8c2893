//! procmodel: bind Rust models to stored-procedure parameters and results.
//!
//! This is the facade crate. It re-exports the binding engine from
//! `procmodel-core`, the derives from `procmodel-macros`, and adds [`SqlLayer`]
//! for save/load/scalar calls.
//!
//! # Example
//!
//! ```ignore
//! use procmodel::prelude::*;
//!
//! #[derive(Model, Debug, Default)]
//! struct User {
//!     #[procmodel(return_value)]
//!     id: i32,
//!     #[procmodel(alias = "FullName")]
//!     name: String,
//!     #[procmodel(output(size = 4))]
//!     score: Option<i32>,
//! }
//!
//! let layer = SqlLayer::new(executor, Arc::new(ConnectionStrings::with("main", conn)?));
//! let user: User = layer.load_model("usp_GetUser", &[BoundParameter::input("Id", 7)])?;
//! ```
//!
//! Derived impls refer to `procmodel_core` by path, so add `procmodel-core`
//! next to `procmodel` in `Cargo.toml`.

pub mod layer;

pub use layer::SqlLayer;
pub use procmodel_core::{
    BoundParameter, ConnectionStrings, ConnectionsConfig, Direction, Error, FieldDef,
    FieldDescriptor, Json, Marker, Model, NativeKind, NativeType, OutputDef, OutputSpec,
    OutputValues, ProcedureExecutor, ProcedureOutcome, Result, Row, RowSet, SqlConnectionString,
    SqlDbType, SqlEnum, SqlField, TypeDescriptor, Value, apply_call_values, build_parameters,
    descriptor_for, hydrate, hydrate_one, output_parameters,
};
pub use procmodel_macros::{Model, SqlEnum};

/// Everything a typical caller needs.
pub mod prelude {
    pub use crate::layer::SqlLayer;
    pub use procmodel_core::{
        BoundParameter, ConnectionStrings, Direction, Error, Json, Model, OutputValues,
        ProcedureExecutor, ProcedureOutcome, Result, Row, RowSet, SqlConnectionString, SqlDbType,
        SqlEnum, SqlField, Value,
    };
    pub use procmodel_macros::{Model, SqlEnum};
    pub use std::sync::Arc;
}
