//! Core types and traits for procmodel.
//!
//! `procmodel-core` is the binding engine between model structs and stored
//! procedure calls. It defines the traits and data types the derive macros
//! and the `procmodel` facade build on.
//!
//! # Role In The Architecture
//!
//! - **Contract layer**: `Model` is implemented by user models (normally through
//!   `#[derive(Model)]`); `ProcedureExecutor` is implemented by whatever actually
//!   talks to the database.
//! - **Binding engine**: `TypeDescriptor` resolves each field's markers once per
//!   type, `build_parameters` turns a model into `BoundParameter`s and `hydrate`
//!   turns rows plus output/return values back into models.
//! - **Data model**: `Value`, `Row`, `SqlDbType` and `NativeType` describe raw
//!   database values and the type mapping between Rust and SQL Server.
//! - **Connections**: `ConnectionStrings` and `SqlConnectionString` hold the
//!   connection strings handed to the executor.
//!
//! # Who Uses This Crate
//!
//! - `procmodel-macros` generates `Model` and `SqlEnum` implementations defined here.
//! - `procmodel` wraps the engine in `SqlLayer` for save/load/scalar calls.
//! - Executor implementations consume `BoundParameter` and produce `ProcedureOutcome`.
//!
//! Most applications should use the `procmodel` facade; reach for
//! `procmodel-core` directly when writing an executor or a hand-written `Model`.

pub mod coerce;
pub mod connection;
pub mod descriptor;
pub mod error;
pub mod executor;
pub mod field;
pub mod hydrate;
pub mod model;
pub mod params;
pub mod row;
pub mod types;
pub mod value;

pub use coerce::{Json, SqlField};
pub use connection::{ConnectionStrings, ConnectionsConfig, SqlConnectionString};
pub use descriptor::{TypeDescriptor, descriptor_for};
pub use error::{Error, Result};
pub use executor::{OutputValues, ProcedureExecutor, ProcedureOutcome};
pub use field::{AliasEntry, FieldDef, FieldDescriptor, Marker, OutputDef, OutputSpec};
pub use hydrate::{apply_call_values, hydrate, hydrate_one};
pub use model::Model;
pub use params::{BoundParameter, Direction, build_parameters, output_parameters};
pub use row::{Row, RowSet};
pub use types::{NativeKind, NativeType, SqlDbType, SqlEnum};
pub use value::Value;
