//! Core types and traits for the fanout harness.
//!
//! This crate provides the foundational abstractions shared by the driver,
//! the loader and the harness:
//!
//! - `Value` and `Row` for raw statement results
//! - `Error` with the connection / schema / constraint / query taxonomy
//! - `Connection` and `TransactionOps` for synchronous database access
//! - `TableInfo`, `FieldInfo`, `RelationshipInfo` and the `Model` trait
//!   describing the entity tables

pub mod connection;
pub mod error;
pub mod model;
pub mod row;
pub mod value;

pub use connection::{Connection, TransactionOps};
pub use error::{
    ConfigError, ConnectionError, ConnectionErrorKind, ConstraintKind, ConstraintViolation, Error,
    QueryError, QueryErrorKind, Result, SchemaError, SchemaErrorKind, TransactionError, TypeError,
};
pub use model::{
    Catalog, FieldInfo, Model, RelationshipInfo, RelationshipKind, SqlType, TableInfo,
};
pub use row::{ColumnInfo, FromValue, Row};
pub use value::Value;
