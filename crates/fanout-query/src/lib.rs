//! Eager fetch planning and execution for the fanout harness.
//!
//! `fanout-query` turns a declarative [`FetchSpec`] (root table, optional
//! equality filter, include chains, [`SplitMode`]) into SQL and runs it:
//!
//! - **Combined**: one statement with a `LEFT JOIN` per included
//!   relationship. Columns are aliased `<table>__<column>`; the raw rows are
//!   the cross product of every one-to-many level.
//! - **PerRelation**: one statement per relationship, each selecting the
//!   related rows `WHERE key IN (...)` the keys loaded by its parent.
//!
//! Either way the rows land in a [`RowGraph`], de-duplicated by primary key
//! and linked parent-to-child through foreign key columns. A
//! [`StatementObserver`] passed through [`Diagnostics::Armed`] sees every
//! statement as it completes.
//!
//! [`ensure_schema`] creates and verifies the catalog's tables.

pub mod diagnostics;
pub mod exec;
pub mod fetch;
pub mod graph;
pub mod plan;
pub mod schema;

#[cfg(test)]
mod test_catalog;

pub use diagnostics::{CommandExecuted, Diagnostics, StatementObserver};
pub use exec::{Fetched, StatementReport, fetch};
pub use fetch::{FetchSpec, Filter, IncludePath, SplitMode};
pub use graph::{GraphNode, RowGraph};
pub use plan::{FetchPlan, PlanNode, PlannedStatement};
pub use schema::{ColumnDescription, create_table_sql, describe_table, ensure_schema};
