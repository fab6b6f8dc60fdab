//! Database connection traits.
//!
//! - [`Connection`] - executing statements and opening transactions
//! - [`TransactionOps`] - statements inside a transaction and commit
//!
//! The harness is single-threaded and single-shot, so every call is
//! synchronous and returns a plain [`Result`].

use crate::error::Result;
use crate::row::Row;
use crate::value::Value;

/// A database connection capable of executing statements.
pub trait Connection {
    /// Transaction type borrowed from this connection.
    type Tx<'conn>: TransactionOps
    where
        Self: 'conn;

    /// Execute a query and return all rows.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Execute a query and return the first row, if any.
    fn query_one(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        Ok(self.query(sql, params)?.into_iter().next())
    }

    /// Execute a statement and return the number of rows affected.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Execute an INSERT and return the assigned surrogate key.
    fn insert(&self, sql: &str, params: &[Value]) -> Result<i64>;

    /// Execute one or more statements without parameters (DDL, pragmas).
    fn execute_raw(&self, sql: &str) -> Result<()>;

    /// Begin a transaction.
    fn begin(&self) -> Result<Self::Tx<'_>>;
}

/// Operations available within a transaction.
///
/// Dropping a transaction without committing rolls it back.
pub trait TransactionOps {
    /// Execute a statement within this transaction.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Execute an INSERT within this transaction and return the new key.
    fn insert(&self, sql: &str, params: &[Value]) -> Result<i64>;

    /// Commit the transaction.
    fn commit(self) -> Result<()>;
}
