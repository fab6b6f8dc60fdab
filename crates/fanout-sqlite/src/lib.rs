//! SQLite driver for the fanout harness.
//!
// FFI bindings require unsafe code - this is expected for database drivers
#![allow(unsafe_code)]
//!
//! This crate binds libsqlite3 (bundled) and implements the `Connection`
//! trait from fanout-core.
//!
//! # Features
//!
//! - Synchronous `Connection` / `TransactionOps` implementation
//! - Named shared-cache in-memory databases reachable from many connections
//! - Foreign key enforcement on every connection by default
//! - Constraint failures surfaced as `Error::Constraint`
//!
//! # Example
//!
//! ```rust,ignore
//! use fanout_sqlite::SqliteConnection;
//! use fanout_core::{Connection, Value};
//!
//! let conn = SqliteConnection::open_shared_memory("InMemorySample")?;
//! conn.execute_raw("CREATE TABLE users (user_id INTEGER PRIMARY KEY, user_name TEXT)")?;
//! let id = conn.insert("INSERT INTO users (user_name) VALUES (?1)", &["User 1".into()])?;
//!
//! // A second connection sees the same tables while the first stays open.
//! let observer = SqliteConnection::open_shared_memory("InMemorySample")?;
//! let rows = observer.query("SELECT * FROM users WHERE user_id = ?1", &[Value::BigInt(id)])?;
//! ```
//!
//! # Type Mapping
//!
//! | `Value` | SQLite Type |
//! |-----------|-------------|
//! | `BigInt` | INTEGER |
//! | `Double` | REAL |
//! | `Text` | TEXT |
//! | `Bytes` | BLOB |
//! | `Null` | NULL |

pub mod connection;
pub mod ffi;
pub mod types;

pub use connection::{OpenFlags, SqliteConfig, SqliteConnection, SqliteTransaction};

/// Re-export the SQLite library version.
pub fn sqlite_version() -> &'static str {
    ffi::version()
}

/// Re-export the SQLite library version number.
pub fn sqlite_version_number() -> i32 {
    ffi::version_number()
}
