//! SQLite connection implementation.
//!
//! Safe wrappers around SQLite's C API implementing the `Connection` trait
//! from fanout-core. The harness keeps its store alive in a shared-cache
//! in-memory database: every connection opened with the same
//! [`SqliteConfig::shared_memory`] name sees the same tables, and the data
//! disappears when the last such connection closes.

// Allow casts in FFI code where we need to match C types exactly
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::result_large_err)]
#![allow(clippy::borrow_as_ptr)]

use crate::ffi;
use crate::types;
use fanout_core::{
    Connection, ConnectionError, ConnectionErrorKind, ConstraintKind, ConstraintViolation, Error,
    QueryError, QueryErrorKind, Row, TransactionError, TransactionOps, Value, row::ColumnInfo,
};
use std::cell::Cell;
use std::ffi::{CStr, CString, c_int};
use std::ptr;
use std::sync::Arc;

/// Configuration for opening SQLite connections.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Path or URI of the database, or ":memory:" for a private in-memory database.
    pub path: String,
    pub flags: OpenFlags,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
    /// Run `PRAGMA foreign_keys = ON` after opening.
    pub foreign_keys: bool,
}

/// Flags controlling how the database is opened.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenFlags {
    /// Open for reading and writing.
    pub read_write: bool,
    /// Create the database if it doesn't exist.
    pub create: bool,
    /// Enable URI filename interpretation.
    pub uri: bool,
}

impl OpenFlags {
    /// Create flags for read-write access with creation if needed.
    pub fn create_read_write() -> Self {
        Self {
            read_write: true,
            create: true,
            ..Default::default()
        }
    }

    /// Interpret the path as a `file:` URI.
    pub fn with_uri(mut self) -> Self {
        self.uri = true;
        self
    }

    fn to_sqlite_flags(self) -> c_int {
        let mut flags = 0;
        if self.read_write {
            flags |= ffi::SQLITE_OPEN_READWRITE;
        }
        if self.create {
            flags |= ffi::SQLITE_OPEN_CREATE;
        }
        if self.uri {
            flags |= ffi::SQLITE_OPEN_URI;
        }
        flags
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: ":memory:".to_string(),
            flags: OpenFlags::create_read_write(),
            busy_timeout_ms: 5000,
            foreign_keys: true,
        }
    }
}

impl SqliteConfig {
    /// Create a new config for a private in-memory database.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Create a config for a named in-memory database shared by every
    /// connection opened with the same name in this process.
    ///
    /// The name is percent-encoded, so SQLite sees it verbatim whatever
    /// URI characters it contains.
    pub fn shared_memory(name: &str) -> Self {
        Self {
            path: format!("file:{}?mode=memory&cache=shared", encode_uri_path(name)),
            flags: OpenFlags::create_read_write().with_uri(),
            ..Self::default()
        }
    }
}

/// Percent-encode everything outside the URI unreserved set.
///
/// NUL is kept as is so `open` rejects it instead of SQLite truncating the
/// name at `%00`.
fn encode_uri_path(name: &str) -> String {
    let mut encoded = String::with_capacity(name.len());
    for byte in name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | 0 => {
                encoded.push(char::from(byte));
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

/// A connection to a SQLite database.
///
/// The handle is owned by one thread; the harness never shares it.
pub struct SqliteConnection {
    db: *mut ffi::sqlite3,
    path: String,
    in_transaction: Cell<bool>,
}

impl SqliteConnection {
    /// Open a new SQLite connection with the given configuration.
    pub fn open(config: &SqliteConfig) -> Result<Self, Error> {
        let c_path = CString::new(config.path.as_str()).map_err(|_| {
            Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Connect,
                message: "Invalid path: contains null byte".to_string(),
                source: None,
            })
        })?;

        let mut db: *mut ffi::sqlite3 = ptr::null_mut();
        let flags = config.flags.to_sqlite_flags();

        // SAFETY: We pass valid pointers and check the return value
        let rc = unsafe { ffi::sqlite3_open_v2(c_path.as_ptr(), &mut db, flags, ptr::null()) };

        if rc != ffi::SQLITE_OK {
            let msg = if db.is_null() {
                ffi::error_string(rc).to_string()
            } else {
                // SAFETY: db is valid until closed below
                unsafe {
                    let msg = errmsg(db);
                    ffi::sqlite3_close_v2(db);
                    msg
                }
            };

            return Err(Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Connect,
                message: format!("Failed to open database '{}': {}", config.path, msg),
                source: None,
            }));
        }

        if config.busy_timeout_ms > 0 {
            // SAFETY: db is valid
            unsafe {
                ffi::sqlite3_busy_timeout(db, config.busy_timeout_ms as c_int);
            }
        }

        let conn = Self {
            db,
            path: config.path.clone(),
            in_transaction: Cell::new(false),
        };

        if config.foreign_keys {
            conn.execute_raw("PRAGMA foreign_keys = ON")
                .map_err(|e| {
                    Error::Connection(ConnectionError {
                        kind: ConnectionErrorKind::Connect,
                        message: format!("Failed to enable foreign keys: {e}"),
                        source: None,
                    })
                })?;
        }

        tracing::debug!(path = %conn.path, "opened sqlite connection");
        Ok(conn)
    }

    /// Open a private in-memory database.
    pub fn open_memory() -> Result<Self, Error> {
        Self::open(&SqliteConfig::memory())
    }

    /// Open (or attach to) a named shared-cache in-memory database.
    pub fn open_shared_memory(name: &str) -> Result<Self, Error> {
        Self::open(&SqliteConfig::shared_memory(name))
    }

    /// Get the last insert rowid.
    pub fn last_insert_rowid(&self) -> i64 {
        // SAFETY: db is valid for the lifetime of self
        unsafe { ffi::sqlite3_last_insert_rowid(self.db) }
    }

    /// Get the number of rows changed by the last statement.
    pub fn changes(&self) -> i32 {
        // SAFETY: db is valid for the lifetime of self
        unsafe { ffi::sqlite3_changes(self.db) }
    }

    /// Run a query and return its column names along with the rows.
    ///
    /// The names are available even when the statement yields no rows.
    pub fn query_with_columns(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<(Vec<String>, Vec<Row>), Error> {
        let (columns, rows) = self.run_with_columns(sql, params)?;
        Ok((columns.names().to_vec(), rows))
    }

    fn run(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, Error> {
        self.run_with_columns(sql, params).map(|(_, rows)| rows)
    }

    /// Prepare, bind and run a statement, collecting every result row.
    fn run_with_columns(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<(Arc<ColumnInfo>, Vec<Row>), Error> {
        tracing::trace!(sql, params = params.len(), "sqlite statement");
        let stmt = Statement::prepare(self.db, sql)?;

        for (i, param) in params.iter().enumerate() {
            // SAFETY: stmt is valid, index is 1-based
            let rc = unsafe { types::bind_value(stmt.raw, (i + 1) as c_int, param) };
            if rc != ffi::SQLITE_OK {
                return Err(bind_error(self.db, sql, i + 1));
            }
        }

        // SAFETY: stmt is valid
        let col_count = unsafe { ffi::sqlite3_column_count(stmt.raw) };
        let col_names = (0..col_count)
            .map(|i| {
                // SAFETY: stmt is valid, i is in range
                unsafe { types::column_name(stmt.raw, i) }.unwrap_or_else(|| format!("col{i}"))
            })
            .collect();
        let columns = Arc::new(ColumnInfo::new(col_names));

        let mut rows = Vec::new();
        loop {
            // SAFETY: stmt is valid
            let rc = unsafe { ffi::sqlite3_step(stmt.raw) };
            match rc {
                ffi::SQLITE_ROW => {
                    let values = (0..col_count)
                        // SAFETY: stmt is valid, we just got SQLITE_ROW
                        .map(|i| unsafe { types::read_column(stmt.raw, i) })
                        .collect();
                    rows.push(Row::with_columns(Arc::clone(&columns), values));
                }
                ffi::SQLITE_DONE => break,
                _ => return Err(step_error(self.db, sql)),
            }
        }

        Ok((columns, rows))
    }

    fn begin_immediate(&self) -> Result<(), Error> {
        if self.in_transaction.get() {
            return Err(Error::Transaction(TransactionError {
                message: "Already in a transaction".to_string(),
            }));
        }
        self.execute_raw("BEGIN IMMEDIATE")?;
        self.in_transaction.set(true);
        tracing::trace!("BEGIN");
        Ok(())
    }

    fn finish(&self, sql: &'static str) -> Result<(), Error> {
        if !self.in_transaction.get() {
            return Err(Error::Transaction(TransactionError {
                message: "Not in a transaction".to_string(),
            }));
        }
        self.execute_raw(sql)?;
        self.in_transaction.set(false);
        tracing::trace!("{sql}");
        Ok(())
    }
}

impl Drop for SqliteConnection {
    fn drop(&mut self) {
        if !self.db.is_null() {
            // SAFETY: db is valid and no statements outlive the connection
            unsafe {
                ffi::sqlite3_close_v2(self.db);
            }
        }
    }
}

impl Connection for SqliteConnection {
    type Tx<'conn>
        = SqliteTransaction<'conn>
    where
        Self: 'conn;

    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, Error> {
        self.run(sql, params)
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, Error> {
        self.run(sql, params)?;
        Ok(u64::try_from(self.changes()).unwrap_or(0))
    }

    fn insert(&self, sql: &str, params: &[Value]) -> Result<i64, Error> {
        self.run(sql, params)?;
        Ok(self.last_insert_rowid())
    }

    fn execute_raw(&self, sql: &str) -> Result<(), Error> {
        let c_sql = CString::new(sql).map_err(|_| {
            Error::Query(QueryError {
                kind: QueryErrorKind::Syntax,
                sql: Some(sql.to_string()),
                message: "SQL contains null byte".to_string(),
            })
        })?;

        let mut errmsg: *mut std::ffi::c_char = ptr::null_mut();

        // SAFETY: All pointers are valid
        let rc = unsafe {
            ffi::sqlite3_exec(self.db, c_sql.as_ptr(), None, ptr::null_mut(), &mut errmsg)
        };

        if rc != ffi::SQLITE_OK {
            let msg = if errmsg.is_null() {
                ffi::error_string(rc).to_string()
            } else {
                // SAFETY: errmsg was allocated by sqlite3_exec and is freed once
                unsafe {
                    let msg = CStr::from_ptr(errmsg).to_string_lossy().into_owned();
                    ffi::sqlite3_free(errmsg.cast());
                    msg
                }
            };
            // SAFETY: db is valid
            let extended = unsafe { ffi::sqlite3_extended_errcode(self.db) };
            return Err(classify(rc, extended, sql, msg));
        }

        Ok(())
    }

    fn begin(&self) -> Result<Self::Tx<'_>, Error> {
        self.begin_immediate()?;
        Ok(SqliteTransaction::new(self))
    }
}

/// A SQLite transaction.
///
/// Dropping it without calling `commit` rolls back.
pub struct SqliteTransaction<'conn> {
    conn: &'conn SqliteConnection,
    finished: bool,
}

impl<'conn> SqliteTransaction<'conn> {
    fn new(conn: &'conn SqliteConnection) -> Self {
        Self {
            conn,
            finished: false,
        }
    }
}

impl Drop for SqliteTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.conn.finish("ROLLBACK") {
                tracing::warn!(error = %e, "rollback on drop failed");
            }
        }
    }
}

impl TransactionOps for SqliteTransaction<'_> {
    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, Error> {
        self.conn.execute(sql, params)
    }

    fn insert(&self, sql: &str, params: &[Value]) -> Result<i64, Error> {
        self.conn.insert(sql, params)
    }

    /// Commit. A failed `COMMIT` leaves the transaction open, so it is
    /// rolled back when `self` drops.
    fn commit(mut self) -> Result<(), Error> {
        self.conn.finish("COMMIT")?;
        self.finished = true;
        Ok(())
    }
}

/// A prepared statement, finalized on drop.
struct Statement {
    raw: *mut ffi::sqlite3_stmt,
}

impl Statement {
    fn prepare(db: *mut ffi::sqlite3, sql: &str) -> Result<Self, Error> {
        let c_sql = CString::new(sql).map_err(|_| {
            Error::Query(QueryError {
                kind: QueryErrorKind::Syntax,
                sql: Some(sql.to_string()),
                message: "SQL contains null byte".to_string(),
            })
        })?;

        let mut raw: *mut ffi::sqlite3_stmt = ptr::null_mut();

        // SAFETY: All pointers are valid
        let rc = unsafe {
            ffi::sqlite3_prepare_v2(
                db,
                c_sql.as_ptr(),
                c_sql.as_bytes().len() as c_int,
                &mut raw,
                ptr::null_mut(),
            )
        };

        if rc != ffi::SQLITE_OK {
            return Err(step_error(db, sql));
        }
        if raw.is_null() {
            return Err(Error::Query(QueryError {
                kind: QueryErrorKind::Syntax,
                sql: Some(sql.to_string()),
                message: "empty statement".to_string(),
            }));
        }

        Ok(Self { raw })
    }
}

impl Drop for Statement {
    fn drop(&mut self) {
        // SAFETY: raw came from sqlite3_prepare_v2 and is finalized once
        unsafe {
            ffi::sqlite3_finalize(self.raw);
        }
    }
}

// Helper functions

/// # Safety
/// `db` must be a valid connection handle.
unsafe fn errmsg(db: *mut ffi::sqlite3) -> String {
    // SAFETY: guaranteed by the caller
    unsafe { CStr::from_ptr(ffi::sqlite3_errmsg(db)).to_string_lossy().into_owned() }
}

fn bind_error(db: *mut ffi::sqlite3, sql: &str, param_index: usize) -> Error {
    // SAFETY: db is valid
    let msg = unsafe { errmsg(db) };

    Error::Query(QueryError {
        kind: QueryErrorKind::Database,
        sql: Some(sql.to_string()),
        message: format!("Failed to bind parameter {param_index}: {msg}"),
    })
}

fn step_error(db: *mut ffi::sqlite3, sql: &str) -> Error {
    // SAFETY: db is valid
    let (msg, code, extended) = unsafe {
        (
            errmsg(db),
            ffi::sqlite3_errcode(db),
            ffi::sqlite3_extended_errcode(db),
        )
    };
    classify(code, extended, sql, msg)
}

/// Map an SQLite result code to the error taxonomy.
fn classify(code: c_int, extended: c_int, sql: &str, message: String) -> Error {
    if code & 0xff == ffi::SQLITE_CONSTRAINT {
        let kind = match extended {
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => ConstraintKind::ForeignKey,
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                ConstraintKind::Unique
            }
            ffi::SQLITE_CONSTRAINT_NOTNULL => ConstraintKind::NotNull,
            _ => ConstraintKind::Other,
        };
        return Error::Constraint(ConstraintViolation {
            kind,
            table: None,
            sql: Some(sql.to_string()),
            message,
        });
    }

    let kind = match code & 0xff {
        ffi::SQLITE_BUSY | ffi::SQLITE_LOCKED => QueryErrorKind::Busy,
        ffi::SQLITE_ERROR if message.starts_with("no such") => QueryErrorKind::NotFound,
        ffi::SQLITE_ERROR if message.contains("syntax error") => QueryErrorKind::Syntax,
        _ => QueryErrorKind::Database,
    };
    Error::Query(QueryError {
        kind,
        sql: Some(sql.to_string()),
        message,
    })
}
