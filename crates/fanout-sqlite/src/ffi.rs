//! Low-level bindings to libsqlite3.
//!
//! Re-exports the subset of `libsqlite3-sys` the driver uses, plus a few
//! safe helpers around static library strings.

#![allow(non_camel_case_types)]

use std::ffi::{CStr, c_int};

pub use libsqlite3_sys::{
    // Handles
    sqlite3,
    sqlite3_stmt,
    // Result codes
    SQLITE_BUSY,
    SQLITE_CONSTRAINT,
    SQLITE_CONSTRAINT_FOREIGNKEY,
    SQLITE_CONSTRAINT_NOTNULL,
    SQLITE_CONSTRAINT_PRIMARYKEY,
    SQLITE_CONSTRAINT_UNIQUE,
    SQLITE_DONE,
    SQLITE_ERROR,
    SQLITE_LOCKED,
    SQLITE_OK,
    SQLITE_ROW,
    // Open flags
    SQLITE_OPEN_CREATE,
    SQLITE_OPEN_READWRITE,
    SQLITE_OPEN_URI,
    // Fundamental data types
    SQLITE_BLOB,
    SQLITE_FLOAT,
    SQLITE_INTEGER,
    SQLITE_NULL,
    SQLITE_TEXT,
    // Destructor sentinel
    SQLITE_TRANSIENT,
    // Connection management
    sqlite3_busy_timeout,
    sqlite3_changes,
    sqlite3_errcode,
    sqlite3_errmsg,
    sqlite3_errstr,
    sqlite3_exec,
    sqlite3_extended_errcode,
    sqlite3_free,
    sqlite3_last_insert_rowid,
    sqlite3_libversion,
    sqlite3_libversion_number,
    sqlite3_open_v2,
    // Statements
    sqlite3_bind_blob,
    sqlite3_bind_double,
    sqlite3_bind_int64,
    sqlite3_bind_null,
    sqlite3_bind_text,
    sqlite3_column_blob,
    sqlite3_column_bytes,
    sqlite3_column_count,
    sqlite3_column_double,
    sqlite3_column_int64,
    sqlite3_column_name,
    sqlite3_column_text,
    sqlite3_column_type,
    sqlite3_finalize,
    sqlite3_prepare_v2,
    sqlite3_step,
};

// `libsqlite3-sys` does not export `sqlite3_close_v2` in its bundled
// bindings; the symbol is still compiled into the bundled amalgamation.
unsafe extern "C" {
    pub fn sqlite3_close_v2(db: *mut sqlite3) -> c_int;
}

/// Get the SQLite library version as a string.
pub fn version() -> &'static str {
    // SAFETY: sqlite3_libversion returns a static string
    unsafe {
        let ptr = sqlite3_libversion();
        CStr::from_ptr(ptr).to_str().unwrap_or("unknown")
    }
}

/// Get the SQLite library version as a number.
pub fn version_number() -> i32 {
    // SAFETY: sqlite3_libversion_number is always safe to call
    unsafe { sqlite3_libversion_number() }
}

/// Convert an SQLite result code to a human-readable string.
pub fn error_string(code: c_int) -> &'static str {
    // SAFETY: sqlite3_errstr returns a static string
    unsafe {
        let ptr = sqlite3_errstr(code);
        CStr::from_ptr(ptr).to_str().unwrap_or("unknown error")
    }
}
