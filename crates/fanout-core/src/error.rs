//! Error types for fanout operations.

use std::fmt;

/// The primary error type for all harness operations.
///
/// Every variant is fatal to a run; the binary prints it and exits.
#[derive(Debug)]
pub enum Error {
    /// The store could not be opened or reached
    Connection(ConnectionError),
    /// Schema creation conflicts with an existing table
    Schema(SchemaError),
    /// A referenced key is missing while saving
    Constraint(ConstraintViolation),
    /// Malformed fetch specification or failed statement
    Query(QueryError),
    /// Row value could not be decoded into the requested type
    Type(TypeError),
    /// Transaction misuse (double begin, commit outside a transaction)
    Transaction(TransactionError),
    /// Invalid harness configuration
    Config(ConfigError),
    /// Custom error with message
    Custom(String),
}

#[derive(Debug)]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Failed to open the database
    Connect,
}

#[derive(Debug)]
pub struct SchemaError {
    pub kind: SchemaErrorKind,
    pub table: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorKind {
    /// An existing table does not match the expected definition
    Conflict,
    /// DDL statement failed
    Ddl,
}

#[derive(Debug)]
pub struct ConstraintViolation {
    pub kind: ConstraintKind,
    pub table: Option<String>,
    pub sql: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    ForeignKey,
    Unique,
    NotNull,
    Other,
}

#[derive(Debug)]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub sql: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// The fetch specification references unknown tables, relations or columns
    Malformed,
    /// Syntax error in SQL
    Syntax,
    /// Table or column not found
    NotFound,
    /// Database busy or table locked
    Busy,
    /// Other database error
    Database,
}

#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

#[derive(Debug)]
pub struct TransactionError {
    pub message: String,
}

#[derive(Debug)]
pub struct ConfigError {
    pub key: Option<String>,
    pub message: String,
}

impl Error {
    /// Build a malformed fetch specification error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::Query(QueryError {
            kind: QueryErrorKind::Malformed,
            sql: None,
            message: message.into(),
        })
    }

    /// Build a configuration error for the given key.
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config(ConfigError {
            key: Some(key.into()),
            message: message.into(),
        })
    }

    /// Is this a foreign-key (or other constraint) violation?
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Error::Constraint(_))
    }

    /// Is this a malformed fetch specification?
    pub fn is_malformed_query(&self) -> bool {
        matches!(
            self,
            Error::Query(QueryError {
                kind: QueryErrorKind::Malformed,
                ..
            })
        )
    }

    /// Get the SQL that caused this error, if available
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Query(q) => q.sql.as_deref(),
            Error::Constraint(c) => c.sql.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Connection(e) => write!(f, "Connection error: {}", e.message),
            Error::Schema(e) => match &e.table {
                Some(table) => write!(f, "Schema error on table '{}': {}", table, e.message),
                None => write!(f, "Schema error: {}", e.message),
            },
            Error::Constraint(e) => write!(f, "Constraint violation: {}", e),
            Error::Query(e) => {
                if e.kind == QueryErrorKind::Malformed {
                    write!(f, "Malformed fetch specification: {}", e.message)
                } else {
                    write!(f, "Query error: {}", e.message)
                }
            }
            Error::Type(e) => write!(f, "Type error: {}", e),
            Error::Transaction(e) => write!(f, "Transaction error: {}", e.message),
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Connection(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{} (table '{}')", self.message, table),
            None => write!(f, "{}", self.message),
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "expected {} for column '{}', found {}",
                self.expected, col, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{}: {}", key, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        Error::Connection(err)
    }
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        Error::Schema(err)
    }
}

impl From<ConstraintViolation> for Error {
    fn from(err: ConstraintViolation) -> Self {
        Error::Constraint(err)
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Error::Query(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<TransactionError> for Error {
    fn from(err: TransactionError) -> Self {
        Error::Transaction(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

/// Result type alias for fanout operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_query_is_flagged() {
        let err = Error::malformed("unknown relation 'friends' on table 'events'");
        assert!(err.is_malformed_query());
        assert!(!err.is_constraint_violation());
        assert_eq!(
            err.to_string(),
            "Malformed fetch specification: unknown relation 'friends' on table 'events'"
        );
    }

    #[test]
    fn constraint_violation_display_and_sql() {
        let err = Error::Constraint(ConstraintViolation {
            kind: ConstraintKind::ForeignKey,
            table: Some("participants".to_string()),
            sql: Some("INSERT INTO participants".to_string()),
            message: "FOREIGN KEY constraint failed".to_string(),
        });
        assert!(err.is_constraint_violation());
        assert_eq!(err.sql(), Some("INSERT INTO participants"));
        assert_eq!(
            err.to_string(),
            "Constraint violation: FOREIGN KEY constraint failed (table 'participants')"
        );
    }

    #[test]
    fn config_error_names_the_key() {
        let err = Error::config("FANOUT_SPLIT_MODE", "unknown mode 'sideways'");
        assert_eq!(
            err.to_string(),
            "Configuration error: FANOUT_SPLIT_MODE: unknown mode 'sideways'"
        );
    }
}
