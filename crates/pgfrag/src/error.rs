//! Error types for pgfrag

use crate::fragment::Placeholder;
use std::fmt;
use thiserror::Error;

/// Result type alias for pgfrag operations
pub type DbResult<T> = Result<T, DbError>;

/// A failure reported by the PostgreSQL server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseError {
    /// SQLSTATE code (e.g. `42P07`).
    pub code: String,
    /// Primary human-readable message.
    pub message: String,
    /// Optional secondary detail.
    pub detail: Option<String>,
}

impl DatabaseError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (SQLSTATE {})", self.message, self.code)?;
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

/// Error types for statement building and execution
#[derive(Debug, Error)]
pub enum DbError {
    /// Placeholder count differs from parameter count
    #[error(
        "Parameter mismatch: query has {placeholders} placeholder(s) but {parameters} parameter(s) were given"
    )]
    PlaceholderMismatch {
        placeholders: usize,
        parameters: usize,
    },

    /// A parameter does not fit the placeholder at its position
    #[error("Wrong parameter type at position {position}: {placeholder} expects {}, got {found}", .placeholder.expects())]
    PlaceholderType {
        position: usize,
        placeholder: Placeholder,
        found: &'static str,
    },

    /// Malformed identifier definition
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Clause value with a shape the clause does not accept
    #[error("Invalid clause: {0}")]
    InvalidClause(String),

    #[error("Duplicate column: {0}")]
    DuplicateColumn(DatabaseError),

    #[error("Duplicate function: {0}")]
    DuplicateFunction(DatabaseError),

    #[error("Duplicate record: {0}")]
    DuplicateRecord(DatabaseError),

    #[error("Duplicate schema: {0}")]
    DuplicateSchema(DatabaseError),

    #[error("Duplicate table: {0}")]
    DuplicateTable(DatabaseError),

    #[error("Unknown column: {0}")]
    UnknownColumn(DatabaseError),

    #[error("Unknown function: {0}")]
    UnknownFunction(DatabaseError),

    #[error("Unknown table: {0}")]
    UnknownTable(DatabaseError),

    /// Server rejected the bound parameters
    #[error("Parameter mismatch: {0}")]
    ParameterMismatch(DatabaseError),

    #[error("Syntax error: {0}")]
    SyntaxError(DatabaseError),

    #[error("Invalid table definition: {0}")]
    InvalidTableDefinition(DatabaseError),

    /// Any other server error
    #[error("Database error: {0}")]
    Database(DatabaseError),

    /// Driver failure without a server error (I/O, closed connection, ...)
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Connection or session setup failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// Column decode error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),
}

impl DbError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create an invalid clause error
    pub fn invalid_clause(message: impl Into<String>) -> Self {
        Self::InvalidClause(message.into())
    }

    /// Create an invalid identifier error
    pub fn invalid_identifier(message: impl Into<String>) -> Self {
        Self::InvalidIdentifier(message.into())
    }

    /// Map a server error onto the taxonomy by its SQLSTATE code.
    pub fn from_database_error(err: DatabaseError) -> Self {
        match err.code.as_str() {
            "42701" => Self::DuplicateColumn(err),
            "42723" => Self::DuplicateFunction(err),
            "23505" => Self::DuplicateRecord(err),
            "42P06" => Self::DuplicateSchema(err),
            "42P07" => Self::DuplicateTable(err),
            "42703" => Self::UnknownColumn(err),
            "42883" => Self::UnknownFunction(err),
            "42P01" => Self::UnknownTable(err),
            "08P01" | "42P02" => Self::ParameterMismatch(err),
            "42601" => Self::SyntaxError(err),
            "42P16" => Self::InvalidTableDefinition(err),
            _ => Self::Database(err),
        }
    }

    /// Parse a tokio_postgres error into a more specific DbError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let mut mapped = DatabaseError::new(db_err.code().code(), db_err.message());
            if let Some(detail) = db_err.detail() {
                mapped = mapped.with_detail(detail);
            }
            return Self::from_database_error(mapped);
        }
        Self::Query(err)
    }

    /// The server error behind this error, if any.
    pub fn database_error(&self) -> Option<&DatabaseError> {
        match self {
            Self::DuplicateColumn(e)
            | Self::DuplicateFunction(e)
            | Self::DuplicateRecord(e)
            | Self::DuplicateSchema(e)
            | Self::DuplicateTable(e)
            | Self::UnknownColumn(e)
            | Self::UnknownFunction(e)
            | Self::UnknownTable(e)
            | Self::ParameterMismatch(e)
            | Self::SyntaxError(e)
            | Self::InvalidTableDefinition(e)
            | Self::Database(e) => Some(e),
            _ => None,
        }
    }

    /// SQLSTATE code of the server error, if any.
    pub fn code(&self) -> Option<&str> {
        self.database_error().map(|e| e.code.as_str())
    }

    /// Whether this error was raised while building a statement (before any I/O).
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            Self::PlaceholderMismatch { .. }
                | Self::PlaceholderType { .. }
                | Self::InvalidIdentifier(_)
                | Self::InvalidClause(_)
        )
    }

    /// Check if this is a duplicate record (unique violation) error
    pub fn is_duplicate_record(&self) -> bool {
        matches!(self, Self::DuplicateRecord(_))
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for DbError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
