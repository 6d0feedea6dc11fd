/// HRDesk Error Module
///
/// This module defines the error types shared by the schema registry, the
/// query builder, the statement executor and the CRUD session.
use thiserror::Error;

/// Error type for every fallible HRDesk operation.
///
/// The variants fall into three groups:
/// - Input errors raised before any SQL reaches the database
///   (unknown table or column, missing key, invalid value, empty input)
/// - Statement errors reported by the database while executing
/// - Infrastructure errors (opening the database, configuration, I/O)
#[derive(Error, Debug)]
pub enum HrdeskError {
    /// The table name is not part of the schema registry
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// A form value names a column the table does not declare
    #[error("Unknown column '{column}' for table {table}")]
    UnknownColumn { table: String, column: String },

    /// Update or delete attempted without the key column populated
    #[error("Missing value for primary key column '{column}' of table {table}")]
    MissingPrimaryKey { table: String, column: String },

    /// A raw form value does not fit the column's declared type
    #[error("Invalid value '{value}' for column {column} ({declared_type}): {reason}")]
    InvalidValue {
        column: String,
        declared_type: String,
        value: String,
        reason: String,
    },

    /// No table has been selected for a form operation
    #[error("Please select a table.")]
    EmptyInput,

    /// Ad-hoc statement text was blank
    #[error("Query cannot be empty")]
    EmptyQuery,

    /// The database rejected a statement; the transaction was rolled back
    #[error("{0}")]
    Statement(String),

    /// Errors opening or preparing the underlying SQLite connection
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Shell command parsing errors
    #[error("Command error: {0}")]
    Command(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON export errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HrdeskError {
    /// Returns true for errors detected before any statement was sent.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            HrdeskError::UnknownTable(_)
                | HrdeskError::UnknownColumn { .. }
                | HrdeskError::MissingPrimaryKey { .. }
                | HrdeskError::InvalidValue { .. }
                | HrdeskError::EmptyInput
                | HrdeskError::EmptyQuery
        )
    }
}

/// Type alias for Result to use HrdeskError as the error type.
pub type Result<T> = std::result::Result<T, HrdeskError>;
