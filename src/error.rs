//! Common error types for the attendance engine

use thiserror::Error;

/// Common result type for rollbook operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type returned at every public operation boundary
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input (empty name, unknown status code, ...)
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Unparseable date string
    #[error("Invalid date: {0}")]
    DateParse(#[from] chrono::ParseError),

    /// Duplicate unique key (cycle name, course+student name pair)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Attendance may not be recorded ahead of the current date
    #[error("Cannot record attendance for future date {0}")]
    FutureDate(chrono::NaiveDate),

    /// Principal lacks the role required for the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Malformed entity identifier in the database
    #[error("Invalid identifier: {0}")]
    InvalidId(#[from] uuid::Error),
}
