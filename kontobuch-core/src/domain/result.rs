//! Result and error types for the core library

use thiserror::Error;

use crate::statement::ParseError;

/// Core library error type
///
/// Duplicate rows, stale balance updates and no-op updates are not errors:
/// they are reported as outcomes by the repository port and counted in the
/// import summary.
#[derive(Error, Debug)]
pub enum Error {
    /// Underlying persistence failure
    #[error("Database error: {0}")]
    Database(String),

    /// A required entity is missing and cannot be created on the fly
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed statement text
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Whether this error comes from the storage layer
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
