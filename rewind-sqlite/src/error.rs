//! Error types for SQLite operations.

use rewind_migrate::{DatabaseError, MigrationError};
use thiserror::Error;

/// Result type for SQLite operations.
pub type SqliteResult<T> = Result<T, SqliteError>;

/// Error type for SQLite operations.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// SQLite driver error.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// The background connection failed or was closed.
    #[error(transparent)]
    Connection(#[from] tokio_rusqlite::Error),

    /// The migration engine reported an error.
    #[error(transparent)]
    Migration(#[from] MigrationError),
}

impl SqliteError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The engine error, if this is one.
    pub fn as_migration(&self) -> Option<&MigrationError> {
        match self {
            Self::Migration(e) => Some(e),
            _ => None,
        }
    }
}

/// Classify a driver error for the engine.
pub(crate) fn to_database_error(err: rusqlite::Error) -> DatabaseError {
    if matches!(
        err.sqlite_error_code(),
        Some(rusqlite::ErrorCode::ConstraintViolation)
    ) {
        DatabaseError::constraint(err)
    } else {
        DatabaseError::other(err)
    }
}
