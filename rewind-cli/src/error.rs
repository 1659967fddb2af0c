//! CLI error types and result alias.

use miette::Diagnostic;
use thiserror::Error;

use rewind_migrate::MigrationError;
use rewind_sqlite::SqliteError;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// IO error
    #[error("IO error")]
    #[diagnostic(code(rewind::io))]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(rewind::config),
        help("check rewind.toml, the command-line flags, and REWIND_DATABASE_URL")
    )]
    Config(String),

    /// Migration error
    #[error("Migration error")]
    #[diagnostic(code(rewind::migration))]
    Migration(#[from] MigrationError),

    /// Database error
    #[error("Database error: {0}")]
    #[diagnostic(code(rewind::database))]
    Database(String),
}

impl CliError {
    /// A hint for the operator, for errors that have an obvious fix.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Migration(MigrationError::Format { .. }) => {
                Some("each migration file needs one `-- migrate: up` and one `-- migrate: down` line")
            }
            Self::Migration(MigrationError::Conflict { .. }) => {
                Some("rename one of the files so every id is unique")
            }
            Self::Migration(MigrationError::InvalidTableName(_)) => {
                Some("table names must match [A-Za-z_][A-Za-z0-9_]* and be at most 63 characters")
            }
            _ => None,
        }
    }

    /// Messages of the underlying errors, outermost first.
    pub fn causes(&self) -> Vec<String> {
        let mut causes = Vec::new();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            causes.push(err.to_string());
            source = err.source();
        }
        causes
    }
}

impl From<SqliteError> for CliError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::Migration(e) => CliError::Migration(e),
            SqliteError::Config(msg) => CliError::Config(msg),
            other => CliError::Database(other.to_string()),
        }
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Config(format!("Failed to parse TOML: {}", err))
    }
}
