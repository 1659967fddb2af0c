//! Error types for the migration engine.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::migration::MigrationRecord;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Boxed driver error carried through the executor traits.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Which batch of a migration was being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// The forward (`up`) batch.
    Up,
    /// The reverse (`down`) batch.
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// Classification of a driver error, as far as the engine cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseErrorKind {
    /// A uniqueness / primary key constraint was violated.
    Constraint,
    /// Anything else.
    Other,
}

/// An error reported by the database driver.
///
/// Displays as the driver error itself and forwards its source, so the
/// driver message appears once in an error chain.
#[derive(Debug)]
pub struct DatabaseError {
    kind: DatabaseErrorKind,
    source: BoxError,
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.source, f)
    }
}

impl std::error::Error for DatabaseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.source()
    }
}

impl DatabaseError {
    /// Wrap a driver error.
    pub fn new(kind: DatabaseErrorKind, source: impl Into<BoxError>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }

    /// Wrap a driver error of unspecified kind.
    pub fn other(source: impl Into<BoxError>) -> Self {
        Self::new(DatabaseErrorKind::Other, source)
    }

    /// Wrap a constraint violation.
    pub fn constraint(source: impl Into<BoxError>) -> Self {
        Self::new(DatabaseErrorKind::Constraint, source)
    }

    /// The error classification.
    pub fn kind(&self) -> DatabaseErrorKind {
        self.kind
    }

    /// Whether this is a constraint violation.
    pub fn is_constraint(&self) -> bool {
        self.kind == DatabaseErrorKind::Constraint
    }
}

/// Errors that can occur during migration operations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A migration file's name or content does not have the required shape.
    #[error("Invalid migration file '{file}': {reason}")]
    Format {
        /// Offending file name.
        file: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Two migration files share an id.
    #[error("Migration id {id} is used by both '{first}' and '{second}'")]
    Conflict {
        /// The duplicated id.
        id: u64,
        /// First file carrying the id.
        first: String,
        /// Second file carrying the id.
        second: String,
    },

    /// The migrations directory or a migration file could not be read or written.
    #[error("I/O error on '{}'", .path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A forward or reverse batch failed to execute.
    #[error(
        "error executing {direction} migration {} ({})\nmigration: {}",
        .record.id,
        .record.filename,
        .record.snapshot()
    )]
    Execution {
        /// Which batch failed.
        direction: Direction,
        /// The offending migration.
        record: Box<MigrationRecord>,
        /// Driver error.
        #[source]
        source: DatabaseError,
    },

    /// The tracking table refused a row for the migration being applied.
    #[error(
        "Tracking row for migration {} ({}) could not be inserted: {reason}\nmigration: {}",
        .record.id,
        .record.filename,
        .record.snapshot()
    )]
    Constraint {
        /// The migration being recorded.
        record: Box<MigrationRecord>,
        /// Why the insert was refused.
        reason: String,
    },

    /// Inserting or deleting a tracking row failed in the driver.
    #[error(
        "Tracking table update failed while {action} migration {} ({})\nmigration: {}",
        .record.id,
        .record.filename,
        .record.snapshot()
    )]
    Tracking {
        /// What the engine was doing, e.g. "recording".
        action: &'static str,
        /// The migration whose row was being written.
        record: Box<MigrationRecord>,
        /// Driver error.
        #[source]
        source: DatabaseError,
    },

    /// An internal invariant was violated, e.g. a tracking row vanished mid-transaction.
    #[error("Inconsistent migration state: {0}")]
    Consistency(String),

    /// Database operation outside of a specific migration batch.
    #[error("Database error while {context}")]
    Database {
        /// What the engine was doing.
        context: String,
        /// Driver error.
        #[source]
        source: DatabaseError,
    },

    /// The configured tracking table name is not a plain identifier.
    #[error("Invalid tracking table name '{0}': expected letters, digits and underscores")]
    InvalidTableName(String),

    /// A migration description cannot be used in a file name.
    #[error("Invalid migration description '{0}': expected letters, digits, '_' or '-'")]
    InvalidDescription(String),

    /// Refusing to overwrite an existing migration file.
    #[error("Migration file '{}' already exists", .0.display())]
    AlreadyExists(PathBuf),
}

impl MigrationError {
    /// Create a format error.
    pub fn format(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Format {
            file: file.into(),
            reason: reason.into(),
        }
    }

    /// Create an I/O error for a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a database error with context.
    pub fn database(context: impl Into<String>, source: DatabaseError) -> Self {
        Self::Database {
            context: context.into(),
            source,
        }
    }

    /// Create an execution error for a migration batch.
    pub fn execution(direction: Direction, record: &MigrationRecord, source: DatabaseError) -> Self {
        Self::Execution {
            direction,
            record: Box::new(record.clone()),
            source,
        }
    }

    /// Create a constraint error for a tracking row insert.
    pub fn constraint(record: &MigrationRecord, reason: impl Into<String>) -> Self {
        Self::Constraint {
            record: Box::new(record.clone()),
            reason: reason.into(),
        }
    }

    /// Create a tracking table error for a migration.
    pub fn tracking(action: &'static str, record: &MigrationRecord, source: DatabaseError) -> Self {
        Self::Tracking {
            action,
            record: Box::new(record.clone()),
            source,
        }
    }

    /// Create a consistency error.
    pub fn consistency(msg: impl Into<String>) -> Self {
        Self::Consistency(msg.into())
    }

    /// Whether this error is raised before the database is touched.
    pub fn is_pre_database(&self) -> bool {
        matches!(
            self,
            Self::Format { .. }
                | Self::Conflict { .. }
                | Self::Io { .. }
                | Self::InvalidTableName(_)
                | Self::InvalidDescription(_)
                | Self::AlreadyExists(_)
        )
    }

    /// The migration id this error concerns, if any.
    pub fn migration_id(&self) -> Option<u64> {
        match self {
            Self::Conflict { id, .. } => Some(*id),
            Self::Execution { record, .. }
            | Self::Constraint { record, .. }
            | Self::Tracking { record, .. } => Some(record.id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_display() {
        let err = MigrationError::format("abc.sql", "missing '_' separator");
        let msg = err.to_string();
        assert!(msg.contains("abc.sql"));
        assert!(msg.contains("separator"));
    }

    #[test]
    fn test_conflict_display() {
        let err = MigrationError::Conflict {
            id: 5,
            first: "5_a.sql".to_string(),
            second: "5_b.sql".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("5_a.sql"));
        assert!(msg.contains("5_b.sql"));
        assert_eq!(err.migration_id(), Some(5));
    }

    #[test]
    fn test_execution_error_includes_snapshot() {
        let record = MigrationRecord::new(
            2,
            "create_product",
            "2_create_product.sql",
            "CREATE TABLE product (id INTEGER);",
            "DROP TABLE product;",
        );
        let err = MigrationError::execution(
            Direction::Up,
            &record,
            DatabaseError::other("near \"CREAT\": syntax error"),
        );
        let msg = err.to_string();
        assert!(msg.starts_with("error executing up migration 2 (2_create_product.sql)"));
        assert!(msg.contains("\"name\": \"create_product\""));
        assert_eq!(err.migration_id(), Some(2));
    }

    #[test]
    fn test_driver_message_appears_once_in_chain() {
        let record = MigrationRecord::new(2, "seed", "2_seed.sql", "INSERT INTO t VALUES (1);", "DELETE FROM t;");
        let err = MigrationError::execution(Direction::Up, &record, DatabaseError::other("no such table: t"));

        assert!(!err.to_string().contains("no such table"));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "no such table: t");

        let mut chain = Vec::new();
        let mut current: Option<&(dyn std::error::Error + 'static)> = Some(&err);
        while let Some(e) = current {
            chain.push(e.to_string());
            current = e.source();
        }
        assert_eq!(chain.join("\n").matches("no such table: t").count(), 1);

        let err = MigrationError::database("committing", DatabaseError::other("database is locked"));
        assert_eq!(err.to_string(), "Database error while committing");
        assert_eq!(std::error::Error::source(&err).unwrap().to_string(), "database is locked");
    }

    #[test]
    fn test_tracking_errors_include_snapshot() {
        let record = MigrationRecord::new(4, "seed", "4_seed.sql", "A;", "B;");

        let err = MigrationError::constraint(&record, "UNIQUE constraint failed");
        let msg = err.to_string();
        assert!(msg.contains("4_seed.sql"));
        assert!(msg.contains("\"filename\": \"4_seed.sql\""));
        assert_eq!(err.migration_id(), Some(4));

        let err = MigrationError::tracking("removing", &record, DatabaseError::other("disk I/O error"));
        let msg = err.to_string();
        assert!(msg.starts_with("Tracking table update failed while removing migration 4 (4_seed.sql)"));
        assert!(msg.contains("\"down\": \"B;\""));
        assert_eq!(err.migration_id(), Some(4));
    }

    #[test]
    fn test_is_pre_database() {
        assert!(MigrationError::format("x", "y").is_pre_database());
        assert!(MigrationError::InvalidTableName("a b".into()).is_pre_database());
        assert!(!MigrationError::consistency("gone").is_pre_database());
        assert!(
            !MigrationError::database("committing", DatabaseError::other("locked"))
                .is_pre_database()
        );
    }

    #[test]
    fn test_database_error_kind() {
        let err = DatabaseError::constraint("UNIQUE constraint failed");
        assert!(err.is_constraint());
        assert_eq!(DatabaseError::other("boom").kind(), DatabaseErrorKind::Other);
    }
}
