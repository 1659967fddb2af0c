//! SQLite configuration.

use std::path::{Path, PathBuf};

use crate::error::{SqliteError, SqliteResult};

/// SQLite database configuration.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Database path (or ":memory:" for in-memory).
    pub path: DatabasePath,
    /// Enable foreign keys.
    pub foreign_keys: bool,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: Option<u32>,
    /// Synchronous mode; left untouched when `None`.
    pub synchronous: Option<SynchronousMode>,
    /// Journal mode; left untouched when `None`.
    pub journal_mode: Option<JournalMode>,
    /// How the reconciling transaction acquires its lock.
    pub transaction_mode: TransactionMode,
}

/// Database path configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DatabasePath {
    /// In-memory database.
    #[default]
    Memory,
    /// File-based database.
    File(PathBuf),
}

impl DatabasePath {
    /// Get the path for display.
    pub fn display(&self) -> String {
        match self {
            Self::Memory => ":memory:".to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }

    /// Check if this is an in-memory database.
    pub fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

/// SQLite synchronous mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynchronousMode {
    /// Synchronous OFF - Fastest but unsafe.
    Off,
    /// Synchronous NORMAL - Good balance.
    Normal,
    /// Synchronous FULL - Safe but slower.
    Full,
    /// Synchronous EXTRA - Maximum safety.
    Extra,
}

impl SynchronousMode {
    /// Get the SQLite pragma value.
    pub fn as_pragma(&self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Normal => "NORMAL",
            Self::Full => "FULL",
            Self::Extra => "EXTRA",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "off" => Some(Self::Off),
            "normal" => Some(Self::Normal),
            "full" => Some(Self::Full),
            "extra" => Some(Self::Extra),
            _ => None,
        }
    }
}

/// SQLite journal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalMode {
    /// DELETE - Default mode, deletes journal after transaction.
    Delete,
    /// TRUNCATE - Truncates journal instead of deleting.
    Truncate,
    /// PERSIST - Keep journal file, zero out on commit.
    Persist,
    /// MEMORY - Keep journal in memory.
    Memory,
    /// WAL - Write-Ahead Logging.
    Wal,
}

impl JournalMode {
    /// Get the SQLite pragma value.
    pub fn as_pragma(&self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Truncate => "TRUNCATE",
            Self::Persist => "PERSIST",
            Self::Memory => "MEMORY",
            Self::Wal => "WAL",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "delete" => Some(Self::Delete),
            "truncate" => Some(Self::Truncate),
            "persist" => Some(Self::Persist),
            "memory" => Some(Self::Memory),
            "wal" => Some(Self::Wal),
            _ => None,
        }
    }
}

/// Lock acquisition for the reconciling transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransactionMode {
    /// Take locks lazily, on first read/write.
    Deferred,
    /// Take the write lock at BEGIN.
    #[default]
    Immediate,
    /// Take an exclusive lock at BEGIN.
    Exclusive,
}

impl TransactionMode {
    pub(crate) fn behavior(&self) -> rusqlite::TransactionBehavior {
        match self {
            Self::Deferred => rusqlite::TransactionBehavior::Deferred,
            Self::Immediate => rusqlite::TransactionBehavior::Immediate,
            Self::Exclusive => rusqlite::TransactionBehavior::Exclusive,
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "deferred" => Some(Self::Deferred),
            "immediate" => Some(Self::Immediate),
            "exclusive" => Some(Self::Exclusive),
            _ => None,
        }
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: DatabasePath::Memory,
            foreign_keys: true,
            busy_timeout_ms: Some(5000),
            synchronous: None,
            journal_mode: None,
            transaction_mode: TransactionMode::Immediate,
        }
    }
}

impl SqliteConfig {
    /// Create a new configuration for an in-memory database.
    pub fn memory() -> Self {
        Self {
            path: DatabasePath::Memory,
            ..Default::default()
        }
    }

    /// Create a new configuration for a file-based database.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            path: DatabasePath::File(path.as_ref().to_path_buf()),
            ..Default::default()
        }
    }

    /// Parse a SQLite URL into configuration.
    ///
    /// Supported formats:
    /// - `:memory:` / `sqlite::memory:` - In-memory database
    /// - `sqlite://path/to/db.sqlite` - File-based database
    /// - `sqlite:///absolute/path/db.sqlite` - Absolute path
    /// - `file:path/to/db.sqlite` - Alternative format
    /// - `path/to/db.sqlite` - Bare path
    ///
    /// Query parameters: `mode=memory`, `foreign_keys`, `busy_timeout`,
    /// `synchronous`, `journal_mode`, `transaction`.
    pub fn from_url(url: impl AsRef<str>) -> SqliteResult<Self> {
        let url_str = url.as_ref().trim();
        if url_str.is_empty() {
            return Err(SqliteError::config("database URL is empty"));
        }

        let (location, query) = match url_str.split_once('?') {
            Some((location, query)) => (location, Some(query)),
            None => (url_str, None),
        };

        let path = if let Some(path) = location.strip_prefix("sqlite://") {
            if path.is_empty() {
                return Err(SqliteError::config("database path is required"));
            }
            path
        } else if let Some(path) = location.strip_prefix("sqlite:") {
            path
        } else if let Some(path) = location.strip_prefix("file:") {
            path
        } else {
            location
        };

        let mut config = if path == ":memory:" {
            Self::memory()
        } else {
            Self::file(path)
        };

        for pair in query.into_iter().flat_map(|q| q.split('&')) {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            match key {
                "mode" if value == "memory" => config.path = DatabasePath::Memory,
                "foreign_keys" => config.foreign_keys = value == "true" || value == "1",
                "busy_timeout" => {
                    let ms = value.parse().map_err(|_| {
                        SqliteError::config(format!("invalid busy_timeout '{}'", value))
                    })?;
                    config.busy_timeout_ms = Some(ms);
                }
                "synchronous" => {
                    config.synchronous = Some(SynchronousMode::parse(value).ok_or_else(|| {
                        SqliteError::config(format!("invalid synchronous mode '{}'", value))
                    })?);
                }
                "journal_mode" => {
                    config.journal_mode = Some(JournalMode::parse(value).ok_or_else(|| {
                        SqliteError::config(format!("invalid journal mode '{}'", value))
                    })?);
                }
                "transaction" => {
                    config.transaction_mode = TransactionMode::parse(value).ok_or_else(|| {
                        SqliteError::config(format!("invalid transaction mode '{}'", value))
                    })?;
                }
                _ => {}
            }
        }

        Ok(config)
    }

    /// Generate the initialization SQL for this configuration.
    pub fn init_sql(&self) -> String {
        let mut sql = String::new();

        sql.push_str(&format!(
            "PRAGMA foreign_keys = {};\n",
            if self.foreign_keys { "ON" } else { "OFF" }
        ));

        if let Some(mode) = self.journal_mode {
            sql.push_str(&format!("PRAGMA journal_mode = {};\n", mode.as_pragma()));
        }

        if let Some(mode) = self.synchronous {
            sql.push_str(&format!("PRAGMA synchronous = {};\n", mode.as_pragma()));
        }

        if let Some(timeout) = self.busy_timeout_ms {
            sql.push_str(&format!("PRAGMA busy_timeout = {};\n", timeout));
        }

        sql
    }

    /// Set the database path.
    pub fn path(mut self, path: DatabasePath) -> Self {
        self.path = path;
        self
    }

    /// Enable or disable foreign keys.
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    /// Set the busy timeout in milliseconds.
    pub fn busy_timeout(mut self, ms: u32) -> Self {
        self.busy_timeout_ms = Some(ms);
        self
    }

    /// Set the synchronous mode.
    pub fn synchronous(mut self, mode: SynchronousMode) -> Self {
        self.synchronous = Some(mode);
        self
    }

    /// Set the journal mode.
    pub fn journal_mode(mut self, mode: JournalMode) -> Self {
        self.journal_mode = Some(mode);
        self
    }

    /// Set the transaction mode.
    pub fn transaction_mode(mut self, mode: TransactionMode) -> Self {
        self.transaction_mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_memory() {
        let config = SqliteConfig::memory();
        assert!(config.path.is_memory());
        assert_eq!(config.path.display(), ":memory:");
    }

    #[test]
    fn test_config_file() {
        let config = SqliteConfig::file("test.db");
        assert_eq!(config.path, DatabasePath::File(PathBuf::from("test.db")));
    }

    #[test]
    fn test_config_from_url_memory() {
        assert!(SqliteConfig::from_url("sqlite::memory:").unwrap().path.is_memory());
        assert!(SqliteConfig::from_url(":memory:").unwrap().path.is_memory());
        assert!(SqliteConfig::from_url("file:x.db?mode=memory").unwrap().path.is_memory());
    }

    #[test]
    fn test_config_from_url_file() {
        let config = SqliteConfig::from_url("sqlite://./test.db").unwrap();
        assert_eq!(config.path, DatabasePath::File(PathBuf::from("./test.db")));

        let config = SqliteConfig::from_url("sqlite:///var/lib/app.db").unwrap();
        assert_eq!(config.path, DatabasePath::File(PathBuf::from("/var/lib/app.db")));

        let config = SqliteConfig::from_url("data/app.db").unwrap();
        assert_eq!(config.path, DatabasePath::File(PathBuf::from("data/app.db")));
    }

    #[test]
    fn test_config_from_url_with_options() {
        let config = SqliteConfig::from_url(
            "sqlite://./test.db?foreign_keys=false&busy_timeout=10000&synchronous=full&transaction=exclusive",
        )
        .unwrap();

        assert!(!config.foreign_keys);
        assert_eq!(config.busy_timeout_ms, Some(10000));
        assert_eq!(config.synchronous, Some(SynchronousMode::Full));
        assert_eq!(config.transaction_mode, TransactionMode::Exclusive);
    }

    #[test]
    fn test_config_from_url_rejects_bad_options() {
        assert!(SqliteConfig::from_url("").is_err());
        assert!(SqliteConfig::from_url("sqlite://").is_err());
        assert!(SqliteConfig::from_url("a.db?busy_timeout=soon").is_err());
        assert!(SqliteConfig::from_url("a.db?journal_mode=sideways").is_err());
    }

    #[test]
    fn test_init_sql() {
        let sql = SqliteConfig::default().init_sql();
        assert!(sql.contains("foreign_keys = ON"));
        assert!(sql.contains("busy_timeout = 5000"));
        assert!(!sql.contains("journal_mode"));
        assert!(!sql.contains("synchronous"));

        let sql = SqliteConfig::memory()
            .journal_mode(JournalMode::Wal)
            .synchronous(SynchronousMode::Normal)
            .init_sql();
        assert!(sql.contains("journal_mode = WAL"));
        assert!(sql.contains("synchronous = NORMAL"));
    }

    #[test]
    fn test_builder_pattern() {
        let config = SqliteConfig::memory()
            .foreign_keys(false)
            .busy_timeout(3000)
            .transaction_mode(TransactionMode::Deferred);

        assert!(!config.foreign_keys);
        assert_eq!(config.busy_timeout_ms, Some(3000));
        assert_eq!(config.transaction_mode, TransactionMode::Deferred);
    }

    #[test]
    fn test_pragma_values() {
        assert_eq!(SynchronousMode::Extra.as_pragma(), "EXTRA");
        assert_eq!(JournalMode::Truncate.as_pragma(), "TRUNCATE");
        assert_eq!(JournalMode::parse("WAL"), Some(JournalMode::Wal));
    }
}
