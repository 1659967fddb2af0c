//! Async SQLite migration engine.
//!
//! The reconciliation engine is synchronous. `SqliteEngine` owns a
//! `tokio-rusqlite` connection and runs each engine call on its background
//! thread, so async callers never block the runtime.

use tokio_rusqlite::Connection;
use tracing::{debug, info, instrument};

use rewind_migrate::{MigrationPlan, MigrationReport, MigrationStatus, Migrator};

use crate::config::{DatabasePath, SqliteConfig, TransactionMode};
use crate::connection::SqliteDatabase;
use crate::error::{SqliteError, SqliteResult};

/// SQLite migration engine.
pub struct SqliteEngine {
    conn: Connection,
    config: SqliteConfig,
}

impl SqliteEngine {
    /// Open the configured database and apply its pragmas.
    pub async fn open(config: SqliteConfig) -> SqliteResult<Self> {
        let conn = match &config.path {
            DatabasePath::Memory => Connection::open_in_memory().await?,
            DatabasePath::File(path) => Connection::open(path).await?,
        };

        let init_sql = config.init_sql();
        conn.call(move |c| Ok(c.execute_batch(&init_sql)?)).await?;

        info!(path = %config.path.display(), "Opened SQLite database");
        Ok(Self { conn, config })
    }

    /// Open a database from a URL.
    pub async fn connect(url: &str) -> SqliteResult<Self> {
        Self::open(SqliteConfig::from_url(url)?).await
    }

    /// The configuration this engine was opened with.
    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    /// Reconcile the database with the migrator's directory.
    #[instrument(skip_all, fields(dir = %migrator.config().migrations_dir.display()))]
    pub async fn migrate(&self, migrator: &Migrator) -> SqliteResult<MigrationReport> {
        let migrator = migrator.clone();
        let mode = self.config.transaction_mode;

        let report = self
            .conn
            .call(move |c| Ok(migrator.migrate(&mut SqliteDatabase::with_mode(c, mode))))
            .await??;

        debug!(applied = report.applied.len(), reverted = report.reverted.len(), "Migrate finished");
        Ok(report)
    }

    /// Compute the next run's plan without changing anything.
    ///
    /// Reads run in a deferred transaction regardless of the configured
    /// mode, so they do not wait on another connection's write lock.
    pub async fn plan(&self, migrator: &Migrator) -> SqliteResult<MigrationPlan> {
        let migrator = migrator.clone();

        Ok(self
            .conn
            .call(move |c| {
                let mut db = SqliteDatabase::with_mode(c, TransactionMode::Deferred);
                Ok(migrator.plan(&mut db))
            })
            .await??)
    }

    /// Applied, pending, and orphaned migrations.
    ///
    /// Uses a deferred transaction, like [`plan`](Self::plan).
    pub async fn status(&self, migrator: &Migrator) -> SqliteResult<MigrationStatus> {
        let migrator = migrator.clone();

        Ok(self
            .conn
            .call(move |c| {
                let mut db = SqliteDatabase::with_mode(c, TransactionMode::Deferred);
                Ok(migrator.status(&mut db))
            })
            .await??)
    }

    /// Run raw SQL outside of any migration.
    pub async fn execute_batch(&self, sql: impl Into<String>) -> SqliteResult<()> {
        let sql = sql.into();
        self.conn
            .call(move |c| Ok(c.execute_batch(&sql)?))
            .await
            .map_err(SqliteError::from)
    }

    /// Run a closure against the underlying connection.
    pub async fn call<F, R>(&self, f: F) -> SqliteResult<R>
    where
        F: FnOnce(&mut rusqlite::Connection) -> rusqlite::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        self.conn
            .call(move |c| Ok(f(c)?))
            .await
            .map_err(SqliteError::from)
    }

    /// Close the connection, flushing pending work.
    pub async fn close(self) -> SqliteResult<()> {
        self.conn.close().await?;
        debug!("Closed SQLite database");
        Ok(())
    }
}
