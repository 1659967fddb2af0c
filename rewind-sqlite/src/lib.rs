//! SQLite executor for the Rewind migration engine.
//!
//! This crate connects `rewind-migrate` to SQLite through `rusqlite`, and
//! offers an async facade built on `tokio-rusqlite`.
//!
//! # Features
//!
//! - [`SqliteDatabase`] implements the engine's `Database` seam for a
//!   borrowed `rusqlite::Connection`
//! - [`SqliteEngine`] runs migrate, plan, and status off the async runtime
//! - URL-based configuration with pragma and transaction-mode options
//! - In-memory and file-based databases
//!
//! # Example
//!
//! ```rust,ignore
//! use rewind_migrate::{Migrator, MigratorConfig};
//! use rewind_sqlite::{SqliteConfig, SqliteEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = SqliteEngine::open(SqliteConfig::from_url("sqlite://./app.db")?).await?;
//!     let migrator = Migrator::new(MigratorConfig::new().migrations_dir("./migrations"))?;
//!
//!     let report = engine.migrate(&migrator).await?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connection;
pub mod engine;
pub mod error;

pub use config::{DatabasePath, JournalMode, SqliteConfig, SynchronousMode, TransactionMode};
pub use connection::{SqliteDatabase, SqliteTransaction, open_blocking};
pub use engine::SqliteEngine;
pub use error::{SqliteError, SqliteResult};
