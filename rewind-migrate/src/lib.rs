//! # rewind-migrate
//!
//! Reconciliation engine for reversible SQL migrations.
//!
//! This crate provides:
//! - Parsing of `<id>_<description>.sql` files with `-- migrate: up` /
//!   `-- migrate: down` sections
//! - Loading a migrations directory into an ordered, conflict-free set
//! - A tracking table recording every applied migration with its SQL
//! - One-transaction reconciliation: roll back the orphaned tail, then
//!   apply everything newer than what remains
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌─────────────┐
//! │ migrations/  │────▶│ File Manager   │────▶│ Plan        │
//! └──────────────┘     └────────────────┘     └─────────────┘
//!                                                    │
//!                      ┌────────────────┐            ▼
//!                      │ History Store  │◀───▶┌─────────────┐
//!                      └────────────────┘     │ Transaction │
//!                                             └─────────────┘
//! ```
//!
//! The engine is driver-agnostic: it talks to the database through the
//! [`Database`] and [`Transaction`] traits. `rewind-sqlite` implements them
//! for SQLite.
//!
//! ## Example
//!
//! ```rust,ignore
//! use rewind_migrate::{Migrator, MigratorConfig};
//!
//! fn run(db: &mut impl rewind_migrate::Database) -> Result<(), rewind_migrate::MigrationError> {
//!     let migrator = Migrator::new(
//!         MigratorConfig::new()
//!             .migrations_dir("./migrations")
//!             .table_name("__migration"),
//!     )?;
//!
//!     let report = migrator.migrate(db)?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Migration Files
//!
//! ```text
//! migrations/
//! ├── 001_create_user.sql
//! └── 002_create_product.sql
//! ```
//!
//! ```sql
//! -- migrate: up
//! CREATE TABLE product (id INTEGER PRIMARY KEY);
//!
//! -- migrate: down
//! DROP TABLE product;
//! ```

pub mod engine;
pub mod error;
pub mod executor;
pub mod file;
pub mod history;
pub mod migration;
pub mod sql;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use engine::{
    MigrationPlan, MigrationReport, MigrationStatus, Migrator, MigratorConfig, PlanWarning,
};
pub use error::{BoxError, DatabaseError, DatabaseErrorKind, Direction, MigrateResult, MigrationError};
pub use executor::{Database, SqlRow, SqlValue, Transaction};
pub use file::{IdStrategy, MigrationFileManager};
pub use history::{DEFAULT_TABLE_NAME, HistoryStore, TableName};
pub use migration::{DOWN_MARKER, MigrationRecord, UP_MARKER};
pub use sql::compact_sql;
