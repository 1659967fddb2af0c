//! # Rewind
//!
//! Reconcile a database with a directory of reversible SQL migrations.
//!
//! Rewind provides:
//! - Migration files with an up and a down section, ordered by numeric id
//! - A tracking table that stores the SQL each migration was applied with
//! - One-transaction runs that roll back migrations whose files were
//!   removed, then apply every newer file
//! - A SQLite executor and an async facade (feature `sqlite`, on by default)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rewind::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = SqliteEngine::connect("sqlite://./app.db").await?;
//!     let migrator = Migrator::new(MigratorConfig::new().migrations_dir("./migrations"))?;
//!
//!     let report = engine.migrate(&migrator).await?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The reconciliation engine.
pub mod migrate {
    pub use rewind_migrate::*;
}

/// SQLite executor.
#[cfg(feature = "sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "sqlite")))]
pub mod sqlite {
    pub use rewind_sqlite::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::migrate::{
        Database, MigrationError, MigrationPlan, MigrationRecord, MigrationReport,
        MigrationStatus, Migrator, MigratorConfig, PlanWarning, Transaction,
    };
    #[cfg(feature = "sqlite")]
    pub use crate::sqlite::{SqliteConfig, SqliteDatabase, SqliteEngine, SqliteError};
}

// Re-export key types at the crate root
pub use migrate::{MigrateResult, MigrationError, Migrator, MigratorConfig};
