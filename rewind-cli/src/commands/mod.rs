//! CLI command implementations.

pub mod create;
pub mod migrate;
pub mod status;
pub mod version;

use rewind_migrate::{Migrator, MigratorConfig};
use rewind_sqlite::{SqliteConfig, SqliteEngine};
use tracing::debug;

use crate::config::Settings;
use crate::error::CliResult;
use crate::output;

/// Build a migrator from the resolved settings.
pub(crate) fn migrator(settings: &Settings, dry_run: bool) -> CliResult<Migrator> {
    let config = MigratorConfig::new()
        .migrations_dir(&settings.migrations_dir)
        .table_name(&settings.table_name)
        .dry_run(dry_run);
    Ok(Migrator::new(config)?)
}

/// Open the configured database.
pub(crate) async fn open_engine(settings: &Settings) -> CliResult<SqliteEngine> {
    let config = SqliteConfig::from_url(&settings.database_url)?;
    debug!(?config, "Resolved database configuration");
    Ok(SqliteEngine::open(config).await?)
}

/// Print where we are working.
pub(crate) fn print_context(settings: &Settings) {
    output::kv("Database", &settings.database_url);
    output::kv("Migrations", &settings.migrations_dir.display().to_string());
    output::kv("Table", &settings.table_name);
    output::newline();
}
