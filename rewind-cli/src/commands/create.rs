//! `rewind create` - Write a new migration template.

use rewind_migrate::{IdStrategy, MigrationFileManager};

use crate::cli::CreateArgs;
use crate::config::Settings;
use crate::error::CliResult;
use crate::output::{self, success};

/// Run the create command
pub async fn run(args: CreateArgs, settings: &Settings) -> CliResult<()> {
    let strategy = if args.timestamp {
        IdStrategy::Timestamp
    } else {
        IdStrategy::Sequential
    };

    let files = MigrationFileManager::new(&settings.migrations_dir);
    let path = files.create(&args.description, strategy)?;

    success(&format!("Created {}", path.display()));
    output::dim("Fill in the up and down sections, then run `rewind migrate`.");
    Ok(())
}
