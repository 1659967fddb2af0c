//! `rewind migrate` - Reconcile the database with the migrations directory.

use crate::cli::MigrateArgs;
use crate::commands::{migrator, open_engine, print_context};
use crate::config::Settings;
use crate::error::CliResult;
use crate::output::{self, success, warn};

/// Run the migrate command
pub async fn run(args: MigrateArgs, settings: &Settings) -> CliResult<()> {
    output::header(if args.dry_run { "Migrate (dry run)" } else { "Migrate" });
    print_context(settings);

    let migrator = migrator(settings, args.dry_run)?;
    let engine = open_engine(settings).await?;
    let report = engine.migrate(&migrator).await?;
    engine.close().await?;

    for warning in &report.warnings {
        warn(&warning.to_string());
    }
    if !report.warnings.is_empty() {
        output::newline();
    }

    let (reverted, applied) = if report.dry_run {
        ("Would roll back", "Would apply")
    } else {
        ("Rolled back", "Applied")
    };

    if !report.reverted.is_empty() {
        output::section(reverted);
        for id in &report.reverted {
            output::list_item(&output::style_pending(&id.to_string()));
        }
    }
    if !report.applied.is_empty() {
        output::section(applied);
        for id in &report.applied {
            output::list_item(&output::style_success(&id.to_string()));
        }
    }
    if report.has_changes() {
        output::newline();
    }

    success(&report.summary());
    Ok(())
}
