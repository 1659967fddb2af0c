//! `rewind status` - Show how the database compares to the directory.

use rewind_migrate::MigrationRecord;

use crate::commands::{migrator, open_engine, print_context};
use crate::config::Settings;
use crate::error::CliResult;
use crate::output::{self, success, warn};

/// Run the status command
pub async fn run(settings: &Settings) -> CliResult<()> {
    output::header("Migration Status");
    print_context(settings);

    let migrator = migrator(settings, false)?;
    let engine = open_engine(settings).await?;
    let status = engine.status(&migrator).await?;
    engine.close().await?;

    output::section(&format!("Applied ({})", status.applied.len()));
    for record in &status.applied {
        let applied_at = record
            .applied_at
            .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        output::list_item(&format!(
            "{} {}",
            output::style_success(&label(record)),
            applied_at
        ));
    }
    output::newline();

    if !status.orphaned.is_empty() {
        output::section(&format!("To roll back ({})", status.orphaned.len()));
        for record in &status.orphaned {
            output::list_item(&output::style_error(&label(record)));
        }
        output::newline();
    }

    output::section(&format!("Pending ({})", status.pending.len()));
    for record in &status.pending {
        output::list_item(&output::style_pending(&label(record)));
    }
    output::newline();

    for warning in &status.warnings {
        warn(&warning.to_string());
    }

    if status.is_up_to_date() {
        success("Database is up to date");
    } else {
        output::info(&format!(
            "{} to roll back, {} to apply. Run `rewind migrate` to reconcile.",
            status.orphaned.len(),
            status.pending.len()
        ));
    }
    Ok(())
}

fn label(record: &MigrationRecord) -> String {
    format!("{} ({})", record.id, record.filename)
}
