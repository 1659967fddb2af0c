//! CLI argument definitions using clap.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Rewind - Reversible SQL migrations
#[derive(Parser, Debug)]
#[command(name = "rewind")]
#[command(version)]
#[command(about = "Rewind - Reversible SQL migrations", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Options shared by every command
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Flags accepted by every subcommand.
///
/// Unset values fall back to `rewind.toml`, then to built-in defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Migrations directory [default: ./migrations]
    #[arg(short, long, global = true)]
    pub dir: Option<PathBuf>,

    /// Tracking table name [default: __migration]
    #[arg(short, long, global = true)]
    pub table: Option<String>,

    /// Database URL or path [default: :memory:]
    #[arg(long, global = true, env = "REWIND_DATABASE_URL")]
    pub database: Option<String>,

    /// Path to the config file [default: rewind.toml if present]
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Reconcile the database with the migrations directory
    Migrate(MigrateArgs),

    /// Show applied, pending, and orphaned migrations
    Status,

    /// Create a new migration file
    Create(CreateArgs),

    /// Display version information
    Version,
}

/// Arguments for the `migrate` command
#[derive(Args, Debug, Default)]
pub struct MigrateArgs {
    /// Show what would run without executing anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `create` command
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Short description, used in the file name
    pub description: String,

    /// Use a UTC timestamp id instead of the next sequential number
    #[arg(long)]
    pub timestamp: bool,
}
