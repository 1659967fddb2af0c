//! Rewind CLI - Command-line interface for the Rewind migration engine.

use clap::Parser;
use miette::Diagnostic;

use rewind_cli::cli::{Cli, Command};
use rewind_cli::commands;
use rewind_cli::config::Settings;
use rewind_cli::error::CliResult;
use rewind_cli::{logging, output};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.global.verbose, cli.global.quiet);
    output::set_quiet(cli.global.quiet);

    if let Err(e) = run(cli).await {
        output::error(&e.to_string());
        for cause in e.causes() {
            output::cause(&cause);
        }
        if let Some(help) = e.help() {
            output::hint(&help.to_string());
        } else if let Some(hint) = e.hint() {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    if let Command::Version = cli.command {
        return commands::version::run().await;
    }

    let settings = Settings::load(&cli.global)?;

    match cli.command {
        Command::Migrate(args) => commands::migrate::run(args, &settings).await,
        Command::Status => commands::status::run(&settings).await,
        Command::Create(args) => commands::create::run(args, &settings).await,
        Command::Version => commands::version::run().await,
    }
}
