mod cli;
mod commands;
mod observability;
mod output;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Commands};
use output::print_error;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(false) => {}
        Ok(true) => std::process::exit(1),
        Err(e) => {
            print_error(&format!("{e:#}"));
            std::process::exit(2);
        }
    }
}

/// Runs the selected command. `Ok(true)` means the command completed but
/// found a failure worth a non-zero exit, such as a breaking change.
async fn run() -> Result<bool> {
    let cli = Cli::parse();
    observability::init_tracing(&cli.log_level)
        .context("Failed to install the log subscriber")?;

    match &cli.command {
        Commands::Diff(args) => commands::diff::diff(args),
        Commands::Demo(args) => commands::demo::demo(args).await,
    }
}
