//! Status Keeper CLI
//!
//! Command-line host for the persistent variable sync: one-shot syncs, a
//! long-running watch mode and a status overview.

mod cli;
mod commands;
mod context;
mod error;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use context::CommandContext;
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;
    let ctx = CommandContext::resolve(&cwd, &cli)?;

    keeper_core::logging::init(cli.verbose, ctx.config.log_file.as_deref())
        .map_err(|e| CliError::user(format!("Failed to initialize logging: {e}")))?;
    tracing::debug!(cwd = %cwd.display(), "Resolved configuration");

    match cli.command {
        Some(cmd) => execute_command(cmd, &ctx),
        None => {
            println!("{} Status Keeper CLI", "keeper".green().bold());
            println!();
            println!("Run {} for available commands.", "keeper --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(cmd: Commands, ctx: &CommandContext) -> Result<()> {
    match cmd {
        Commands::Sync { json } => commands::run_sync(ctx, json).map(|_| ()),
        Commands::Watch => commands::run_watch(ctx),
        Commands::Status { json } => commands::run_status(ctx, json),
    }
}
