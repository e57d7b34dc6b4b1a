//! Status command implementation

use std::path::Path;

use colored::Colorize;
use keeper_core::{KeeperConfig, LastSync, SyncOutcome};
use serde::Serialize;

use crate::context::CommandContext;
use crate::error::Result;

/// Machine-readable status.
#[derive(Debug, Serialize)]
struct StatusReport<'a> {
    config: &'a KeeperConfig,
    state_file: Option<&'a Path>,
    last_sync: Option<&'a LastSync>,
}

/// Run the status command
pub fn run_status(ctx: &CommandContext, json: bool) -> Result<()> {
    let last = ctx.load_last_sync()?;
    let state_file = ctx.config.locate_state_file(&ctx.cwd);

    if json {
        let report = StatusReport {
            config: &ctx.config,
            state_file: state_file.as_deref(),
            last_sync: last.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Status Keeper".bold());
    println!();

    let config = &ctx.config;
    println!("{}:      {}", "Library".dimmed(), display_or_unset(config.library_root.as_deref()));
    match &state_file {
        Some(path) => println!("{}:   {}", "State file".dimmed(), path.display().to_string().cyan()),
        None => println!("{}:   {}", "State file".dimmed(), "not found".yellow()),
    }
    println!("{}:      {}", "Section".dimmed(), config.reserved_section.cyan());
    println!("{}:     {}", "Variants".dimmed(), config.variant_marker.cyan());
    println!(
        "{}:      {}",
        "Backups".dimmed(),
        if config.backup_confirmed {
            "confirmed".green()
        } else {
            "not confirmed".yellow()
        }
    );
    if let Some(local) = &ctx.local_config {
        println!("{}: {}", "Local config".dimmed(), local.display());
    }
    println!();

    println!("{}:", "Last Sync".bold());
    match &last {
        None => println!("  {} (use {} to run one)", "Never".dimmed(), "keeper sync".cyan()),
        Some(last) => {
            let when = last.at.format("%Y-%m-%d %H:%M:%S UTC");
            match &last.outcome {
                SyncOutcome::Completed(result) => {
                    println!("  {} {} ({}, {})", "+".green(), result, last.trigger, when)
                }
                SyncOutcome::Failed { message } => {
                    println!("  {} {} ({}, {})", "!".red(), message.red(), last.trigger, when)
                }
            }
        }
    }

    Ok(())
}

fn display_or_unset(path: Option<&Path>) -> colored::ColoredString {
    match path {
        Some(path) => path.display().to_string().cyan(),
        None => "not set".yellow(),
    }
}
