//! Watch command implementation
//!
//! Enables automatic syncing: the scheduler runs until Ctrl-C, then it is
//! stopped and the last summary is persisted.

use std::sync::Arc;

use colored::Colorize;
use keeper_core::{SyncEngine, SyncScheduler};
use tokio::runtime::Runtime;

use crate::context::CommandContext;
use crate::error::{CliError, Result};

/// Run the scheduler until interrupted.
pub fn run_watch(ctx: &CommandContext) -> Result<()> {
    ctx.require_backups()?;
    let settings = ctx.config.sync_settings(&ctx.cwd)?;
    let state_file = settings.state_file.clone();
    let engine = Arc::new(SyncEngine::new(settings));

    let runtime = Runtime::new()?;
    let mut scheduler = SyncScheduler::for_engine(engine.clone(), ctx.config.scheduler_settings(), runtime.handle().clone());
    scheduler.start()?;

    println!(
        "{} Watching {} (press {} to stop)",
        "=>".blue().bold(),
        state_file.display().to_string().cyan(),
        "Ctrl-C".bold()
    );

    let interrupted = runtime.block_on(tokio::signal::ctrl_c());
    scheduler.stop();

    let stats = scheduler.stats();
    tracing::info!(runs = stats.runs, skipped = stats.skipped, failures = stats.failures, "Auto-sync disabled");

    if let Some(last) = engine.last_sync() {
        ctx.save_last_sync(&last)?;
    }
    interrupted.map_err(|e| CliError::user(format!("Failed to listen for Ctrl-C: {e}")))?;

    println!(
        "{} Stopped after {} syncs",
        "OK".green().bold(),
        stats.runs
    );
    Ok(())
}
