//! Sync command implementation

use colored::Colorize;
use keeper_core::{SyncEngine, SyncResult};

use crate::context::CommandContext;
use crate::error::Result;

/// Run one manual sync pass.
///
/// The summary is persisted whether the pass succeeds or not, so `status`
/// can report the failure afterwards.
pub fn run_sync(ctx: &CommandContext, json: bool) -> Result<SyncResult> {
    ctx.require_backups()?;
    let settings = ctx.config.sync_settings(&ctx.cwd)?;

    if !json {
        println!(
            "{} Syncing {} into {}",
            "=>".blue().bold(),
            settings.state_file.display().to_string().cyan(),
            settings.library_root.display().to_string().cyan()
        );
    }

    let engine = SyncEngine::new(settings);
    let outcome = engine.sync();
    if let Some(last) = engine.last_sync() {
        ctx.save_last_sync(&last)?;
    }
    let result = outcome?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }

    Ok(result)
}

fn print_result(result: &SyncResult) {
    if result.is_empty() {
        println!("{} Everything is already in sync.", "OK".green().bold());
        return;
    }

    println!(
        "{} Updated {} variables in {} files",
        "OK".green().bold(),
        result.updated_variables.to_string().bold(),
        result.updated_files.to_string().bold()
    );
    if result.propagated_variants > 0 {
        println!(
            "   {} {} variant files synced",
            "+".green(),
            result.propagated_variants
        );
    }
}
