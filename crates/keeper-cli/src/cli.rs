//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Status Keeper - Keep mod variables in sync with the injection tool's saved state
#[derive(Parser, Debug)]
#[command(name = "keeper")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Mod library root (overrides `library_root`)
    #[arg(long, global = true, env = "KEEPER_LIBRARY")]
    pub library: Option<PathBuf>,

    /// Central state file (overrides `state_file`)
    #[arg(long, global = true, env = "KEEPER_STATE_FILE")]
    pub state_file: Option<PathBuf>,

    /// Directory holding the global config and the last sync summary
    #[arg(long, global = true, env = "KEEPER_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Confirm that the mod library is backed up
    #[arg(long, global = true)]
    pub i_have_backups: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run one sync pass now
    ///
    /// Reads the central state file and writes changed values into the
    /// reserved section of every addressed mod file.
    ///
    /// Examples:
    ///   keeper sync --library ./Mods
    ///   keeper sync --json
    Sync {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Keep syncing until interrupted
    ///
    /// Syncs whenever the central state file changes and on a fallback
    /// timer. Stop with Ctrl-C.
    Watch,

    /// Show the resolved configuration and the last sync
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}
