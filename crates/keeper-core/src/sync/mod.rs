//! Sync orchestration
//!
//! A pass reads the central state file, rebuilds the namespace index (which
//! may migrate manifests), patches every resolved target file and pushes
//! changed reserved sections into variant files.

mod engine;
mod report;

pub use engine::{SyncEngine, SyncSettings};
pub use report::{LastSync, SyncOutcome, SyncResult, Trigger};
