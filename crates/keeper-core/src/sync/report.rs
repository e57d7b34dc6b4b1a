//! Sync results and the last-sync summary

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate counters of one sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    /// Variable lines whose value changed
    pub updated_variables: usize,
    /// Main files rewritten
    pub updated_files: usize,
    /// Variant files rewritten by propagation
    pub propagated_variants: usize,
}

impl SyncResult {
    /// Whether the run changed nothing on disk.
    pub fn is_empty(&self) -> bool {
        self.updated_variables == 0 && self.updated_files == 0 && self.propagated_variants == 0
    }
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} variables in {} files",
            self.updated_variables, self.updated_files
        )?;
        if self.propagated_variants > 0 {
            write!(f, ", {} variant files synced", self.propagated_variants)?;
        }
        Ok(())
    }
}

/// What started a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Manual,
    FileChange,
    Periodic,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::FileChange => "file change",
            Self::Periodic => "periodic",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    Completed(SyncResult),
    Failed { message: String },
}

/// Summary of the most recent run, readable by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastSync {
    pub at: DateTime<Utc>,
    pub trigger: Trigger,
    pub outcome: SyncOutcome,
}

impl LastSync {
    pub fn completed(trigger: Trigger, result: SyncResult) -> Self {
        Self {
            at: Utc::now(),
            trigger,
            outcome: SyncOutcome::Completed(result),
        }
    }

    pub fn failed(trigger: Trigger, message: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            trigger,
            outcome: SyncOutcome::Failed {
                message: message.into(),
            },
        }
    }

    pub fn result(&self) -> Option<&SyncResult> {
        match &self.outcome {
            SyncOutcome::Completed(result) => Some(result),
            SyncOutcome::Failed { .. } => None,
        }
    }
}
