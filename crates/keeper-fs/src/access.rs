//! Per-path serialized file access
//!
//! Every manifest mutation goes through an [`AccessQueue`] so two writers
//! never interleave on the same file, while work on unrelated paths
//! proceeds in parallel.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

/// Waits longer than this are reported at info level.
const SLOW_WAIT: Duration = Duration::from_millis(100);

/// Serializes access per file path.
///
/// Paths are keyed by their canonical, lowercased form so that two spellings
/// of the same file share one lock.
#[derive(Debug, Default)]
pub struct AccessQueue {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl AccessQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide queue shared by all manifest writers.
    pub fn global() -> Arc<AccessQueue> {
        static GLOBAL: OnceLock<Arc<AccessQueue>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(AccessQueue::new())))
    }

    /// Run `action` while holding exclusive access to `path`.
    ///
    /// Blocks until any other holder of the same path has finished.
    pub fn with_exclusive<T>(&self, path: &Path, action: impl FnOnce() -> T) -> T {
        let lock = self.lock_for(path);
        let started = Instant::now();
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let waited = started.elapsed();
        if waited > SLOW_WAIT {
            tracing::info!(
                path = %path.display(),
                waited_ms = waited.as_millis() as u64,
                "Acquired file access after waiting"
            );
        }

        action()
    }

    /// Number of distinct paths that have been accessed through this queue.
    pub fn tracked_paths(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let key = queue_key(path);
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(locks.entry(key).or_default())
    }
}

fn queue_key(path: &Path) -> PathBuf {
    let canonical = dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    PathBuf::from(canonical.to_string_lossy().to_lowercase())
}
