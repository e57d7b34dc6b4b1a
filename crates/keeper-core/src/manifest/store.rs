//! Manifest persistence through the per-path access queue

use std::path::Path;
use std::sync::Arc;

use keeper_fs::{AccessQueue, ConfigStore, io};
use serde_json::Value;

use super::{Migration, ModManifest};
use crate::{Error, Result};

/// Reads and rewrites `mod.json` files.
///
/// Rewrites re-read the manifest while holding exclusive access to its path
/// and apply the migration to that fresh copy, so concurrent edits to
/// unrelated fields made by other writers are not lost.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    queue: Arc<AccessQueue>,
    store: ConfigStore,
}

impl Default for ManifestStore {
    /// A store sharing the process-wide access queue.
    fn default() -> Self {
        Self::new(AccessQueue::global())
    }
}

impl ManifestStore {
    pub fn new(queue: Arc<AccessQueue>) -> Self {
        Self {
            queue,
            store: ConfigStore::new(),
        }
    }

    /// Load a manifest.
    ///
    /// Parse failures are reported as [`Error::ManifestCorrupt`].
    pub fn load(&self, path: &Path) -> Result<ModManifest> {
        let value: Value = self.store.load(path).map_err(|e| match e {
            keeper_fs::Error::ConfigParse { path, message, .. } => {
                Error::ManifestCorrupt { path, message }
            }
            other => Error::Fs(other),
        })?;
        ModManifest::from_value(value, path)
    }

    /// Apply `migration` to the manifest at `path` under exclusive access.
    pub fn migrate(&self, path: &Path, migration: &Migration) -> Result<ModManifest> {
        self.queue.with_exclusive(path, || {
            let current = self.load(path)?;
            let updated = migration.apply(current);
            self.store.save(path, &updated.to_value())?;
            tracing::info!(
                path = %path.display(),
                migration = migration.describe(),
                "Rewrote mod manifest"
            );
            Ok(updated)
        })
    }
}
