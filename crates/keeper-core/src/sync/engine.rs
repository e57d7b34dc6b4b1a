//! The sync pipeline

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::time::Instant;

use keeper_fs::io;

use super::report::{LastSync, SyncResult, Trigger};
use crate::ini::{is_variant_file, patch_file, propagate_to_variants};
use crate::manifest::ManifestStore;
use crate::parser::{PendingUpdates, StateParser};
use crate::registry::{ManifestRegistry, ModLibrary};
use crate::{Error, Result};

/// Everything a [`SyncEngine`] needs to know about its environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub library_root: PathBuf,
    pub state_file: PathBuf,
    /// Section read and written in target files
    pub reserved_section: String,
    /// Filename marker of variant files
    pub variant_marker: String,
    /// Folder-name prefix of disabled mods
    pub disabled_prefix: String,
}

impl SyncSettings {
    /// Settings with the default section, marker and prefix.
    pub fn new(library_root: impl Into<PathBuf>, state_file: impl Into<PathBuf>) -> Self {
        Self {
            library_root: library_root.into(),
            state_file: state_file.into(),
            reserved_section: "Constants".to_string(),
            variant_marker: "_lod".to_string(),
            disabled_prefix: "DISABLED_".to_string(),
        }
    }

    pub fn with_variant_marker(mut self, marker: impl Into<String>) -> Self {
        self.variant_marker = marker.into();
        self
    }
}

/// Runs sync passes for one mod library.
///
/// At most one pass runs at a time. [`SyncEngine::sync`] waits for a running
/// pass to finish; [`SyncEngine::try_sync`] gives up immediately instead.
#[derive(Debug)]
pub struct SyncEngine {
    settings: SyncSettings,
    store: ManifestStore,
    running: Mutex<()>,
    last: Mutex<Option<LastSync>>,
}

impl SyncEngine {
    pub fn new(settings: SyncSettings) -> Self {
        Self::with_store(settings, ManifestStore::default())
    }

    /// Use a specific manifest store (and thereby access queue).
    pub fn with_store(settings: SyncSettings, store: ManifestStore) -> Self {
        Self {
            settings,
            store,
            running: Mutex::new(()),
            last: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Run a manual sync, waiting for any pass in progress.
    ///
    /// # Errors
    ///
    /// Fails only when the central state file is missing or unreadable.
    /// Problems with individual mods or files are logged and skipped.
    pub fn sync(&self) -> Result<SyncResult> {
        self.sync_with(Trigger::Manual)
    }

    /// Like [`SyncEngine::sync`] but records `trigger` in the summary.
    pub fn sync_with(&self, trigger: Trigger) -> Result<SyncResult> {
        let _guard = recover(self.running.lock());
        self.run(trigger)
    }

    /// Run a sync unless one is already in progress.
    ///
    /// Returns `None` when skipped.
    pub fn try_sync(&self, trigger: Trigger) -> Option<Result<SyncResult>> {
        let _guard = match self.running.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                tracing::debug!(%trigger, "Sync already running, skipping");
                return None;
            }
        };
        Some(self.run(trigger))
    }

    /// Summary of the most recent pass.
    pub fn last_sync(&self) -> Option<LastSync> {
        recover(self.last.lock()).clone()
    }

    fn run(&self, trigger: Trigger) -> Result<SyncResult> {
        let started = Instant::now();
        let outcome = self.pipeline();

        let summary = match &outcome {
            Ok(result) => {
                tracing::debug!(
                    %trigger,
                    variables = result.updated_variables,
                    files = result.updated_files,
                    variants = result.propagated_variants,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Sync pass finished"
                );
                LastSync::completed(trigger, *result)
            }
            Err(e) => LastSync::failed(trigger, e.to_string()),
        };
        *recover(self.last.lock()) = Some(summary);
        outcome
    }

    fn pipeline(&self) -> Result<SyncResult> {
        let settings = &self.settings;
        let state_text = read_state_file(&settings.state_file)?;

        let library = ModLibrary::scan(&settings.library_root, &settings.disabled_prefix, &self.store)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Mod library unavailable, continuing without it");
                ModLibrary::empty(&settings.library_root, &settings.disabled_prefix)
            });

        let registry = ManifestRegistry::new(&library, &self.store, &settings.variant_marker);
        let (index, report) = registry.build_index();
        if !report.corrupt.is_empty() {
            tracing::warn!(count = report.corrupt.len(), "Some manifests were excluded as corrupt");
        }

        let parsed = StateParser::new(&index, &library).parse(&state_text);
        if parsed.updates.is_empty() {
            return Ok(SyncResult::default());
        }

        let targets = self.resolve_targets(&library, parsed.updates);
        let mut result = SyncResult::default();
        let mut modified = Vec::new();

        for (path, variables) in &targets {
            match patch_file(path, &settings.reserved_section, variables) {
                Ok(outcome) if outcome.modified => {
                    tracing::info!(path = %path.display(), updates = outcome.updates, "Updated variables");
                    result.updated_variables += outcome.updates;
                    result.updated_files += 1;
                    modified.push(path);
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to update file"),
            }
        }

        for main in modified {
            match propagate_to_variants(main, &settings.reserved_section, &settings.variant_marker) {
                Ok(count) => result.propagated_variants += count,
                Err(e) => tracing::warn!(path = %main.display(), error = %e, "Failed to propagate to variants"),
            }
        }

        Ok(result)
    }

    /// Map target keys to concrete files, merging keys that resolve to the
    /// same file and dropping variants and unresolvable keys.
    fn resolve_targets(
        &self,
        library: &ModLibrary,
        updates: PendingUpdates,
    ) -> BTreeMap<PathBuf, BTreeMap<String, String>> {
        let mut targets: BTreeMap<PathBuf, BTreeMap<String, String>> = BTreeMap::new();

        for (key, variables) in updates {
            let Some(path) = library.resolve(&key) else {
                tracing::debug!(%key, "Target file not found");
                continue;
            };
            if !library.allows_sync(&path) {
                tracing::debug!(path = %path.display(), "Skipping file of a disabled mod");
                continue;
            }
            let is_variant = path
                .file_name()
                .is_some_and(|name| is_variant_file(&name.to_string_lossy(), &self.settings.variant_marker));
            if is_variant {
                tracing::debug!(path = %path.display(), "Skipping variant file as a direct target");
                continue;
            }
            targets.entry(path).or_default().extend(variables);
        }
        targets
    }
}

fn read_state_file(path: &Path) -> Result<String> {
    io::read_text(path).map_err(|e| {
        if e.is_not_found() {
            Error::StateFileMissing {
                path: path.to_path_buf(),
            }
        } else {
            Error::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        }
    })
}

fn recover<'a, T>(result: std::sync::LockResult<MutexGuard<'a, T>>) -> MutexGuard<'a, T> {
    result.unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn missing_state_file_is_reported_and_remembered() {
        let temp = TempDir::new().unwrap();
        let engine = SyncEngine::new(SyncSettings::new(temp.path(), temp.path().join("d3dx_user.ini")));

        let err = engine.sync().unwrap_err();

        assert!(matches!(err, Error::StateFileMissing { .. }));
        let last = engine.last_sync().unwrap();
        assert_eq!(last.trigger, Trigger::Manual);
        assert!(last.result().is_none());
    }

    #[test]
    fn empty_state_file_gives_zero_result() {
        let temp = TempDir::new().unwrap();
        let state = temp.path().join("d3dx_user.ini");
        std::fs::write(&state, "; nothing here\n").unwrap();

        let engine = SyncEngine::new(SyncSettings::new(temp.path(), &state));

        assert_eq!(engine.sync().unwrap(), SyncResult::default());
    }

    #[test]
    fn try_sync_skips_while_a_pass_is_running() {
        let temp = TempDir::new().unwrap();
        let engine = Arc::new(SyncEngine::new(SyncSettings::new(temp.path(), temp.path().join("x.ini"))));

        let guard = engine.running.lock().unwrap();
        assert!(engine.try_sync(Trigger::Periodic).is_none());
        drop(guard);

        assert!(engine.try_sync(Trigger::Periodic).is_some());
    }
}
