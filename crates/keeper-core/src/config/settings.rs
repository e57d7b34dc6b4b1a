//! Status Keeper settings
//!
//! Settings are read from TOML layers (see [`super::ConfigResolver`]). Every
//! field is optional inside a layer so that a later layer only overrides what
//! it actually mentions.

use std::path::{Path, PathBuf};
use std::time::Duration;

use keeper_fs::KeeperPath;
use serde::{Deserialize, Serialize};

use crate::scheduler::SchedulerSettings;
use crate::sync::SyncSettings;
use crate::{Error, Result};

const DEFAULT_GAME: &str = "ZZMI";
const DEFAULT_SECTION: &str = "Constants";
const DEFAULT_VARIANT_MARKER: &str = "_lod";
const DEFAULT_DISABLED_PREFIX: &str = "DISABLED_";
const DEFAULT_DEBOUNCE_MS: u64 = 100;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeeperConfig {
    /// Root of the mod library (`<root>/<category>/<mod>`)
    pub library_root: Option<PathBuf>,
    /// Explicit path of the central state file
    pub state_file: Option<PathBuf>,
    /// Game profile used to derive the default state file location
    pub game: String,
    /// Name of the section that is read and written in target files
    pub reserved_section: String,
    /// Case-insensitive filename marker identifying variant files
    pub variant_marker: String,
    /// Folder-name prefix marking a disabled mod
    pub disabled_prefix: String,
    /// Delay applied after a change notification before syncing
    pub debounce_ms: u64,
    /// Interval of the fallback polling timer
    pub poll_interval_secs: u64,
    /// Whether the user confirmed they have backups of their mods
    pub backup_confirmed: bool,
    /// Optional dedicated log file
    pub log_file: Option<PathBuf>,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            library_root: None,
            state_file: None,
            game: DEFAULT_GAME.to_string(),
            reserved_section: DEFAULT_SECTION.to_string(),
            variant_marker: DEFAULT_VARIANT_MARKER.to_string(),
            disabled_prefix: DEFAULT_DISABLED_PREFIX.to_string(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            backup_confirmed: false,
            log_file: None,
        }
    }
}

/// One TOML layer; absent keys leave the lower layer untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    pub library_root: Option<PathBuf>,
    pub state_file: Option<PathBuf>,
    pub game: Option<String>,
    pub reserved_section: Option<String>,
    pub variant_marker: Option<String>,
    pub disabled_prefix: Option<String>,
    pub debounce_ms: Option<u64>,
    pub poll_interval_secs: Option<u64>,
    pub backup_confirmed: Option<bool>,
    pub log_file: Option<PathBuf>,
}

impl ConfigLayer {
    /// Parse a layer from TOML content
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

impl KeeperConfig {
    /// Apply a layer on top of this configuration.
    ///
    /// Relative paths in the layer are taken relative to `base`, the
    /// directory the layer was loaded from.
    pub fn apply(&mut self, layer: ConfigLayer, base: &Path) {
        let anchor = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };

        if let Some(root) = layer.library_root {
            self.library_root = Some(anchor(root));
        }
        if let Some(state) = layer.state_file {
            self.state_file = Some(anchor(state));
        }
        if let Some(game) = layer.game {
            self.game = game;
        }
        if let Some(section) = layer.reserved_section {
            self.reserved_section = section;
        }
        if let Some(marker) = layer.variant_marker {
            self.variant_marker = marker;
        }
        if let Some(prefix) = layer.disabled_prefix {
            self.disabled_prefix = prefix;
        }
        if let Some(ms) = layer.debounce_ms {
            self.debounce_ms = ms;
        }
        if let Some(secs) = layer.poll_interval_secs {
            self.poll_interval_secs = secs;
        }
        if let Some(confirmed) = layer.backup_confirmed {
            self.backup_confirmed = confirmed;
        }
        if let Some(log) = layer.log_file {
            self.log_file = Some(anchor(log));
        }
    }

    /// Candidate locations of the central state file, in priority order.
    ///
    /// The explicit setting comes first, then the file next to the mod
    /// library, then the loader's per-game directory below `cwd`.
    pub fn state_file_candidates(&self, cwd: &Path) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(explicit) = &self.state_file {
            candidates.push(explicit.clone());
        }
        if let Some(parent) = self.library_root.as_deref().and_then(Path::parent) {
            candidates.push(parent.join(KeeperPath::StateFile.as_str()));
        }
        candidates.push(
            cwd.join("XXMI")
                .join(&self.game)
                .join(KeeperPath::StateFile.as_str()),
        );
        candidates
    }

    /// Locate the central state file.
    pub fn locate_state_file(&self, cwd: &Path) -> Option<PathBuf> {
        let candidates = self.state_file_candidates(cwd);
        let found = candidates.iter().find(|p| p.is_file()).cloned();
        match &found {
            Some(path) => tracing::debug!(path = %path.display(), "Found central state file"),
            None => tracing::warn!(?candidates, "Central state file not found at any expected location"),
        }
        found
    }

    /// Build engine settings.
    ///
    /// When no state file can be located the explicit setting (or the first
    /// default candidate) is used anyway; the engine reports it as missing on
    /// each run instead of refusing to start.
    pub fn sync_settings(&self, cwd: &Path) -> Result<SyncSettings> {
        let library_root = self.library_root.clone().ok_or_else(|| Error::Config {
            message: "library_root is not set".to_string(),
        })?;
        if self.reserved_section.trim().is_empty() {
            return Err(Error::Config {
                message: "reserved_section must not be empty".to_string(),
            });
        }
        if self.variant_marker.trim().is_empty() {
            return Err(Error::Config {
                message: "variant_marker must not be empty".to_string(),
            });
        }

        let state_file = self
            .locate_state_file(cwd)
            .or_else(|| self.state_file_candidates(cwd).into_iter().next())
            .ok_or(Error::StateFileNotConfigured)?;

        Ok(SyncSettings {
            library_root,
            state_file,
            reserved_section: self.reserved_section.clone(),
            variant_marker: self.variant_marker.clone(),
            disabled_prefix: self.disabled_prefix.clone(),
        })
    }

    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            debounce: Duration::from_millis(self.debounce_ms),
            poll_interval: Duration::from_secs(self.poll_interval_secs.max(1)),
        }
    }
}
