//! Configuration resolution with layered overrides
//!
//! The `ConfigResolver` loads and merges settings from multiple sources,
//! with later sources overriding earlier ones.

use std::fs;
use std::path::{Path, PathBuf};

use keeper_fs::KeeperPath;

use super::settings::{ConfigLayer, KeeperConfig};
use crate::Result;

/// Resolves settings by merging multiple sources
///
/// Settings are loaded from:
/// 1. Built-in defaults
/// 2. Global config (`<config_dir>/status-keeper/config.toml`)
/// 3. Local overrides (`./status-keeper.toml`)
///
/// Command-line flags are applied by the caller on top of the result.
pub struct ConfigResolver {
    /// Working directory holding the local override
    cwd: PathBuf,

    /// Override for the global config directory (used for testing).
    /// When `None`, the platform-appropriate directory is used via `dirs::config_dir()`.
    global_config_dir_override: Option<PathBuf>,
}

impl ConfigResolver {
    /// Create a resolver for the given working directory
    ///
    /// Uses the platform-appropriate global config directory:
    /// - Linux: `~/.config/status-keeper/`
    /// - macOS: `~/Library/Application Support/status-keeper/`
    /// - Windows: `%APPDATA%\status-keeper\`
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            global_config_dir_override: None,
        }
    }

    /// Create a resolver with a custom global config directory.
    pub fn with_global_config_dir(cwd: impl Into<PathBuf>, global_config_dir: PathBuf) -> Self {
        Self {
            cwd: cwd.into(),
            global_config_dir_override: Some(global_config_dir),
        }
    }

    /// Determine the global config directory path.
    pub fn global_config_dir(&self) -> Option<PathBuf> {
        if let Some(ref override_dir) = self.global_config_dir_override {
            return Some(override_dir.clone());
        }
        dirs::config_dir().map(|d| d.join(KeeperPath::AppDir.as_str()))
    }

    /// Path of the local override file.
    pub fn local_config_path(&self) -> PathBuf {
        self.cwd.join(KeeperPath::LocalConfig.as_str())
    }

    /// Check if a local override exists
    pub fn has_local_config(&self) -> bool {
        self.local_config_path().is_file()
    }

    /// The working directory this resolver was created for
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Resolve the configuration by merging all sources
    ///
    /// Missing layers are silently skipped. Invalid TOML in any layer
    /// produces an error.
    pub fn resolve(&self) -> Result<KeeperConfig> {
        let mut config = KeeperConfig::default();

        if let Some(global_dir) = self.global_config_dir() {
            let global_config_path = global_dir.join("config.toml");
            if global_config_path.is_file() {
                tracing::debug!(?global_config_path, "Loading global config");
                let content = fs::read_to_string(&global_config_path)?;
                config.apply(ConfigLayer::parse(&content)?, &global_dir);
            } else {
                tracing::debug!(?global_config_path, "No global config found, skipping");
            }
        }

        let local_config_path = self.local_config_path();
        if local_config_path.is_file() {
            tracing::debug!(?local_config_path, "Loading local config");
            let content = fs::read_to_string(&local_config_path)?;
            config.apply(ConfigLayer::parse(&content)?, &self.cwd);
        }

        Ok(config)
    }
}
