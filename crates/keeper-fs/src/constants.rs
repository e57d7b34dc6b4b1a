//! Well-known names inside a mod library.

use std::path::Path;

/// Fixed file and folder names Status Keeper relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeeperPath {
    /// Per-mod manifest (`mod.json`)
    Manifest,
    /// Central state file written by the injection tool (`d3dx_user.ini`)
    StateFile,
    /// Local settings override (`status-keeper.toml`)
    LocalConfig,
    /// Directory name below the platform config dir (`status-keeper`)
    AppDir,
}

impl KeeperPath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manifest => "mod.json",
            Self::StateFile => "d3dx_user.ini",
            Self::LocalConfig => "status-keeper.toml",
            Self::AppDir => "status-keeper",
        }
    }
}

impl AsRef<Path> for KeeperPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for KeeperPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for KeeperPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
