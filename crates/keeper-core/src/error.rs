//! Error types for keeper-core

use std::path::PathBuf;

/// Result type for keeper-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in keeper-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The central state file does not exist
    #[error("Central state file not found at {path}")]
    StateFileMissing { path: PathBuf },

    /// The central state file exists but could not be read
    #[error("Failed to read central state file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    /// No central state file path was configured or discovered
    #[error("No central state file configured and none found at the default locations")]
    StateFileNotConfigured,

    /// A mod manifest is not a structured record
    #[error("Manifest {path} is corrupt: {message}")]
    ManifestCorrupt { path: PathBuf, message: String },

    /// The mod library root is not set or not a directory
    #[error("Mod library not found at {path}")]
    LibraryNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// Sync was requested before the user confirmed having backups
    #[error("Backups have not been confirmed; set `backup_confirmed = true` to allow syncing")]
    BackupNotConfirmed,

    /// Filesystem error from keeper-fs
    #[error(transparent)]
    Fs(#[from] keeper_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    /// File watcher error
    #[error(transparent)]
    Watch(#[from] notify::Error),
}
