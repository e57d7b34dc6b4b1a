//! Per-invocation command context
//!
//! Resolves the layered configuration once, applies command-line flags as the
//! final layer and knows where the last sync summary is persisted.

use std::path::{Path, PathBuf};

use keeper_core::{ConfigLayer, ConfigResolver, Error, KeeperConfig, LastSync};
use keeper_fs::ConfigStore;

use crate::cli::Cli;
use crate::error::Result;

/// File holding the summary of the most recent sync
pub const LAST_SYNC_FILE: &str = "last_sync.json";

/// Everything a command needs to know about its environment.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Directory the command was invoked from
    pub cwd: PathBuf,
    /// Fully resolved settings, flags included
    pub config: KeeperConfig,
    /// Global config directory, when one could be determined
    pub config_dir: Option<PathBuf>,
    /// Local override file, when present
    pub local_config: Option<PathBuf>,
}

impl CommandContext {
    /// Resolve settings for `cwd`, then apply the flags in `cli`.
    pub fn resolve(cwd: &Path, cli: &Cli) -> Result<Self> {
        let resolver = match &cli.config_dir {
            Some(dir) => ConfigResolver::with_global_config_dir(cwd, dir.clone()),
            None => ConfigResolver::new(cwd),
        };

        let mut config = resolver.resolve()?;
        config.apply(flag_layer(cli), cwd);

        Ok(Self {
            cwd: cwd.to_path_buf(),
            config,
            config_dir: resolver.global_config_dir(),
            local_config: resolver
                .has_local_config()
                .then(|| resolver.local_config_path()),
        })
    }

    /// Refuse to touch the library until backups are confirmed.
    pub fn require_backups(&self) -> Result<()> {
        if self.config.backup_confirmed {
            Ok(())
        } else {
            Err(Error::BackupNotConfirmed.into())
        }
    }

    /// Where the last sync summary lives.
    ///
    /// Falls back to the working directory when the platform has no config
    /// directory.
    pub fn last_sync_path(&self) -> PathBuf {
        self.config_dir
            .as_deref()
            .unwrap_or(&self.cwd)
            .join(LAST_SYNC_FILE)
    }

    /// Load the persisted summary, if any.
    pub fn load_last_sync(&self) -> Result<Option<LastSync>> {
        let path = self.last_sync_path();
        match ConfigStore::new().load(&path) {
            Ok(last) => Ok(Some(last)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist `last` for later `status` calls.
    pub fn save_last_sync(&self, last: &LastSync) -> Result<()> {
        let path = self.last_sync_path();
        ConfigStore::new().save(&path, last)?;
        tracing::debug!(path = %path.display(), "Saved last sync summary");
        Ok(())
    }
}

/// Command-line flags as the highest-priority configuration layer.
fn flag_layer(cli: &Cli) -> ConfigLayer {
    ConfigLayer {
        library_root: cli.library.clone(),
        state_file: cli.state_file.clone(),
        backup_confirmed: cli.i_have_backups.then_some(true),
        ..ConfigLayer::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use keeper_core::{SyncResult, Trigger};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["keeper"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn flags_override_local_config() {
        let cwd = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        std::fs::write(
            cwd.path().join("status-keeper.toml"),
            "library_root = \"Local/Mods\"\nvariant_marker = \"_variant\"\n",
        )
        .unwrap();
        let global_arg = global.path().to_string_lossy().into_owned();

        let ctx = CommandContext::resolve(
            cwd.path(),
            &cli(&["--config-dir", &global_arg, "--library", "Flag/Mods", "status"]),
        )
        .unwrap();

        assert_eq!(ctx.config.library_root, Some(cwd.path().join("Flag/Mods")));
        assert_eq!(ctx.config.variant_marker, "_variant");
        assert_eq!(ctx.local_config, Some(cwd.path().join("status-keeper.toml")));
        assert_eq!(ctx.config_dir, Some(global.path().to_path_buf()));
    }

    #[test]
    fn backup_gate_follows_config_and_flag() {
        let cwd = TempDir::new().unwrap();
        let global_arg = cwd.path().join("global").to_string_lossy().into_owned();

        let without = CommandContext::resolve(cwd.path(), &cli(&["--config-dir", &global_arg, "sync"])).unwrap();
        assert!(without.require_backups().is_err());

        let with = CommandContext::resolve(
            cwd.path(),
            &cli(&["--config-dir", &global_arg, "--i-have-backups", "sync"]),
        )
        .unwrap();
        assert!(with.require_backups().is_ok());
    }

    #[test]
    fn last_sync_is_persisted_and_reloaded() {
        let cwd = TempDir::new().unwrap();
        let global_arg = cwd.path().join("global").to_string_lossy().into_owned();
        let ctx = CommandContext::resolve(cwd.path(), &cli(&["--config-dir", &global_arg, "status"])).unwrap();

        assert_eq!(ctx.load_last_sync().unwrap(), None);

        let last = LastSync::completed(
            Trigger::Manual,
            SyncResult {
                updated_variables: 2,
                updated_files: 1,
                propagated_variants: 0,
            },
        );
        ctx.save_last_sync(&last).unwrap();

        assert_eq!(ctx.last_sync_path(), cwd.path().join("global").join(LAST_SYNC_FILE));
        assert_eq!(ctx.load_last_sync().unwrap(), Some(last));
    }
}
