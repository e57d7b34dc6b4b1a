//! Mod library enumeration
//!
//! A library is laid out as `<root>/<category>/<mod folder>`. Folders are
//! visited in lexicographic order so that every run sees mods in the same
//! sequence regardless of how the filesystem enumerates them.

use std::fs;
use std::path::{Path, PathBuf};

use keeper_fs::{KeeperPath, VirtualPath, resolve_case_insensitive};

use crate::manifest::{ManifestStore, ModManifest};
use crate::{Error, Result};

/// State of a mod's `mod.json`.
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestState {
    Missing,
    Loaded(ModManifest),
    /// Unreadable this run; the mod contributes no namespaces
    Corrupt(String),
}

/// One mod folder.
#[derive(Debug, Clone, PartialEq)]
pub struct ModEntry {
    pub category: String,
    pub folder: String,
    pub dir: PathBuf,
    pub manifest_path: PathBuf,
    pub manifest: ManifestState,
    /// Folder name carries the disabled prefix
    pub disabled_by_folder: bool,
}

impl ModEntry {
    /// Sync is enabled unless the folder is disabled or the manifest opts out.
    ///
    /// A corrupt manifest does not disable sync; it only excludes the mod
    /// from namespace registration.
    pub fn sync_enabled(&self) -> bool {
        if self.disabled_by_folder {
            return false;
        }
        match &self.manifest {
            ManifestState::Loaded(manifest) => manifest.sync_enabled(),
            ManifestState::Missing | ManifestState::Corrupt(_) => true,
        }
    }

    /// Resolve a path relative to this mod's folder, ignoring case.
    pub fn resolve(&self, relative: &VirtualPath) -> Option<PathBuf> {
        resolve_case_insensitive(&self.dir, relative)
    }
}

/// Snapshot of the mod folders under a library root.
#[derive(Debug, Clone)]
pub struct ModLibrary {
    root: PathBuf,
    disabled_prefix: String,
    mods: Vec<ModEntry>,
}

impl ModLibrary {
    /// A library with no mods, used when the root cannot be scanned.
    pub fn empty(root: impl Into<PathBuf>, disabled_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            disabled_prefix: disabled_prefix.into(),
            mods: Vec::new(),
        }
    }

    /// Scan `root` two levels deep and load every manifest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LibraryNotFound`] when `root` is not a directory.
    /// Problems below the root (unreadable category, corrupt manifest) are
    /// logged and recorded per mod instead.
    pub fn scan(root: &Path, disabled_prefix: &str, store: &ManifestStore) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::LibraryNotFound {
                path: root.to_path_buf(),
            });
        }

        let mut library = Self::empty(root, disabled_prefix);
        for category_dir in sorted_subdirs(root) {
            let category = dir_name(&category_dir);
            for mod_dir in sorted_subdirs(&category_dir) {
                let entry = library.load_entry(&category, mod_dir, store);
                library.mods.push(entry);
            }
        }

        tracing::debug!(root = %root.display(), mods = library.mods.len(), "Scanned mod library");
        Ok(library)
    }

    fn load_entry(&self, category: &str, dir: PathBuf, store: &ManifestStore) -> ModEntry {
        let folder = dir_name(&dir);
        let manifest_path = dir.join(KeeperPath::Manifest.as_str());
        let disabled_by_folder = self.has_disabled_prefix(&folder);

        let manifest = if disabled_by_folder || !manifest_path.is_file() {
            ManifestState::Missing
        } else {
            match store.load(&manifest_path) {
                Ok(manifest) => ManifestState::Loaded(manifest),
                Err(e) => {
                    tracing::warn!(
                        path = %manifest_path.display(),
                        error = %e,
                        "Excluding mod with unreadable manifest from this run"
                    );
                    ManifestState::Corrupt(e.to_string())
                }
            }
        };

        ModEntry {
            category: category.to_string(),
            folder,
            dir,
            manifest_path,
            manifest,
            disabled_by_folder,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All mods in (category, folder) order.
    pub fn mods(&self) -> &[ModEntry] {
        &self.mods
    }

    /// Mods that take part in syncing.
    pub fn enabled(&self) -> impl Iterator<Item = &ModEntry> {
        self.mods.iter().filter(|m| m.sync_enabled())
    }

    /// Find a mod by folder name, exactly and then ignoring case.
    ///
    /// When categories contain folders of the same name the first in
    /// (category, folder) order wins.
    pub fn find_mod(&self, folder: &str) -> Option<&ModEntry> {
        self.mods
            .iter()
            .find(|m| m.folder == folder)
            .or_else(|| self.mods.iter().find(|m| m.folder.eq_ignore_ascii_case(folder)))
    }

    /// Whether entries addressed to `folder` may be synced.
    ///
    /// Unknown folders count as enabled; they simply fail to resolve later.
    pub fn is_sync_enabled(&self, folder: &str) -> bool {
        if self.has_disabled_prefix(folder) {
            return false;
        }
        self.find_mod(folder).is_none_or(ModEntry::sync_enabled)
    }

    /// Resolve a library-relative key to a concrete file.
    ///
    /// `<root>/<key>` is tried first. Otherwise the key's first segment names
    /// a mod folder and the rest is resolved inside that mod, wherever its
    /// category is.
    pub fn resolve(&self, key: &VirtualPath) -> Option<PathBuf> {
        if let Some(found) = resolve_case_insensitive(&self.root, key) {
            return Some(found);
        }

        let folder = key.first_segment()?;
        let entry = self.find_mod(folder)?;
        let rest = VirtualPath::new(key.segments().skip(1).collect::<Vec<_>>().join("/"));
        entry.resolve(&rest)
    }

    /// Whether a resolved file may be written.
    ///
    /// The file's owning mod decides. A file outside every scanned mod is
    /// refused when any folder between the root and the file carries the
    /// disabled prefix.
    pub fn allows_sync(&self, path: &Path) -> bool {
        if let Some(owner) = self.mods.iter().find(|m| path.starts_with(&m.dir)) {
            return owner.sync_enabled();
        }
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return true;
        };
        let folders = relative.parent().map(Path::components).into_iter().flatten();
        !folders
            .map(|c| c.as_os_str().to_string_lossy())
            .any(|name| self.has_disabled_prefix(&name))
    }

    fn has_disabled_prefix(&self, folder: &str) -> bool {
        let prefix = &self.disabled_prefix;
        !prefix.is_empty()
            && folder.len() >= prefix.len()
            && folder.is_char_boundary(prefix.len())
            && folder[..prefix.len()].eq_ignore_ascii_case(prefix)
    }
}

fn sorted_subdirs(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "Cannot list directory");
            return Vec::new();
        }
    };

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    dirs
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_mod(root: &Path, category: &str, folder: &str, manifest: Option<&str>) {
        let dir = root.join(category).join(folder);
        fs::create_dir_all(&dir).unwrap();
        if let Some(json) = manifest {
            fs::write(dir.join("mod.json"), json).unwrap();
        }
    }

    #[test]
    fn scan_orders_by_category_then_folder() {
        let temp = TempDir::new().unwrap();
        make_mod(temp.path(), "Weapons", "Blade", None);
        make_mod(temp.path(), "Characters", "Zed", None);
        make_mod(temp.path(), "Characters", "Anna", None);

        let library = ModLibrary::scan(temp.path(), "DISABLED_", &ManifestStore::default()).unwrap();
        let order: Vec<_> = library.mods().iter().map(|m| m.folder.as_str()).collect();

        assert_eq!(order, vec!["Anna", "Zed", "Blade"]);
    }

    #[test]
    fn disabled_by_prefix_or_flag() {
        let temp = TempDir::new().unwrap();
        make_mod(temp.path(), "C", "DISABLED_Old", None);
        make_mod(temp.path(), "C", "OptOut", Some(r#"{"statusKeeperSync": false}"#));
        make_mod(temp.path(), "C", "Active", Some(r#"{"statusKeeperSync": true}"#));

        let library = ModLibrary::scan(temp.path(), "DISABLED_", &ManifestStore::default()).unwrap();

        assert!(!library.is_sync_enabled("DISABLED_Old"));
        assert!(!library.is_sync_enabled("disabled_whatever"));
        assert!(!library.is_sync_enabled("optout"));
        assert!(library.is_sync_enabled("Active"));
        assert!(library.is_sync_enabled("NotInstalled"));
        assert_eq!(library.enabled().count(), 1);
    }

    #[test]
    fn corrupt_manifest_is_recorded_not_fatal() {
        let temp = TempDir::new().unwrap();
        make_mod(temp.path(), "C", "Broken", Some("{ nope"));

        let library = ModLibrary::scan(temp.path(), "DISABLED_", &ManifestStore::default()).unwrap();

        assert!(matches!(library.mods()[0].manifest, ManifestState::Corrupt(_)));
    }

    #[test]
    fn resolve_looks_inside_categories() {
        let temp = TempDir::new().unwrap();
        make_mod(temp.path(), "Characters", "CharacterA", None);
        let file = temp.path().join("Characters/CharacterA/ModFile.ini");
        fs::write(&file, "").unwrap();

        let library = ModLibrary::scan(temp.path(), "DISABLED_", &ManifestStore::default()).unwrap();

        assert_eq!(library.resolve(&VirtualPath::new("charactera\\modfile.INI")), Some(file));
        assert_eq!(library.resolve(&VirtualPath::new("CharacterA\\Missing.ini")), None);
    }

    #[test]
    fn allows_sync_follows_the_owning_mod() {
        let temp = TempDir::new().unwrap();
        make_mod(temp.path(), "Characters", "OptOut", Some(r#"{"statusKeeperSync": false}"#));
        make_mod(temp.path(), "Characters", "DISABLED_Old", None);
        make_mod(temp.path(), "Characters", "Active", None);

        let library = ModLibrary::scan(temp.path(), "DISABLED_", &ManifestStore::default()).unwrap();

        assert!(!library.allows_sync(&temp.path().join("Characters/OptOut/sub/a.ini")));
        assert!(!library.allows_sync(&temp.path().join("Characters/DISABLED_Old/a.ini")));
        assert!(library.allows_sync(&temp.path().join("Characters/Active/a.ini")));
        assert!(library.allows_sync(&temp.path().join("Loose.ini")));
        assert!(!library.allows_sync(&temp.path().join("DISABLED_Stash/Loose.ini")));
    }

    #[test]
    fn missing_root_is_an_error() {
        let err = ModLibrary::scan(Path::new("/definitely/not/here"), "DISABLED_", &ManifestStore::default())
            .unwrap_err();
        assert!(matches!(err, Error::LibraryNotFound { .. }));
    }
}
