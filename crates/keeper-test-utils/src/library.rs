//! [`TestLibrary`] builder for Status Keeper sync scenarios.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;

/// A temporary loader directory holding a `Mods` library and the central
/// state file next to it:
///
/// ```text
/// <tmp>/d3dx_user.ini
/// <tmp>/Mods/<category>/<mod>/mod.json
/// <tmp>/Mods/<category>/<mod>/*.ini
/// ```
///
/// # Example
///
/// ```rust,no_run
/// use keeper_test_utils::TestLibrary;
///
/// let library = TestLibrary::new();
/// library.add_mod("Characters", "CharacterA", None);
/// library.write("Characters/CharacterA/ModFile.ini", "[Constants]\n$toggle_fx = 0\n");
/// library.write_state("$\\CharacterA\\ModFile.ini\\toggle_fx = 1\n");
/// ```
pub struct TestLibrary {
    temp_dir: TempDir,
}

impl Default for TestLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl TestLibrary {
    /// Create an empty library.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("Mods")).unwrap();
        Self { temp_dir }
    }

    /// The loader directory containing `Mods` and the state file.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The library root.
    pub fn mods_dir(&self) -> PathBuf {
        self.root().join("Mods")
    }

    /// Where the central state file lives.
    pub fn state_file(&self) -> PathBuf {
        self.root().join("d3dx_user.ini")
    }

    /// Write the central state file.
    pub fn write_state(&self, content: &str) {
        fs::write(self.state_file(), content).unwrap();
    }

    /// Create a mod folder, optionally with a manifest.
    pub fn add_mod(&self, category: &str, folder: &str, manifest: Option<Value>) -> PathBuf {
        let dir = self.mods_dir().join(category).join(folder);
        fs::create_dir_all(&dir).unwrap();
        if let Some(manifest) = manifest {
            fs::write(dir.join("mod.json"), serde_json::to_string_pretty(&manifest).unwrap()).unwrap();
        }
        dir
    }

    /// Write a file below the library root, creating parent folders.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.mods_dir().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Read a file below the library root.
    pub fn read(&self, relative: &str) -> String {
        let path = self.mods_dir().join(relative);
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("Could not read file: {}", path.display()))
    }

    /// Parse the manifest of a mod.
    pub fn read_manifest(&self, category: &str, folder: &str) -> Value {
        let content = self.read(&format!("{category}/{folder}/mod.json"));
        serde_json::from_str(&content).unwrap()
    }

    /// Raw bytes of every file in the loader directory, keyed by path.
    pub fn snapshot(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        let mut files = BTreeMap::new();
        collect(self.root(), &mut files);
        files
    }

    /// Assert that the file at `relative` contains `content`.
    ///
    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, relative: &str, content: &str) {
        let file_content = self.read(relative);
        assert!(
            file_content.contains(content),
            "File {relative} does not contain expected content.\nExpected: {content}\nActual: {file_content}"
        );
    }

    /// Assert that the file at `relative` does **not** contain `content`.
    ///
    /// # Panics
    /// Panics if the file cannot be read or contains `content`.
    pub fn assert_file_not_contains(&self, relative: &str, content: &str) {
        let file_content = self.read(relative);
        assert!(
            !file_content.contains(content),
            "File {relative} unexpectedly contains: {content}\nActual: {file_content}"
        );
    }
}

fn collect(dir: &Path, files: &mut BTreeMap<PathBuf, Vec<u8>>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect(&path, files);
        } else {
            files.insert(path.clone(), fs::read(&path).unwrap());
        }
    }
}
