//! Manifest registry
//!
//! Builds the [`NamespaceIndex`] for one sync run from every enabled mod's
//! manifest. Each manifest is checked against the `namespace = ...`
//! declarations actually present in the mod's ini files; when they disagree
//! the manifest is rewritten to match the content before it is registered.

mod index;
mod library;

pub use index::NamespaceIndex;
pub use library::{ManifestState, ModEntry, ModLibrary};

use std::path::PathBuf;
use std::sync::LazyLock;

use keeper_fs::{VirtualPath, io};
use regex::Regex;
use walkdir::WalkDir;

use crate::ini::is_variant_file;
use crate::manifest::{Dialect, ManifestStore, ModManifest, ObservedDeclarations, reconcile};

static NAMESPACE_DECLARATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mi)^[ \t]*namespace[ \t]*=[ \t]*(.+?)\s*$").unwrap());

/// First `namespace = <value>` declaration in ini text.
pub fn find_namespace_declaration(text: &str) -> Option<String> {
    NAMESPACE_DECLARATION
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|ns| !ns.is_empty())
}

/// A manifest rewritten during index construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRecord {
    pub manifest: PathBuf,
    pub description: &'static str,
}

/// What happened while building the index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryReport {
    /// Mods that registered at least one namespace
    pub registered_mods: usize,
    pub migrations: Vec<MigrationRecord>,
    /// Manifests excluded because they could not be parsed
    pub corrupt: Vec<PathBuf>,
}

/// Builds namespace indexes from a scanned library.
#[derive(Debug)]
pub struct ManifestRegistry<'a> {
    library: &'a ModLibrary,
    store: &'a ManifestStore,
    variant_marker: &'a str,
}

impl<'a> ManifestRegistry<'a> {
    pub fn new(library: &'a ModLibrary, store: &'a ManifestStore, variant_marker: &'a str) -> Self {
        Self {
            library,
            store,
            variant_marker,
        }
    }

    /// Validate every enabled manifest and build the namespace index.
    ///
    /// Mods are processed in (category, folder) order, which decides the
    /// canonical spelling of a namespace declared by several mods.
    pub fn build_index(&self) -> (NamespaceIndex, RegistryReport) {
        let mut index = NamespaceIndex::new();
        let mut report = RegistryReport::default();

        for entry in self.library.enabled() {
            let manifest = match &entry.manifest {
                ManifestState::Loaded(manifest) => manifest,
                ManifestState::Missing => continue,
                ManifestState::Corrupt(_) => {
                    report.corrupt.push(entry.manifest_path.clone());
                    continue;
                }
            };

            let Some(observed) = self.observe(entry, manifest) else {
                continue;
            };
            let reconciled = reconcile(manifest, &observed);

            if let Some(migration) = &reconciled.migration {
                tracing::info!(
                    category = %entry.category,
                    folder = %entry.folder,
                    migration = migration.describe(),
                    "Manifest no longer matches mod content"
                );
                match self.store.migrate(&entry.manifest_path, migration) {
                    Ok(_) => report.migrations.push(MigrationRecord {
                        manifest: entry.manifest_path.clone(),
                        description: migration.describe(),
                    }),
                    Err(e) => tracing::error!(
                        path = %entry.manifest_path.display(),
                        error = %e,
                        "Failed to rewrite manifest"
                    ),
                }
            }

            if reconciled.namespaces.is_empty() {
                continue;
            }
            report.registered_mods += 1;
            let base = VirtualPath::new(&entry.folder);
            for record in &reconciled.namespaces {
                tracing::debug!(
                    namespace = %record.namespace,
                    files = ?record.ini_files,
                    folder = %entry.folder,
                    "Registered namespace"
                );
                index.register(&record.namespace, record.ini_files.iter().map(|f| base.join(f)));
            }
        }

        tracing::debug!(
            namespaces = index.len(),
            migrations = report.migrations.len(),
            "Namespace index built"
        );
        (index, report)
    }

    /// Gather declarations relevant to the manifest's dialect.
    ///
    /// Returns `None` when a file could not be read for a reason other than
    /// not existing; the mod is then left alone for this run.
    fn observe(&self, entry: &ModEntry, manifest: &ModManifest) -> Option<ObservedDeclarations> {
        match manifest.dialect() {
            Dialect::Namespace => self.observe_declared(entry, manifest),
            Dialect::Classic => Some(self.observe_content(entry)),
        }
    }

    /// Read the first file of every namespace record.
    fn observe_declared(&self, entry: &ModEntry, manifest: &ModManifest) -> Option<ObservedDeclarations> {
        let mut observed = ObservedDeclarations::new();
        for record in manifest.namespaces() {
            let Some(first) = record.ini_files.first() else {
                continue;
            };
            let Some(path) = entry.resolve(&VirtualPath::new(first)) else {
                tracing::debug!(folder = %entry.folder, file = %first, "Declared namespace file not found");
                continue;
            };
            match io::read_text(&path) {
                Ok(text) => {
                    if let Some(ns) = find_namespace_declaration(&text) {
                        observed.record(first.as_str(), ns);
                    }
                }
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Cannot validate namespace");
                    return None;
                }
            }
        }
        Some(observed)
    }

    /// Scan every non-variant ini file of the mod, in sorted order.
    fn observe_content(&self, entry: &ModEntry) -> ObservedDeclarations {
        let mut observed = ObservedDeclarations::new();
        let files = WalkDir::new(&entry.dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file());

        for file in files {
            let name = file.file_name().to_string_lossy();
            if !name.to_lowercase().ends_with(".ini") || is_variant_file(&name, self.variant_marker) {
                continue;
            }
            let Some(relative) = VirtualPath::relative_to(file.path(), &entry.dir) else {
                continue;
            };
            match io::read_text(file.path()) {
                Ok(text) => {
                    if let Some(ns) = find_namespace_declaration(&text) {
                        observed.record(relative.as_str(), ns);
                    }
                }
                Err(e) => tracing::warn!(path = %file.path().display(), error = %e, "Skipping unreadable ini"),
            }
        }
        observed
    }
}
