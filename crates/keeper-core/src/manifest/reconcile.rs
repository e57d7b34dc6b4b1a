//! Manifest/content reconciliation
//!
//! [`reconcile`] decides, without touching the filesystem, whether a
//! manifest still describes what its mod's ini files declare. The registry
//! gathers the observations and applies the resulting migration.

use std::collections::BTreeMap;

use super::{Dialect, ModManifest, NamespaceRecord, NamespaceRepair};

/// `namespace = <value>` declarations observed in a mod's ini files.
///
/// Keys are ini paths relative to the mod folder, forward-slash separated.
/// Iteration is in lexicographic path order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedDeclarations {
    declarations: BTreeMap<String, String>,
}

impl ObservedDeclarations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `file` declares `namespace`.
    pub fn record(&mut self, file: impl Into<String>, namespace: impl Into<String>) {
        self.declarations
            .insert(file.into().replace('\\', "/"), namespace.into());
    }

    /// Declaration of `file`, matching the path exactly and then ignoring case.
    pub fn get(&self, file: &str) -> Option<&str> {
        let file = file.replace('\\', "/");
        self.declarations
            .get(&file)
            .or_else(|| {
                self.declarations
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(&file))
                    .map(|(_, v)| v)
            })
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.declarations
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A manifest rewrite required to match the mod's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Migration {
    /// Content no longer declares a namespace; drop the namespace dialect
    ToClassic,
    /// Content declares different namespace names than recorded
    RepairNamespaces(Vec<NamespaceRepair>),
    /// Content of a classic mod now declares a namespace
    ToNamespace(NamespaceRecord),
}

impl Migration {
    /// Apply this migration to a manifest.
    pub fn apply(&self, manifest: ModManifest) -> ModManifest {
        match self {
            Self::ToClassic => manifest.into_classic(),
            Self::RepairNamespaces(repairs) => manifest.with_repaired_namespaces(repairs),
            Self::ToNamespace(record) => manifest.with_namespaces(std::slice::from_ref(record)),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::ToClassic => "converted to classic addressing",
            Self::RepairNamespaces(_) => "repaired namespace names",
            Self::ToNamespace(_) => "converted to namespace addressing",
        }
    }
}

/// Outcome of reconciling one manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    /// The manifest as it should be on disk
    pub manifest: ModManifest,
    /// The rewrite that produced `manifest`, if any
    pub migration: Option<Migration>,
    /// Namespaces to register for this mod
    pub namespaces: Vec<NamespaceRecord>,
}

impl Reconciled {
    pub fn migrated(&self) -> bool {
        self.migration.is_some()
    }
}

/// Reconcile a manifest with the declarations observed in its ini files.
///
/// For namespace manifests, `observed` must hold the declaration of the
/// first file of each record (if it has one). For classic manifests it
/// holds every declaration found while scanning the mod.
pub fn reconcile(manifest: &ModManifest, observed: &ObservedDeclarations) -> Reconciled {
    match manifest.dialect() {
        Dialect::Namespace => reconcile_namespaced(manifest, observed),
        Dialect::Classic => reconcile_classic(manifest, observed),
    }
}

fn reconcile_namespaced(manifest: &ModManifest, observed: &ObservedDeclarations) -> Reconciled {
    let records = manifest.indexed_namespaces();
    let mut validated = Vec::with_capacity(records.len());
    let mut repairs = Vec::new();

    for (position, record) in records {
        let Some(first) = record.ini_files.first() else {
            continue;
        };
        match observed.get(first) {
            None => return finish(manifest, Migration::ToClassic, Vec::new()),
            Some(actual) if !actual.eq_ignore_ascii_case(&record.namespace) => {
                repairs.push(NamespaceRepair {
                    position,
                    namespace: actual.to_string(),
                });
                validated.push(NamespaceRecord::new(actual, record.ini_files));
            }
            Some(_) => validated.push(record),
        }
    }

    if !repairs.is_empty() {
        finish(manifest, Migration::RepairNamespaces(repairs), validated)
    } else {
        Reconciled {
            manifest: manifest.clone(),
            migration: None,
            namespaces: validated,
        }
    }
}

fn reconcile_classic(manifest: &ModManifest, observed: &ObservedDeclarations) -> Reconciled {
    let Some((_, detected)) = observed.iter().next() else {
        return Reconciled {
            manifest: manifest.clone(),
            migration: None,
            namespaces: Vec::new(),
        };
    };

    let files = observed
        .iter()
        .filter(|(_, ns)| ns.eq_ignore_ascii_case(detected))
        .map(|(file, _)| file.to_string())
        .collect();
    let record = NamespaceRecord::new(detected, files);

    finish(manifest, Migration::ToNamespace(record.clone()), vec![record])
}

fn finish(manifest: &ModManifest, migration: Migration, namespaces: Vec<NamespaceRecord>) -> Reconciled {
    Reconciled {
        manifest: migration.apply(manifest.clone()),
        migration: Some(migration),
        namespaces,
    }
}
