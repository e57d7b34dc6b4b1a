//! Per-mod manifests (`mod.json`)
//!
//! A manifest is owned by the mod's author or installer. Status Keeper only
//! interprets three fields and rewrites two of them during dialect
//! migration; every other field is carried through unchanged and in its
//! original position.

mod reconcile;
mod store;

pub use reconcile::{Migration, ObservedDeclarations, Reconciled, reconcile};
pub use store::ManifestStore;

use std::path::Path;

use serde_json::{Map, Value};

use crate::{Error, Result};

/// Field holding the per-mod sync opt-out
pub const SYNC_FLAG_FIELD: &str = "statusKeeperSync";
/// Field holding the addressing dialect
pub const DIALECT_FIELD: &str = "syncMethod";
/// Field holding namespace records
pub const NAMESPACES_FIELD: &str = "namespaces";

const RECORD_NAMESPACE: &str = "namespace";
const RECORD_FILES: &str = "iniFiles";

/// How a mod's persistent variables are addressed in the central state file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Literal relative file path
    Classic,
    /// Indirection through a shared namespace name
    Namespace,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Namespace => "namespace",
        }
    }
}

/// One namespace declared by a mod and the ini files that declare it.
///
/// `ini_files` are relative to the mod folder, forward-slash separated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceRecord {
    pub namespace: String,
    pub ini_files: Vec<String>,
}

impl NamespaceRecord {
    pub fn new(namespace: impl Into<String>, ini_files: Vec<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ini_files,
        }
    }

    fn to_value(&self) -> Value {
        let mut record = Map::new();
        record.insert(RECORD_NAMESPACE.into(), Value::String(self.namespace.clone()));
        record.insert(
            RECORD_FILES.into(),
            Value::Array(self.ini_files.iter().cloned().map(Value::String).collect()),
        );
        Value::Object(record)
    }
}

/// Rename of one element of the raw `namespaces` array.
///
/// `position` indexes the array as stored on disk, malformed elements
/// included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceRepair {
    pub position: usize,
    pub namespace: String,
}

/// A parsed `mod.json`, keeping every field in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct ModManifest {
    fields: Map<String, Value>,
}

impl ModManifest {
    /// Wrap a JSON value, which must be an object.
    pub fn from_value(value: Value, path: &Path) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(Error::ManifestCorrupt {
                path: path.to_path_buf(),
                message: format!("expected a JSON object, found {}", json_kind(&other)),
            }),
        }
    }

    /// Parse manifest text.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let value: Value = serde_json::from_str(content.trim_start_matches('\u{feff}'))
            .map_err(|e| Error::ManifestCorrupt {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Self::from_value(value, path)
    }

    /// Sync is enabled unless the flag is explicitly `false`.
    pub fn sync_enabled(&self) -> bool {
        !matches!(self.fields.get(SYNC_FLAG_FIELD), Some(Value::Bool(false)))
    }

    /// Declared dialect; anything other than `"namespace"` counts as classic.
    pub fn dialect(&self) -> Dialect {
        match self.fields.get(DIALECT_FIELD).and_then(Value::as_str) {
            Some("namespace") => Dialect::Namespace,
            _ => Dialect::Classic,
        }
    }

    /// Well-formed namespace records.
    ///
    /// Records without a name or without any file are skipped.
    pub fn namespaces(&self) -> Vec<NamespaceRecord> {
        self.indexed_namespaces().into_iter().map(|(_, record)| record).collect()
    }

    /// Well-formed namespace records with their position in the raw array.
    pub fn indexed_namespaces(&self) -> Vec<(usize, NamespaceRecord)> {
        let Some(Value::Array(items)) = self.fields.get(NAMESPACES_FIELD) else {
            return Vec::new();
        };

        items
            .iter()
            .enumerate()
            .filter_map(|(position, item)| {
                let namespace = item.get(RECORD_NAMESPACE)?.as_str()?.trim();
                let files: Vec<String> = item
                    .get(RECORD_FILES)?
                    .as_array()?
                    .iter()
                    .filter_map(Value::as_str)
                    .filter(|f| !f.trim().is_empty())
                    .map(|f| f.replace('\\', "/"))
                    .collect();
                if namespace.is_empty() || files.is_empty() {
                    tracing::debug!(?item, "Skipping malformed namespace record");
                    return None;
                }
                Some((position, NamespaceRecord::new(namespace, files)))
            })
            .collect()
    }

    /// Drop the namespace dialect and its records.
    pub fn into_classic(mut self) -> Self {
        self.fields.shift_remove(DIALECT_FIELD);
        self.fields.shift_remove(NAMESPACES_FIELD);
        self
    }

    /// Switch to the namespace dialect with the given records.
    ///
    /// Existing dialect fields keep their position; new ones are appended.
    pub fn with_namespaces(mut self, records: &[NamespaceRecord]) -> Self {
        self.fields.insert(
            DIALECT_FIELD.into(),
            Value::String(Dialect::Namespace.as_str().into()),
        );
        self.fields.insert(
            NAMESPACES_FIELD.into(),
            Value::Array(records.iter().map(NamespaceRecord::to_value).collect()),
        );
        self
    }

    /// Rename namespaces in place.
    ///
    /// Only the `namespace` string of each addressed element changes; its
    /// other keys, file spellings and every other element stay as they are.
    pub fn with_repaired_namespaces(mut self, repairs: &[NamespaceRepair]) -> Self {
        let Some(Value::Array(items)) = self.fields.get_mut(NAMESPACES_FIELD) else {
            return self;
        };
        for repair in repairs {
            if let Some(record) = items.get_mut(repair.position).and_then(Value::as_object_mut) {
                record.insert(RECORD_NAMESPACE.into(), Value::String(repair.namespace.clone()));
            }
        }
        self
    }

    /// Look up any field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn manifest(value: Value) -> ModManifest {
        ModManifest::from_value(value, Path::new("mod.json")).unwrap()
    }

    #[test]
    fn sync_defaults_to_enabled() {
        assert!(manifest(json!({"name": "A"})).sync_enabled());
        assert!(manifest(json!({"statusKeeperSync": true})).sync_enabled());
        assert!(!manifest(json!({"statusKeeperSync": false})).sync_enabled());
    }

    #[test]
    fn unknown_dialect_counts_as_classic() {
        assert_eq!(manifest(json!({})).dialect(), Dialect::Classic);
        assert_eq!(manifest(json!({"syncMethod": "other"})).dialect(), Dialect::Classic);
        assert_eq!(manifest(json!({"syncMethod": "namespace"})).dialect(), Dialect::Namespace);
    }

    #[test]
    fn malformed_records_are_skipped() {
        let m = manifest(json!({
            "syncMethod": "namespace",
            "namespaces": [
                {"namespace": "", "iniFiles": ["a.ini"]},
                {"namespace": "Foo", "iniFiles": []},
                {"namespace": "Bar", "iniFiles": ["sub\\b.ini"]},
                "garbage"
            ]
        }));
        assert_eq!(m.namespaces(), vec![NamespaceRecord::new("Bar", vec!["sub/b.ini".into()])]);
    }

    #[test]
    fn non_object_manifest_is_corrupt() {
        let err = ModManifest::from_value(json!([1, 2]), Path::new("mod.json")).unwrap_err();
        assert!(matches!(err, Error::ManifestCorrupt { .. }));
    }

    #[test]
    fn dialect_changes_keep_other_fields_in_order() {
        let original = manifest(json!({
            "author": "someone",
            "syncMethod": "classic",
            "hotkeys": [{"key": "F1"}],
            "statusKeeperSync": true
        }));

        let migrated = original
            .clone()
            .with_namespaces(&[NamespaceRecord::new("Foo", vec!["a.ini".into()])]);
        let keys: Vec<_> = migrated.fields().keys().cloned().collect();
        assert_eq!(keys, vec!["author", "syncMethod", "hotkeys", "statusKeeperSync", "namespaces"]);

        let reverted = migrated.into_classic();
        assert_eq!(reverted.get("author"), original.get("author"));
        assert_eq!(reverted.get("hotkeys"), original.get("hotkeys"));
        assert!(reverted.get("syncMethod").is_none());
        assert!(reverted.get("namespaces").is_none());
    }
}
