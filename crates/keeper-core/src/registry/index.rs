//! Namespace name to target file mapping

use std::collections::BTreeMap;

use keeper_fs::VirtualPath;

/// Files registered under each namespace, rebuilt on every run.
///
/// Names compare case-insensitively and with either separator style. The
/// first registration of a name supplies its canonical spelling; later
/// registrations of the same name add their files to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceIndex {
    /// Folded name -> (canonical name, files in registration order)
    entries: BTreeMap<String, (String, Vec<VirtualPath>)>,
}

impl NamespaceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `files` under `namespace`. Duplicate files are ignored.
    pub fn register(&mut self, namespace: &str, files: impl IntoIterator<Item = VirtualPath>) {
        let canonical = normalize(namespace);
        if canonical.is_empty() {
            return;
        }
        let (_, registered) = self
            .entries
            .entry(canonical.to_lowercase())
            .or_insert_with(|| (canonical, Vec::new()));
        for file in files {
            if !registered.contains(&file) {
                registered.push(file);
            }
        }
    }

    /// Look up a namespace; returns its canonical name and files.
    pub fn lookup(&self, namespace: &str) -> Option<(&str, &[VirtualPath])> {
        self.entries
            .get(&normalize(namespace).to_lowercase())
            .map(|(name, files)| (name.as_str(), files.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical names and their files, ordered by folded name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[VirtualPath])> {
        self.entries
            .values()
            .map(|(name, files)| (name.as_str(), files.as_slice()))
    }
}

fn normalize(namespace: &str) -> String {
    namespace
        .trim()
        .split(['\\', '/'])
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\\")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lookup_ignores_case_and_separator_style() {
        let mut index = NamespaceIndex::new();
        index.register("Weapons\\Glow", [VirtualPath::new("Glow/fileA.ini")]);

        let (name, files) = index.lookup("weapons/GLOW").unwrap();
        assert_eq!(name, "Weapons\\Glow");
        assert_eq!(files, &[VirtualPath::new("Glow/fileA.ini")]);
        assert!(index.lookup("Weapons").is_none());
    }

    #[test]
    fn first_registration_keeps_its_spelling_and_later_ones_add_files() {
        let mut index = NamespaceIndex::new();
        index.register("Weapons\\Glow", [VirtualPath::new("A/fileA.ini")]);
        index.register("WEAPONS\\glow", [VirtualPath::new("B/fileB.ini"), VirtualPath::new("A/fileA.ini")]);

        assert_eq!(index.len(), 1);
        let (name, files) = index.lookup("Weapons\\Glow").unwrap();
        assert_eq!(name, "Weapons\\Glow");
        assert_eq!(files, &[VirtualPath::new("A/fileA.ini"), VirtualPath::new("B/fileB.ini")]);
    }
}
