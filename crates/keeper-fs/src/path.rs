//! Virtual paths as written by the injection tool and by mod manifests

use std::path::{Path, PathBuf};

/// A relative path inside the mod library, normalized to forward slashes.
///
/// The central state file spells paths with backslashes while manifests use
/// forward slashes. Both forms normalize to the same `VirtualPath`, with
/// empty segments (leading, trailing or doubled separators) dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VirtualPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl VirtualPath {
    /// Create a new VirtualPath from either separator style.
    pub fn new(path: impl AsRef<str>) -> Self {
        let inner = path
            .as_ref()
            .split(['\\', '/'])
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        Self { inner }
    }

    /// Build a VirtualPath from a filesystem path relative to some base.
    ///
    /// Returns `None` if `path` is not below `base`.
    pub fn relative_to(path: &Path, base: &Path) -> Option<Self> {
        let relative = path.strip_prefix(base).ok()?;
        Some(Self::new(relative.to_string_lossy()))
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate over the path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.inner.split('/').filter(|s| !s.is_empty())
    }

    /// The first segment, which names the mod folder for library paths.
    pub fn first_segment(&self) -> Option<&str> {
        self.segments().next()
    }

    /// The last segment.
    pub fn file_name(&self) -> Option<&str> {
        self.segments().last()
    }

    /// Join this path with a relative segment in either separator style.
    pub fn join(&self, segment: impl AsRef<str>) -> Self {
        Self::new(format!("{}/{}", self.inner, segment.as_ref()))
    }

    /// Drop a leading segment if it equals `prefix` ignoring case.
    pub fn strip_first_ignore_case(&self, prefix: &str) -> Option<Self> {
        let (first, rest) = self.inner.split_once('/')?;
        if first.eq_ignore_ascii_case(prefix) {
            Some(Self::new(rest))
        } else {
            None
        }
    }

    /// Check the file extension ignoring case.
    pub fn has_extension(&self, extension: &str) -> bool {
        self.file_name()
            .and_then(|name| name.rsplit_once('.'))
            .is_some_and(|(stem, ext)| !stem.is_empty() && ext.eq_ignore_ascii_case(extension))
    }

    /// Convert to a platform-native path below `root`.
    pub fn to_native_under(&self, root: &Path) -> PathBuf {
        self.segments().fold(root.to_path_buf(), |acc, s| acc.join(s))
    }
}

impl std::fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for VirtualPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for VirtualPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backslashes_and_forward_slashes_normalize_identically() {
        assert_eq!(
            VirtualPath::new("CharacterA\\sub\\ModFile.ini"),
            VirtualPath::new("CharacterA/sub/ModFile.ini")
        );
    }

    #[test]
    fn empty_segments_are_dropped() {
        let path = VirtualPath::new("\\CharacterA//ModFile.ini\\");
        assert_eq!(path.as_str(), "CharacterA/ModFile.ini");
    }

    #[test]
    fn strip_first_ignores_case() {
        let path = VirtualPath::new("Mods\\CharacterA\\ModFile.ini");
        let stripped = path.strip_first_ignore_case("mods").unwrap();
        assert_eq!(stripped.as_str(), "CharacterA/ModFile.ini");
        assert!(stripped.strip_first_ignore_case("mods").is_none());
    }

    #[test]
    fn extension_check_requires_a_stem() {
        assert!(VirtualPath::new("a/Mod.INI").has_extension("ini"));
        assert!(!VirtualPath::new("a/.ini").has_extension("ini"));
        assert!(!VirtualPath::new("a/Mod.txt").has_extension("ini"));
    }
}
