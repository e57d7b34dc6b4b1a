//! Case-insensitive resolution of virtual paths against the library tree
//!
//! The injection tool records paths in whatever case the mod author used in
//! their ini, which need not match the case on disk. Resolution never creates
//! anything; it only reports what already exists.

use std::fs;
use std::path::{Path, PathBuf};

use crate::VirtualPath;

/// Resolve `path` below `root`, tolerating case differences.
///
/// A direct join is tried first. If it does not name an existing file, each
/// segment is re-resolved against the actual directory entries. When several
/// entries match a segment ignoring case, the lexicographically smallest
/// name wins so the result does not depend on directory enumeration order.
pub fn resolve_case_insensitive(root: &Path, path: &VirtualPath) -> Option<PathBuf> {
    if path.is_empty() {
        return None;
    }

    let direct = path.to_native_under(root);
    if direct.is_file() {
        return Some(direct);
    }

    let mut current = root.to_path_buf();
    for segment in path.segments() {
        if !current.is_dir() {
            tracing::debug!(dir = %current.display(), "Resolution stopped at a non-directory");
            return None;
        }
        match find_child_ignore_case(&current, segment) {
            Some(found) => current = found,
            None => {
                tracing::debug!(segment, dir = %current.display(), "Path segment not found");
                return None;
            }
        }
    }

    current.is_file().then_some(current)
}

/// Find the entry of `dir` whose name equals `name` ignoring case.
///
/// An exact match is preferred over a case-folded one.
pub fn find_child_ignore_case(dir: &Path, name: &str) -> Option<PathBuf> {
    let exact = dir.join(name);
    if exact.exists() {
        return Some(exact);
    }

    let wanted = name.to_lowercase();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "Cannot list directory");
            return None;
        }
    };

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().to_lowercase() == wanted)
        .map(|entry| entry.path())
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}
