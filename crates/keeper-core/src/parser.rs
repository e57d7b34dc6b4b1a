//! Central state file parsing
//!
//! Each assignment line of `d3dx_user.ini` is tokenized once into an
//! [`AddressToken`]. Direct tokens name a file; namespace tokens go through
//! the [`NamespaceIndex`] and fan out to every file registered under them.

use std::collections::BTreeMap;

use keeper_fs::VirtualPath;

use crate::registry::{ModLibrary, NamespaceIndex};

/// Leading segment the injection tool writes before library paths.
const MODS_SEGMENT: &str = "mods";

/// One tokenized state file line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressToken {
    /// `$\<mod folder>\...\<file>.ini\<variable> = <value>`
    Direct {
        path: VirtualPath,
        variable: String,
        value: String,
    },
    /// `$\<namespace path>\<variable> = <value>`
    Namespace {
        namespace: String,
        variable: String,
        value: String,
    },
    Unrecognized,
}

/// Tokenize one line of the central state file.
///
/// The address is everything between `$\` and the last backslash before
/// `=`. An address whose last segment is an `.ini` file name is direct;
/// anything else is a namespace path, which may itself contain backslashes.
pub fn tokenize(line: &str) -> AddressToken {
    let Some(rest) = line.trim().strip_prefix("$\\") else {
        return AddressToken::Unrecognized;
    };
    let Some((lhs, value)) = rest.split_once('=') else {
        return AddressToken::Unrecognized;
    };
    let value = value.trim();
    let Some((address, variable)) = lhs.trim_end().rsplit_once('\\') else {
        return AddressToken::Unrecognized;
    };
    let variable = variable.trim();
    if value.is_empty() || variable.is_empty() || address.trim().is_empty() {
        return AddressToken::Unrecognized;
    }

    let path = VirtualPath::new(address.trim());
    if path.has_extension("ini") {
        let path = match path.strip_first_ignore_case(MODS_SEGMENT) {
            Some(stripped) if !stripped.is_empty() => stripped,
            _ => path,
        };
        return AddressToken::Direct {
            path,
            variable: variable.to_string(),
            value: value.to_string(),
        };
    }

    AddressToken::Namespace {
        namespace: address.trim().to_string(),
        variable: variable.to_string(),
        value: value.to_string(),
    }
}

/// Target file key → variable name → value. Last value wins.
pub type PendingUpdates = BTreeMap<VirtualPath, BTreeMap<String, String>>;

/// Line counts gathered while parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub direct: usize,
    pub namespaced: usize,
    /// Direct entries addressed to a disabled mod
    pub disabled: usize,
    /// Namespace entries with no registered namespace
    pub unknown_namespace: usize,
    pub unrecognized: usize,
}

/// Parsed central state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedState {
    pub updates: PendingUpdates,
    pub stats: ParseStats,
}

impl ParsedState {
    /// Number of distinct (file, variable) pairs.
    pub fn assignment_count(&self) -> usize {
        self.updates.values().map(BTreeMap::len).sum()
    }
}

/// Parses the central state file against one run's library snapshot.
#[derive(Debug)]
pub struct StateParser<'a> {
    index: &'a NamespaceIndex,
    library: &'a ModLibrary,
}

impl<'a> StateParser<'a> {
    pub fn new(index: &'a NamespaceIndex, library: &'a ModLibrary) -> Self {
        Self { index, library }
    }

    /// Parse the full text of the central state file.
    ///
    /// Malformed lines, disabled mods and unknown namespaces are skipped;
    /// parsing itself never fails.
    pub fn parse(&self, text: &str) -> ParsedState {
        let mut state = ParsedState::default();

        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with(';') {
                continue;
            }

            match tokenize(trimmed) {
                AddressToken::Direct { path, variable, value } => {
                    let folder = path.first_segment().unwrap_or_default();
                    if !self.library.is_sync_enabled(folder) {
                        tracing::debug!(%path, %variable, "Skipping entry for disabled mod");
                        state.stats.disabled += 1;
                        continue;
                    }
                    state.stats.direct += 1;
                    state.updates.entry(path).or_default().insert(variable, value);
                }
                AddressToken::Namespace { namespace, variable, value } => {
                    let Some((canonical, files)) = self.index.lookup(&namespace) else {
                        tracing::debug!(%namespace, %variable, "Skipping unregistered namespace");
                        state.stats.unknown_namespace += 1;
                        continue;
                    };
                    tracing::trace!(%namespace, canonical, files = files.len(), "Namespace resolved");
                    state.stats.namespaced += 1;
                    for file in files {
                        state
                            .updates
                            .entry(file.clone())
                            .or_default()
                            .insert(variable.clone(), value.clone());
                    }
                }
                AddressToken::Unrecognized => {
                    state.stats.unrecognized += 1;
                    if trimmed.starts_with("$\\") && trimmed.contains('=') {
                        tracing::warn!(line = trimmed, "State line matches no address form");
                    } else {
                        tracing::debug!(line = trimmed, "Ignoring state line");
                    }
                }
            }
        }

        tracing::debug!(files = state.updates.len(), stats = ?state.stats, "Parsed central state");
        state
    }
}
