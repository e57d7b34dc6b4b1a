//! In-place value rewriting inside the reserved section

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::LazyLock;

use keeper_fs::io;
use regex::Regex;

use super::lines::Document;
use super::section::header_name;
use crate::Result;

/// `<prefix>$<name> <op> <value><trailing>`; the prefix keeps declaration
/// keywords such as `global persist` verbatim.
static VARIABLE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?\$([^=\s]+))(\s*=\s*)(.*?)(\s*)$").unwrap());

/// Result of patching one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchOutcome {
    /// Whether the file was rewritten
    pub modified: bool,
    /// Number of variable lines whose value changed
    pub updates: usize,
}

/// Apply `updates` (variable name → value) to the `section` of `text`.
///
/// Returns the new text and the number of changed lines. Variable names
/// match ignoring case; values compare exactly. Only the value sub-text of a
/// changed line is replaced and no line is ever added or removed.
pub fn patch_section(text: &str, section: &str, updates: &BTreeMap<String, String>) -> (String, usize) {
    if updates.is_empty() {
        return (text.to_string(), 0);
    }

    let wanted: HashMap<String, &str> = updates
        .iter()
        .map(|(name, value)| (name.to_lowercase(), value.as_str()))
        .collect();

    let mut doc = Document::parse(text);
    let mut in_section = false;
    let mut changed = 0;

    for index in 0..doc.len() {
        let content = &doc.lines()[index].content;
        if let Some(name) = header_name(content) {
            in_section = name.eq_ignore_ascii_case(section);
            continue;
        }
        if !in_section {
            continue;
        }
        let Some(caps) = VARIABLE_LINE.captures(content) else {
            continue;
        };
        let Some(new_value) = wanted.get(&caps[2].to_lowercase()) else {
            continue;
        };
        let current = &caps[4];
        if current == *new_value {
            continue;
        }

        let operator = &caps[3];
        let spacer = if current.is_empty() && !operator.ends_with(char::is_whitespace) {
            " "
        } else {
            ""
        };
        let rewritten = format!("{}{}{}{}{}", &caps[1], operator, spacer, new_value, &caps[5]);
        tracing::trace!(variable = &caps[2], from = current, to = *new_value, "Updating variable");
        doc.set_content(index, rewritten);
        changed += 1;
    }

    if changed == 0 {
        (text.to_string(), 0)
    } else {
        (doc.render(), changed)
    }
}

/// Patch the file at `path`, writing it back only when a line changed.
pub fn patch_file(path: &Path, section: &str, updates: &BTreeMap<String, String>) -> Result<PatchOutcome> {
    let original = io::read_text(path)?;
    let (patched, changed) = patch_section(&original, section, updates);
    if changed == 0 {
        return Ok(PatchOutcome::default());
    }

    io::write_text(path, &patched)?;
    tracing::debug!(path = %path.display(), updates = changed, "Patched reserved section");
    Ok(PatchOutcome {
        modified: true,
        updates: changed,
    })
}
