//! Copying a main file's reserved section into its variant siblings
//!
//! Variant files (LOD copies generated next to a mod's main ini) carry the
//! same persistent variables but are never read as sources. After a main
//! file changes, its full reserved section is upserted into each of them.

use std::fs;
use std::path::{Path, PathBuf};

use keeper_fs::io;

use super::lines::Document;
use super::section::{Entry, extract_section, section_spans, split_entry};
use crate::Result;

/// Indentation for appended keys when the section has no entry to copy from.
const DEFAULT_INDENT: &str = "    ";

/// Whether a file name marks a variant: an `.ini` file whose name contains
/// `marker`, ignoring case.
pub fn is_variant_file(file_name: &str, marker: &str) -> bool {
    let lower = file_name.to_lowercase();
    lower.ends_with(".ini") && lower.contains(&marker.to_lowercase())
}

/// Variant siblings of `main`, sorted by path.
pub fn find_variants(main: &Path, marker: &str) -> Result<Vec<PathBuf>> {
    let Some(dir) = main.parent() else {
        return Ok(Vec::new());
    };

    let mut variants = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| keeper_fs::Error::io(dir, e))? {
        let entry = entry.map_err(|e| keeper_fs::Error::io(dir, e))?;
        let path = entry.path();
        if path == main || !path.is_file() {
            continue;
        }
        if is_variant_file(&entry.file_name().to_string_lossy(), marker) {
            variants.push(path);
        }
    }
    variants.sort();
    Ok(variants)
}

/// Upsert `entries` into `section` of `text`.
///
/// Differing values are overwritten in place keeping the line's
/// indentation, absent keys are inserted after the section's last non-blank
/// line, and a missing section is appended at the end of the file. Returns
/// `None` when nothing would change.
pub fn upsert_section(text: &str, section: &str, entries: &[Entry]) -> Option<String> {
    if entries.is_empty() {
        return None;
    }

    let mut doc = Document::parse(text);
    let spans = section_spans(&doc, section);

    let Some(&(first_start, first_end)) = spans.first() else {
        if !doc.is_empty() {
            doc.push_line("");
        }
        doc.push_line(format!("[{section}]"));
        for entry in entries {
            doc.push_line(format!("{DEFAULT_INDENT}{} = {}", entry.key, entry.value));
        }
        return Some(doc.render());
    };

    let mut changed = false;
    let mut missing = Vec::new();
    for entry in entries {
        let mut found = false;
        for &(start, end) in &spans {
            for index in start + 1..end {
                let content = &doc.lines()[index].content;
                let Some((key, value)) = split_entry(content) else {
                    continue;
                };
                if !key.eq_ignore_ascii_case(&entry.key) {
                    continue;
                }
                found = true;
                if value != entry.value {
                    let indent = leading_whitespace(content);
                    let rewritten = format!("{indent}{key} = {}", entry.value);
                    doc.set_content(index, rewritten);
                    changed = true;
                }
            }
        }
        if !found {
            missing.push(entry);
        }
    }

    if !missing.is_empty() {
        let body = first_start + 1..first_end;
        let indent = body
            .clone()
            .find_map(|i| {
                let content = &doc.lines()[i].content;
                split_entry(content).map(|_| leading_whitespace(content).to_string())
            })
            .unwrap_or_else(|| DEFAULT_INDENT.to_string());
        let mut at = body
            .rev()
            .find(|&i| !doc.lines()[i].content.trim().is_empty())
            .unwrap_or(first_start)
            + 1;
        for entry in missing {
            doc.insert_line(at, format!("{indent}{} = {}", entry.key, entry.value));
            at += 1;
        }
        changed = true;
    }

    changed.then(|| doc.render())
}

/// Propagate the reserved section of `main` into each of its variants.
///
/// Returns the number of variant files rewritten. A variant that cannot be
/// read or written is logged and skipped.
pub fn propagate_to_variants(main: &Path, section: &str, marker: &str) -> Result<usize> {
    let entries = extract_section(&io::read_text(main)?, section);
    if entries.is_empty() {
        tracing::debug!(path = %main.display(), section, "No reserved section to propagate");
        return Ok(0);
    }

    let variants = find_variants(main, marker)?;
    if variants.is_empty() {
        return Ok(0);
    }
    tracing::debug!(main = %main.display(), count = variants.len(), "Propagating to variants");

    let mut propagated = 0;
    for variant in variants {
        match upsert_file(&variant, section, &entries) {
            Ok(true) => {
                propagated += 1;
                tracing::info!(
                    from = %main.display(),
                    to = %variant.display(),
                    "Synced reserved section to variant"
                );
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(path = %variant.display(), error = %e, "Failed to update variant");
            }
        }
    }
    Ok(propagated)
}

fn upsert_file(path: &Path, section: &str, entries: &[Entry]) -> Result<bool> {
    let text = io::read_text(path)?;
    match upsert_section(&text, section, entries) {
        Some(updated) => {
            io::write_text(path, &updated)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entries(pairs: &[(&str, &str)]) -> Vec<Entry> {
        pairs
            .iter()
            .map(|(k, v)| Entry {
                key: k.to_string(),
                value: v.to_string(),
            })
            .collect()
    }

    #[test]
    fn variant_marker_is_case_insensitive() {
        assert!(is_variant_file("Body_LOD1.ini", "_lod"));
        assert!(!is_variant_file("Body.ini", "_lod"));
        assert!(!is_variant_file("Body_lod.txt", "_lod"));
    }

    #[test]
    fn overwrite_keeps_indentation() {
        let text = "[Constants]\n\t\tglobal persist $fx = 0\n";
        let out = upsert_section(text, "Constants", &entries(&[("global persist $fx", "1")]));
        assert_eq!(out.as_deref(), Some("[Constants]\n\t\tglobal persist $fx = 1\n"));
    }

    #[test]
    fn missing_key_goes_after_last_entry_before_next_header() {
        let text = "[Constants]\r\n  $a = 1\r\n\r\n[Present]\r\nrun = x\r\n";
        let out = upsert_section(text, "Constants", &entries(&[("$a", "1"), ("$b", "2")])).unwrap();
        assert_eq!(out, "[Constants]\r\n  $a = 1\r\n  $b = 2\r\n\r\n[Present]\r\nrun = x\r\n");
    }

    #[test]
    fn missing_section_is_appended_at_end_of_file() {
        let text = "[TextureOverrideBody]\nhash = abc\n";
        let out = upsert_section(text, "Constants", &entries(&[("$a", "1")])).unwrap();
        assert_eq!(out, "[TextureOverrideBody]\nhash = abc\n\n[Constants]\n    $a = 1\n");
    }

    #[test]
    fn already_equal_section_is_left_alone() {
        let text = "[constants]\n$a = 1\n";
        assert_eq!(upsert_section(text, "Constants", &entries(&[("$A", "1")])), None);
    }
}
