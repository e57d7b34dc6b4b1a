//! Section tracking for line-oriented config files

use super::lines::Document;

/// Name inside a `[Name]` header line, if `line` is one.
pub fn header_name(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('[')?.strip_suffix(']')?;
    Some(inner.trim())
}

/// Whether `line` is a header of the section `section` (ignoring case).
pub fn is_header_of(line: &str, section: &str) -> bool {
    header_name(line).is_some_and(|name| name.eq_ignore_ascii_case(section))
}

/// Index ranges `[header, end)` of every occurrence of `section`.
///
/// `end` is the index of the next header or the document length.
pub fn section_spans(doc: &Document, section: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut open: Option<usize> = None;

    for (index, line) in doc.lines().iter().enumerate() {
        if header_name(&line.content).is_none() {
            continue;
        }
        if let Some(start) = open.take() {
            spans.push((start, index));
        }
        if is_header_of(&line.content, section) {
            open = Some(index);
        }
    }
    if let Some(start) = open {
        spans.push((start, doc.len()));
    }
    spans
}

/// A `key = value` entry of a section, trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: String,
}

/// Split a section body line into key and value.
///
/// Blank lines, `;` comments and lines without `=` yield `None`.
pub fn split_entry(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with(';') {
        return None;
    }
    let (key, value) = trimmed.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}

/// Every entry of `section`, in file order.
///
/// A key repeated later (in the same or another occurrence of the section)
/// keeps its first position but takes the later value.
pub fn extract_section(text: &str, section: &str) -> Vec<Entry> {
    let doc = Document::parse(text);
    let mut entries: Vec<Entry> = Vec::new();

    for (start, end) in section_spans(&doc, section) {
        for line in &doc.lines()[start + 1..end] {
            let Some((key, value)) = split_entry(&line.content) else {
                continue;
            };
            match entries.iter_mut().find(|e| e.key.eq_ignore_ascii_case(key)) {
                Some(existing) => existing.value = value.to_string(),
                None => entries.push(Entry {
                    key: key.to_string(),
                    value: value.to_string(),
                }),
            }
        }
    }
    entries
}
