//! Line-level document model that round-trips byte for byte
//!
//! Each line keeps its own terminator, so a file mixing `\n` and `\r\n`
//! renders back exactly as read. New lines use the file's dominant style.

/// Terminator of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
    /// Last line of a file without a trailing newline
    None,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::None => "",
        }
    }
}

/// One line without its terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub content: String,
    pub ending: LineEnding,
}

/// A text file as a sequence of lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    bom: bool,
    lines: Vec<Line>,
    newline: LineEnding,
}

impl Document {
    pub fn parse(text: &str) -> Self {
        let (bom, body) = match text.strip_prefix('\u{feff}') {
            Some(rest) => (true, rest),
            None => (false, text),
        };

        let lines: Vec<Line> = body
            .split_inclusive('\n')
            .map(|raw| {
                if let Some(content) = raw.strip_suffix("\r\n") {
                    Line { content: content.to_string(), ending: LineEnding::CrLf }
                } else if let Some(content) = raw.strip_suffix('\n') {
                    Line { content: content.to_string(), ending: LineEnding::Lf }
                } else {
                    Line { content: raw.to_string(), ending: LineEnding::None }
                }
            })
            .collect();

        let crlf = lines.iter().filter(|l| l.ending == LineEnding::CrLf).count();
        let lf = lines.iter().filter(|l| l.ending == LineEnding::Lf).count();
        let newline = if crlf > lf { LineEnding::CrLf } else { LineEnding::Lf };

        Self { bom, lines, newline }
    }

    pub fn render(&self) -> String {
        let capacity = self.lines.iter().map(|l| l.content.len() + 2).sum::<usize>() + 3;
        let mut out = String::with_capacity(capacity);
        if self.bom {
            out.push('\u{feff}');
        }
        for line in &self.lines {
            out.push_str(&line.content);
            out.push_str(line.ending.as_str());
        }
        out
    }

    /// Terminator used for lines added to this document.
    pub fn newline(&self) -> LineEnding {
        self.newline
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Replace the content of line `index`, keeping its terminator.
    pub fn set_content(&mut self, index: usize, content: String) {
        self.lines[index].content = content;
    }

    /// Append a line at the end.
    ///
    /// A file that ended without a trailing newline still does afterwards.
    pub fn push_line(&mut self, content: impl Into<String>) {
        let newline = self.newline;
        let ending = match self.lines.last_mut() {
            Some(last) if last.ending == LineEnding::None => {
                last.ending = newline;
                LineEnding::None
            }
            _ => newline,
        };
        self.lines.push(Line { content: content.into(), ending });
    }

    /// Insert a line before `index`; `index == len()` appends.
    pub fn insert_line(&mut self, index: usize, content: impl Into<String>) {
        if index >= self.lines.len() {
            self.push_line(content);
        } else {
            self.lines.insert(index, Line { content: content.into(), ending: self.newline });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("a")]
    #[case("a\n")]
    #[case("a\r\nb\r\n")]
    #[case("a\r\nb\nc")]
    #[case("\u{feff}[Constants]\r\n$x = 1")]
    #[case("\n\n\r\n")]
    fn render_is_byte_identical(#[case] text: &str) {
        assert_eq!(Document::parse(text).render(), text);
    }

    #[test]
    fn dominant_ending_is_used_for_new_lines() {
        let mut doc = Document::parse("a\r\nb\r\nc\n");
        doc.push_line("d");
        assert_eq!(doc.render(), "a\r\nb\r\nc\nd\r\n");
    }

    #[test]
    fn missing_trailing_newline_is_kept_when_appending() {
        let mut doc = Document::parse("a\nb");
        doc.push_line("c");
        assert_eq!(doc.render(), "a\nb\nc");
    }

    #[test]
    fn insert_in_the_middle_uses_file_style() {
        let mut doc = Document::parse("a\r\nc\r\n");
        doc.insert_line(1, "b");
        assert_eq!(doc.render(), "a\r\nb\r\nc\r\n");
    }

    #[test]
    fn carriage_return_stays_out_of_content() {
        let doc = Document::parse("[Constants]\r\n");
        assert_eq!(doc.lines()[0].content, "[Constants]");
    }
}
