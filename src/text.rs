//! Line-indexed source text and the fixed-width editing primitives shared by
//! the template writer and the trial materializer.
//!
//! Nothing here knows about MESH: spans are plain byte columns within a line,
//! and edits are byte ranges within the whole text.

use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

/// Immutable text with the byte range of every line (terminator excluded).
#[derive(Debug, Clone)]
pub struct SourceText {
    text: String,
    lines: Vec<ByteRange>,
}

impl SourceText {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut lines = Vec::new();
        let mut offset = 0usize;

        for piece in text.split_inclusive('\n') {
            let mut content = piece.strip_suffix('\n').unwrap_or(piece);
            content = content.strip_suffix('\r').unwrap_or(content);
            lines.push(ByteRange {
                start: offset,
                end: offset + content.len(),
            });
            offset += piece.len();
        }

        Self { text, lines }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, index: usize) -> &str {
        self.lines
            .get(index)
            .map(|r| &self.text[r.start..r.end])
            .unwrap_or("")
    }

    /// Byte offset of the first character of `index` within the whole text.
    pub fn line_offset(&self, index: usize) -> usize {
        self.lines.get(index).map(|r| r.start).unwrap_or(self.text.len())
    }

    /// Absolute byte range of a span's token.
    pub fn token_range(&self, span: &FieldSpan) -> Range<usize> {
        let base = self.line_offset(span.line);
        base + span.start..base + span.end
    }

    /// Absolute byte range of a span's cell (leading whitespace + token).
    pub fn cell_range(&self, span: &FieldSpan) -> Range<usize> {
        let base = self.line_offset(span.line);
        base + span.cell_start..base + span.end
    }
}

/// How a field may be rewritten in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WidthPolicy {
    /// Column positions matter: replacements are right-aligned into the original cell.
    Fixed,
    /// Whitespace-delimited: replacements are substituted as-is.
    #[default]
    Free,
}

/// Row shape the field came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    /// One value per field position.
    Independent,
    /// One column per unit, repeated horizontally along the row.
    Repeated,
}

/// Location of one scalar value inside a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpan {
    /// 0-based line index.
    pub line: usize,
    /// Byte column of the first token character.
    pub start: usize,
    /// Byte column one past the last token character.
    pub end: usize,
    /// Byte column where the cell begins: end of the previous token, or 0.
    pub cell_start: usize,
    pub original: String,
    pub kind: RowKind,
    pub width: WidthPolicy,
}

impl FieldSpan {
    pub fn token_width(&self) -> usize {
        self.end - self.start
    }

    pub fn cell_width(&self) -> usize {
        self.end - self.cell_start
    }
}

/// Whitespace-separated token column ranges within `line[..limit]`.
pub fn token_runs(line: &str, limit: usize) -> Vec<(usize, usize)> {
    let region = &line[..limit.min(line.len())];
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;

    for (i, c) in region.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                runs.push((s, i));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        runs.push((s, region.len()));
    }
    runs
}

/// Column where the cell ending at a token starting at `token_start` begins.
pub fn cell_start(line: &str, token_start: usize) -> usize {
    line[..token_start]
        .char_indices()
        .rev()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0)
}

/// Right-aligns `content` into a cell of `width` columns.
///
/// A cell that does not start the line keeps at least one separating blank.
/// Returns `None` when `content` does not fit.
pub fn fit_cell(content: &str, width: usize, needs_separator: bool) -> Option<String> {
    let available = if needs_separator {
        width.saturating_sub(1)
    } else {
        width
    };
    let len = content.chars().count();
    if len > available {
        return None;
    }
    Some(format!("{:>width$}", content, width = width))
}

/// Characters that can belong to a placeholder token.
pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Maximal runs of word characters with their absolute byte ranges.
pub fn words(text: &str) -> Vec<(Range<usize>, &str)> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        if is_word_char(c) {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(s) = start.take() {
            out.push((s..i, &text[s..i]));
        }
    }
    if let Some(s) = start {
        out.push((s..text.len(), &text[s..]));
    }
    out
}

/// One replacement of an absolute byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Range<usize>,
    pub replacement: String,
}

/// Applies non-overlapping edits; every byte outside them is copied verbatim.
pub fn apply_edits(text: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|e| e.range.start);

    let grown: usize = edits.iter().map(|e| e.replacement.len()).sum();
    let mut out = String::with_capacity(text.len() + grown);
    let mut cursor = 0usize;

    for edit in edits {
        debug_assert!(edit.range.start >= cursor, "overlapping edits");
        out.push_str(&text[cursor..edit.range.start]);
        out.push_str(&edit.replacement);
        cursor = edit.range.end;
    }
    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_keep_terminators_out_of_ranges() {
        let src = SourceText::new("a b\r\nc\n\nlast");
        assert_eq!(src.line_count(), 4);
        assert_eq!(src.line(0), "a b");
        assert_eq!(src.line(1), "c");
        assert_eq!(src.line(2), "");
        assert_eq!(src.line(3), "last");
        assert_eq!(src.line_offset(1), 5);
    }

    #[test]
    fn test_token_runs_respect_limit() {
        let line = "ZSNL  0.5  0.14   # comment";
        let limit = line.find('#').unwrap();
        assert_eq!(token_runs(line, limit), vec![(0, 4), (6, 9), (11, 15)]);
    }

    #[test]
    fn test_cell_start_walks_back_over_blanks() {
        let line = "   1.000   2.000";
        assert_eq!(cell_start(line, 3), 0);
        assert_eq!(cell_start(line, 11), 8);
    }

    #[test]
    fn test_fit_cell_pads_and_rejects() {
        assert_eq!(fit_cell("0.27", 8, true).as_deref(), Some("    0.27"));
        assert_eq!(fit_cell("ABCDEFGH", 8, false).as_deref(), Some("ABCDEFGH"));
        assert_eq!(fit_cell("ABCDEFGH", 8, true), None);
    }

    #[test]
    fn test_apply_edits_preserves_untouched_bytes() {
        let text = "x = 1\ny = 2\n";
        let edits = vec![
            Edit {
                range: 10..11,
                replacement: "B".to_string(),
            },
            Edit {
                range: 4..5,
                replacement: "AA".to_string(),
            },
        ];
        assert_eq!(apply_edits(text, edits), "x = AA\ny = B\n");
    }

    #[test]
    fn test_words_split_on_punctuation() {
        let found: Vec<&str> = words("T_ZSNL_1  0.14#x").into_iter().map(|(_, w)| w).collect();
        assert_eq!(found, vec!["T_ZSNL_1", "0", "14", "x"]);
    }
}
