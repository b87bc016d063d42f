//! Text and position utilities.
//!
//! This module provides an immutable, line-indexed view over raw `.bru`
//! source text. Everything downstream (parser, diagnostics, text edits)
//! works in terms of [`Position`] and [`Range`] values produced here, and
//! uses [`Document`] to convert between byte offsets and positions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in a text document, zero-based.
///
/// `character` counts UTF-8 code units (bytes) within the line, the same
/// unit the source text is stored in. This matches how ranges are later
/// applied as text edits against the original document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Zero-based line number
    pub line: usize,
    /// Zero-based character offset within the line
    pub character: usize,
}

impl Position {
    /// Creates a new position.
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.character)
    }
}

/// A range in a text document.
///
/// `start <= end`; `end` marks the first position *not* included in the
/// range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Range {
    /// Start position (inclusive)
    pub start: Position,
    /// End position (exclusive)
    pub end: Position,
}

impl Range {
    /// Creates a new range.
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Creates a range within a single line.
    pub fn at_line(line: usize, start_char: usize, end_char: usize) -> Self {
        Self {
            start: Position::new(line, start_char),
            end: Position::new(line, end_char),
        }
    }

    /// Creates an empty range at a single position.
    pub fn at(position: Position) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    /// Returns the smallest range covering both `self` and `other`.
    pub fn covering(&self, other: &Range) -> Range {
        Range {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Returns true if `position` falls within this range (end exclusive).
    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position < self.end
    }
}

/// The line-break style of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineBreak {
    /// Unix-style `\n`
    Lf,
    /// Windows-style `\r\n`
    CrLf,
}

impl LineBreak {
    /// Returns the literal line-break string.
    pub fn as_str(&self) -> &'static str {
        match self {
            LineBreak::Lf => "\n",
            LineBreak::CrLf => "\r\n",
        }
    }
}

/// Immutable text plus a derived line table.
///
/// The document is created once per parse/check cycle and never mutated;
/// text edits produced by the crate always target the original document.
#[derive(Debug, Clone)]
pub struct Document {
    text: String,
    /// Byte offset of the start of each line. Always has at least one entry.
    line_offsets: Vec<usize>,
    line_break: LineBreak,
}

impl Document {
    /// Creates a document from raw text, deriving the line table and the
    /// dominant line-break style (majority vote over observed breaks,
    /// defaulting to LF).
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_offsets = vec![0];
        let mut crlf = 0usize;
        let mut lf = 0usize;

        let bytes = text.as_bytes();
        for (i, &b) in bytes.iter().enumerate() {
            if b == b'\n' {
                line_offsets.push(i + 1);
                if i > 0 && bytes[i - 1] == b'\r' {
                    crlf += 1;
                } else {
                    lf += 1;
                }
            }
        }

        let line_break = if crlf > lf {
            LineBreak::CrLf
        } else {
            LineBreak::Lf
        };

        Self {
            text,
            line_offsets,
            line_break,
        }
    }

    /// Returns the full document text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the number of lines in the document.
    ///
    /// An empty document has one (empty) line; a trailing line break opens
    /// one further empty line.
    pub fn line_count(&self) -> usize {
        self.line_offsets.len()
    }

    /// Returns the detected dominant line-break style.
    pub fn line_break(&self) -> LineBreak {
        self.line_break
    }

    /// Returns the text of the given line without its trailing line break,
    /// or `None` when the line does not exist.
    pub fn line_text(&self, line: usize) -> Option<&str> {
        let start = *self.line_offsets.get(line)?;
        let end = self
            .line_offsets
            .get(line + 1)
            .map(|&next| {
                let mut end = next;
                if end > start && self.text.as_bytes()[end - 1] == b'\n' {
                    end -= 1;
                }
                if end > start && self.text.as_bytes()[end - 1] == b'\r' {
                    end -= 1;
                }
                end
            })
            .unwrap_or(self.text.len());
        Some(&self.text[start..end])
    }

    /// Converts a position to a byte offset, clamping to document bounds.
    pub fn offset_at(&self, position: Position) -> usize {
        let line = position.line.min(self.line_offsets.len() - 1);
        let line_start = self.line_offsets[line];
        let line_end = self
            .line_offsets
            .get(line + 1)
            .copied()
            .unwrap_or(self.text.len());
        (line_start + position.character).min(line_end)
    }

    /// Converts a byte offset to a position, clamping to document bounds.
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let line = match self.line_offsets.binary_search(&offset) {
            Ok(line) => line,
            Err(insertion) => insertion - 1,
        };
        Position::new(line, offset - self.line_offsets[line])
    }

    /// Returns the position one past the last character of the document.
    pub fn end_position(&self) -> Position {
        self.position_at(self.text.len())
    }

    /// Detects the indentation width used inside blocks.
    ///
    /// Takes a majority vote over the leading-space widths of indented
    /// lines, defaulting to 2 when the document carries no indented lines.
    pub fn detect_indent_width(&self) -> usize {
        let mut counts: std::collections::HashMap<usize, usize> = std::collections::HashMap::new();
        for line in self.text.lines() {
            let spaces = line.len() - line.trim_start_matches(' ').len();
            if spaces > 0 && !line.trim().is_empty() {
                *counts.entry(spaces).or_insert(0) += 1;
            }
        }
        counts
            .into_iter()
            .max_by_key(|&(width, count)| (count, std::cmp::Reverse(width)))
            .map(|(width, _)| width)
            .unwrap_or(2)
    }
}
