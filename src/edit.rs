//! Text edits.
//!
//! Every corrective operation in this crate is expressed as a set of
//! `(range, replacement)` pairs against the original, unmodified document.
//! The core never re-parses its own output; applying the edits is the
//! host's job.

use crate::document::{Document, Range};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single replacement of a document range with new text.
///
/// An insertion is an edit with an empty range; a deletion is an edit with
/// empty `new_text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    /// The range to replace, against the original document
    pub range: Range,
    /// The replacement text
    pub new_text: String,
}

impl TextEdit {
    /// Creates a replacement edit.
    pub fn replace(range: Range, new_text: impl Into<String>) -> Self {
        Self {
            range,
            new_text: new_text.into(),
        }
    }

    /// Creates an insertion edit at a single position.
    pub fn insert(position: crate::document::Position, new_text: impl Into<String>) -> Self {
        Self {
            range: Range::at(position),
            new_text: new_text.into(),
        }
    }

    /// Creates a deletion edit.
    pub fn delete(range: Range) -> Self {
        Self {
            range,
            new_text: String::new(),
        }
    }
}

/// A set of edits targeting one file, used by cross-file operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEdit {
    pub path: PathBuf,
    pub edits: Vec<TextEdit>,
}

/// Applies a set of edits to a document, returning the new text.
///
/// Edits must not overlap. They are applied back-to-front so earlier
/// ranges stay valid; this is a convenience for tests and hosts that do
/// not have their own edit machinery.
pub fn apply_edits(document: &Document, edits: &[TextEdit]) -> String {
    let mut sorted: Vec<&TextEdit> = edits.iter().collect();
    sorted.sort_by_key(|e| (e.range.start, e.range.end));

    let mut text = document.text().to_string();
    for edit in sorted.iter().rev() {
        let start = document.offset_at(edit.range.start);
        let end = document.offset_at(edit.range.end);
        text.replace_range(start..end, &edit.new_text);
    }
    text
}
