//! Sequence renumbering for move and insert operations.
//!
//! Both utilities rewrite only the digits of each file's `seq:` line, a
//! direct substitution that preserves the surrounding whitespace rather
//! than re-serializing the block.

use crate::document::Document;
use crate::edit::{FileEdit, TextEdit};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;

static SEQ_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*~?seq[ \t]*:[ \t]*(\d+)[ \t]*\r?$")
        .unwrap_or_else(|e| panic!("invalid seq line regex: {}", e))
});

/// One sibling file with its current text.
#[derive(Debug, Clone)]
pub struct SiblingDocument {
    pub path: PathBuf,
    pub document: Document,
}

/// The byte range of the `seq:` digits and their current value.
fn seq_digits(document: &Document) -> Option<(std::ops::Range<usize>, u64)> {
    let captures = SEQ_LINE.captures(document.text())?;
    let digits = captures.get(1)?;
    let value = digits.as_str().parse::<u64>().ok()?;
    Some((digits.range(), value))
}

fn replace_seq(document: &Document, digits: std::ops::Range<usize>, value: u64) -> TextEdit {
    TextEdit::replace(
        crate::document::Range::new(
            document.position_at(digits.start),
            document.position_at(digits.end),
        ),
        value.to_string(),
    )
}

/// Shifts every sibling's `seq` at or after the insertion position up by
/// one, making room for a new file at `insert_at`.
pub fn shift_for_insertion(files: &[SiblingDocument], insert_at: u64) -> Vec<FileEdit> {
    files
        .iter()
        .filter_map(|file| {
            let (digits, value) = seq_digits(&file.document)?;
            if value < insert_at {
                return None;
            }
            Some(FileEdit {
                path: file.path.clone(),
                edits: vec![replace_seq(&file.document, digits, value + 1)],
            })
        })
        .collect()
}

/// Renumbers all siblings to a dense ascending `1..N` sequence, keeping
/// their current relative order (ties broken by input order). Files whose
/// `seq` already matches produce no edit.
pub fn normalize(files: &[SiblingDocument]) -> Vec<FileEdit> {
    let mut sequenced: Vec<(usize, std::ops::Range<usize>, u64)> = files
        .iter()
        .enumerate()
        .filter_map(|(index, file)| {
            let (digits, value) = seq_digits(&file.document)?;
            Some((index, digits, value))
        })
        .collect();
    sequenced.sort_by_key(|(index, _, value)| (*value, *index));

    sequenced
        .into_iter()
        .enumerate()
        .filter_map(|(position, (index, digits, value))| {
            let target = position as u64 + 1;
            if value == target {
                return None;
            }
            let file = &files[index];
            Some(FileEdit {
                path: file.path.clone(),
                edits: vec![replace_seq(&file.document, digits, target)],
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::apply_edits;

    fn file(path: &str, seq: u64) -> SiblingDocument {
        SiblingDocument {
            path: PathBuf::from(path),
            document: Document::new(format!(
                "meta {{\n  name: {}\n  seq: {}\n}}\n",
                path, seq
            )),
        }
    }

    fn applied(file: &SiblingDocument, edits: &[FileEdit]) -> String {
        match edits.iter().find(|e| e.path == file.path) {
            Some(edit) => apply_edits(&file.document, &edit.edits),
            None => file.document.text().to_string(),
        }
    }

    #[test]
    fn test_shift_at_and_after_insertion_point() {
        let files = vec![file("/c/a.bru", 1), file("/c/b.bru", 2), file("/c/c.bru", 3)];
        let edits = shift_for_insertion(&files, 2);
        assert_eq!(edits.len(), 2);
        assert!(applied(&files[0], &edits).contains("seq: 1\n"));
        assert!(applied(&files[1], &edits).contains("seq: 3\n"));
        assert!(applied(&files[2], &edits).contains("seq: 4\n"));
    }

    #[test]
    fn test_shift_preserves_surrounding_text() {
        let sibling = SiblingDocument {
            path: PathBuf::from("/c/a.bru"),
            document: Document::new("meta {\n  seq:   7  \n  name: x\n}\n"),
        };
        let edits = shift_for_insertion(std::slice::from_ref(&sibling), 1);
        assert_eq!(
            applied(&sibling, &edits),
            "meta {\n  seq:   8  \n  name: x\n}\n"
        );
    }

    #[test]
    fn test_normalize_to_dense_sequence() {
        let files = vec![file("/c/a.bru", 5), file("/c/b.bru", 2), file("/c/c.bru", 9)];
        let edits = normalize(&files);
        assert!(applied(&files[1], &edits).contains("seq: 1\n"));
        assert!(applied(&files[0], &edits).contains("seq: 2\n"));
        assert!(applied(&files[2], &edits).contains("seq: 3\n"));
    }

    #[test]
    fn test_normalize_dense_input_is_noop() {
        let files = vec![file("/c/a.bru", 1), file("/c/b.bru", 2)];
        assert!(normalize(&files).is_empty());
    }

    #[test]
    fn test_normalize_breaks_ties_by_input_order() {
        let files = vec![file("/c/a.bru", 3), file("/c/b.bru", 3)];
        let edits = normalize(&files);
        assert!(applied(&files[0], &edits).contains("seq: 1\n"));
        assert!(applied(&files[1], &edits).contains("seq: 2\n"));
    }

    #[test]
    fn test_file_without_seq_is_skipped() {
        let sibling = SiblingDocument {
            path: PathBuf::from("/c/folder.bru"),
            document: Document::new("meta {\n  name: folder\n}\n"),
        };
        assert!(shift_for_insertion(std::slice::from_ref(&sibling), 1).is_empty());
        assert!(normalize(std::slice::from_ref(&sibling)).is_empty());
    }
}
