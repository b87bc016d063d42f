//! Write-time param synchronization.
//!
//! Invoked once at save, never for live diagnostics. Path params flow from
//! the URL into the `params:path` block (the URL is authoritative); the
//! query string flows from the `params:query` block into the URL (the
//! block is authoritative). All edits target the original document; a
//! second run over the fixed document produces no further edits.

use crate::blocks::{Block, DictionaryField, ParseResult};
use crate::document::{Document, Position, Range};
use crate::edit::TextEdit;
use crate::params::path_param_names;

fn method_url(result: &ParseResult) -> Option<(&str, Range)> {
    let method = result.method_block()?;
    match method.field("url")? {
        DictionaryField::Simple {
            value: Some(value),
            value_range: Some(range),
            ..
        } => Some((value, *range)),
        _ => None,
    }
}

/// Returns the single closed instance of a params block, or `None` when it
/// is absent, duplicated or unclosed (duplicated and unclosed blocks are
/// the diagnostics' concern, not the fixer's).
fn usable_block<'a>(result: &'a ParseResult, name: &str) -> Option<&'a Block> {
    let block = result.single_block(name)?;
    if block.closed {
        Some(block)
    } else {
        None
    }
}

fn new_param_lines(document: &Document, names: &[&str]) -> String {
    let indent = " ".repeat(document.detect_indent_width());
    let line_break = document.line_break().as_str();
    names
        .iter()
        .map(|name| format!("{}{}: {}", indent, name, line_break))
        .collect()
}

/// Deletes a whole block without leaving an orphan blank line: from the
/// previous block's content end through this block's content end, or, for
/// the first block, from document start through the next block's name
/// start.
fn whole_block_deletion(result: &ParseResult, block: &Block) -> TextEdit {
    let index = result
        .blocks
        .iter()
        .position(|b| b.name_range == block.name_range)
        .unwrap_or(0);
    let range = if index > 0 {
        Range::new(result.blocks[index - 1].content_range.end, block.content_range.end)
    } else if let Some(next) = result.blocks.get(index + 1) {
        Range::new(Position::new(0, 0), next.name_range.start)
    } else {
        Range::new(Position::new(0, 0), block.content_range.end)
    };
    TextEdit::delete(range)
}

/// Synchronizes the `params:path` block from the URL.
pub fn sync_path_edits(document: &Document, result: &ParseResult) -> Vec<TextEdit> {
    let (url, _) = match method_url(result) {
        Some(field) => field,
        None => return Vec::new(),
    };
    let names = path_param_names(url);
    let names: Vec<&str> = names.iter().map(String::as_str).collect();

    let block = match result.blocks_named("params:path").count() {
        0 => {
            if names.is_empty() {
                return Vec::new();
            }
            // No block yet: synthesize one right after the method block.
            let method = match result.method_block() {
                Some(method) if method.closed => method,
                _ => return Vec::new(),
            };
            let line_break = document.line_break().as_str();
            let text = format!(
                "{}{}params:path {{{}{}}}",
                line_break,
                line_break,
                line_break,
                new_param_lines(document, &names)
            );
            return vec![TextEdit::insert(method.content_range.end, text)];
        }
        1 => match usable_block(result, "params:path") {
            Some(block) => block,
            None => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    if names.is_empty() {
        return vec![whole_block_deletion(result, block)];
    }

    let fields = match block.dictionary() {
        Some(fields) => fields,
        None => return Vec::new(),
    };

    let mut edits = Vec::new();

    // Delete lines for params the URL no longer has.
    let mut present: Vec<&str> = Vec::new();
    for field in fields {
        if field.disabled() {
            continue;
        }
        let (key, key_range) = match (field.key(), field.key_range()) {
            (Some(key), Some(range)) => (key, range),
            _ => continue,
        };
        if names.contains(&key) {
            if !present.contains(&key) {
                present.push(key);
            }
        } else {
            edits.push(TextEdit::delete(Range::new(
                Position::new(key_range.start.line, 0),
                Position::new(key_range.start.line + 1, 0),
            )));
        }
    }

    // Insert lines for params the block is missing, just before the
    // closing brace.
    let missing: Vec<&str> = names
        .iter()
        .copied()
        .filter(|name| !present.contains(name))
        .collect();
    if !missing.is_empty() {
        edits.push(TextEdit::insert(
            Position::new(block.content_range.end.line, 0),
            new_param_lines(document, &missing),
        ));
    }

    edits
}

/// Synchronizes the URL's query string from the `params:query` block.
pub fn sync_query_edits(result: &ParseResult) -> Vec<TextEdit> {
    let (url, url_range) = match method_url(result) {
        Some(field) => field,
        None => return Vec::new(),
    };
    let block = match usable_block(result, "params:query") {
        Some(block) => block,
        None => return Vec::new(),
    };
    let fields = match block.dictionary() {
        Some(fields) => fields,
        None => return Vec::new(),
    };

    // Duplicated keys are preserved as repeated entries.
    let entries: Vec<(&str, &str)> = fields
        .iter()
        .filter(|field| !field.disabled())
        .filter_map(|field| match field {
            DictionaryField::Simple { key, value, .. } => {
                Some((key.as_str(), value.as_deref().unwrap_or("")))
            }
            _ => None,
        })
        .collect();

    let desired = if entries.is_empty() {
        String::new()
    } else {
        let joined: Vec<String> = entries
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        format!("?{}", joined.join("&"))
    };

    let (current, suffix_start) = match url.find('?') {
        Some(index) => (&url[index..], index),
        None => ("", url.len()),
    };
    if current == desired {
        return Vec::new();
    }

    // The URL value is a single line; character positions are byte-based.
    let range = Range::new(
        Position::new(
            url_range.start.line,
            url_range.start.character + suffix_start,
        ),
        url_range.end,
    );
    vec![TextEdit::replace(range, desired)]
}

/// The full write-time fix: path edits then query edits, all against the
/// original document.
pub fn sync_edits(document: &Document, result: &ParseResult) -> Vec<TextEdit> {
    let mut edits = sync_path_edits(document, result);
    edits.extend(sync_query_edits(result));
    edits
}
