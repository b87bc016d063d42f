//! The block parser.
//!
//! Tokenizes raw `.bru` text into typed blocks plus a residual list of
//! text-outside-of-blocks entries. Parsing never fails: malformed input
//! degrades to plain-text or per-line malformed representations that later
//! checks diagnose. Multiple blocks may share a name and dictionary keys
//! may repeat; duplication is a diagnostic concern, not a parse-time
//! rejection.

pub mod brace;

use crate::blocks::{
    shape_of, ArrayEntry, Block, BlockContent, BlockShape, DictionaryField, ParseResult, TextLine,
    TextOutsideOfBlocks,
};
use crate::document::{Document, Position, Range};
use brace::{BraceMatcher, ScriptBraceMatcher};
use once_cell::sync::Lazy;
use regex::Regex;

/// Matches a block-start line: optional whitespace, optional `~`, a block
/// name (with optional `:`-separated parameter segments), an opening `{`
/// or `[`, and nothing else.
static BLOCK_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\s*)(~)?([A-Za-z][A-Za-z0-9_-]*(?::[A-Za-z0-9_-]+)*)\s*([{\[])\s*$")
        .expect("block start pattern is valid")
});

/// Parses a document into blocks plus residual outside text.
///
/// Uses the default [`ScriptBraceMatcher`] for code-shaped blocks; see
/// [`parse_with_matcher`] to supply the embedded language's own parser.
pub fn parse(document: &Document) -> ParseResult {
    parse_with_matcher(document, &ScriptBraceMatcher)
}

/// Parses a document using the given brace matcher for code-shaped blocks.
pub fn parse_with_matcher(document: &Document, matcher: &dyn BraceMatcher) -> ParseResult {
    Parser { document, matcher }.run()
}

struct Parser<'a> {
    document: &'a Document,
    matcher: &'a dyn BraceMatcher,
}

impl<'a> Parser<'a> {
    fn run(&self) -> ParseResult {
        let mut blocks = Vec::new();
        let mut outside = Vec::new();
        let mut outside_start: Option<usize> = None;

        let line_count = self.document.line_count();
        let mut line = 0;
        while line < line_count {
            let text = self
                .document
                .line_text(line)
                .unwrap_or_default()
                .to_string();
            if let Some(caps) = BLOCK_START.captures(&text) {
                self.flush_outside(&mut outside, outside_start.take(), line);
                let (block, next_line) = self.parse_block(line, &text, &caps);
                blocks.push(block);
                line = next_line;
            } else {
                if outside_start.is_none() {
                    outside_start = Some(line);
                }
                line += 1;
            }
        }
        self.flush_outside(&mut outside, outside_start.take(), line_count);

        ParseResult {
            blocks,
            text_outside_of_blocks: outside,
        }
    }

    /// Records the pending run of lines not owned by any block.
    fn flush_outside(
        &self,
        outside: &mut Vec<TextOutsideOfBlocks>,
        run_start: Option<usize>,
        run_end: usize,
    ) {
        let Some(start_line) = run_start else {
            return;
        };
        let start = self.document.offset_at(Position::new(start_line, 0));
        let end = if run_end < self.document.line_count() {
            self.document.offset_at(Position::new(run_end, 0))
        } else {
            self.document.text().len()
        };
        if start == end {
            // The empty virtual line after a trailing line break.
            return;
        }
        outside.push(TextOutsideOfBlocks {
            text: self.document.text()[start..end].to_string(),
            range: Range::new(
                self.document.position_at(start),
                self.document.position_at(end),
            ),
        });
    }

    /// Parses one block starting at `line`; returns it and the next line
    /// to scan from.
    fn parse_block(&self, line: usize, text: &str, caps: &regex::Captures<'_>) -> (Block, usize) {
        let indent = caps.get(1).map_or(0, |m| m.as_str().len());
        let disabled = caps.get(2).is_some();
        let name = caps.get(3).map_or("", |m| m.as_str()).to_string();
        let bracket = caps.get(4).map_or("{", |m| m.as_str());

        let name_start = indent + usize::from(disabled);
        let name_range = Range::at_line(line, name_start, name_start + name.len());
        let bracket_col = text.trim_end().len() - 1;
        let content_start = Position::new(line, bracket_col + 1);

        if bracket == "[" {
            return self.parse_array_block(line, name, name_range, disabled, content_start);
        }

        match shape_of(&name) {
            Some(BlockShape::Dictionary) => {
                self.parse_dictionary_block(line, name, name_range, disabled, content_start)
            }
            Some(BlockShape::Code) | Some(BlockShape::Json) => {
                self.parse_code_block(line, name, name_range, disabled, content_start, bracket_col)
            }
            // Text-shaped and unknown names both fall back to raw lines.
            _ => self.parse_text_block(line, name, name_range, disabled, content_start),
        }
    }

    fn parse_array_block(
        &self,
        open_line: usize,
        name: String,
        name_range: Range,
        disabled: bool,
        content_start: Position,
    ) -> (Block, usize) {
        let mut values = Vec::new();
        let mut line = open_line + 1;
        while let Some(text) = self.document.line_text(line) {
            if text.trim() == "]" {
                let close_col = text.find(']').unwrap_or(0);
                let block = Block {
                    name,
                    name_range,
                    content_range: Range::new(content_start, Position::new(line, close_col + 1)),
                    disabled,
                    closed: true,
                    content: BlockContent::Array(values),
                };
                return (block, line + 1);
            }
            if let Some(entry) = array_entry(text, line) {
                values.push(entry);
            }
            line += 1;
        }

        // No closing `]` before end of document: a parser-visible "still
        // open" state, surfaced later as a diagnostic.
        let block = Block {
            name,
            name_range,
            content_range: Range::new(content_start, self.document.end_position()),
            disabled,
            closed: false,
            content: BlockContent::Array(values),
        };
        (block, self.document.line_count())
    }

    fn parse_dictionary_block(
        &self,
        open_line: usize,
        name: String,
        name_range: Range,
        disabled: bool,
        content_start: Position,
    ) -> (Block, usize) {
        let mut fields = Vec::new();
        let mut line = open_line + 1;
        while let Some(text) = self.document.line_text(line) {
            if text.trim() == "}" {
                let close_col = text.find('}').unwrap_or(0);
                let block = Block {
                    name,
                    name_range,
                    content_range: Range::new(content_start, Position::new(line, close_col + 1)),
                    disabled,
                    closed: true,
                    content: BlockContent::Dictionary(fields),
                };
                return (block, line + 1);
            }
            if text.trim().is_empty() {
                line += 1;
                continue;
            }
            match parse_dictionary_line(text, line) {
                DictLine::Field(field) => {
                    fields.push(field);
                    line += 1;
                }
                DictLine::ArrayStart {
                    key,
                    key_range,
                    open_col,
                } => {
                    let (field, next) = self.parse_array_field(key, key_range, line, open_col);
                    fields.push(field);
                    line = next;
                }
            }
        }

        let block = Block {
            name,
            name_range,
            content_range: Range::new(content_start, self.document.end_position()),
            disabled,
            closed: false,
            content: BlockContent::Dictionary(fields),
        };
        (block, self.document.line_count())
    }

    /// Parses a `key: [ … ]` array-valued field, continuing until a line
    /// that is exactly `]`, or stopping short of the block's own `}`.
    fn parse_array_field(
        &self,
        key: String,
        key_range: Range,
        open_line: usize,
        open_col: usize,
    ) -> (DictionaryField, usize) {
        let mut values = Vec::new();
        let mut line = open_line + 1;
        while let Some(text) = self.document.line_text(line) {
            let trimmed = text.trim();
            if trimmed == "]" {
                let close_col = text.find(']').unwrap_or(0);
                let field = DictionaryField::ArrayValue {
                    key,
                    key_range,
                    array_range: Range::new(
                        Position::new(open_line, open_col),
                        Position::new(line, close_col + 1),
                    ),
                    values,
                };
                return (field, line + 1);
            }
            if trimmed == "}" {
                // The block closed before the array did; leave the `}` for
                // the dictionary loop.
                break;
            }
            if let Some(entry) = array_entry(text, line) {
                values.push(entry);
            }
            line += 1;
        }

        let end = if line < self.document.line_count() {
            Position::new(line, 0)
        } else {
            self.document.end_position()
        };
        let field = DictionaryField::ArrayValue {
            key,
            key_range,
            array_range: Range::new(Position::new(open_line, open_col), end),
            values,
        };
        (field, line)
    }

    fn parse_code_block(
        &self,
        open_line: usize,
        name: String,
        name_range: Range,
        disabled: bool,
        content_start: Position,
        bracket_col: usize,
    ) -> (Block, usize) {
        let open_offset = self
            .document
            .offset_at(Position::new(open_line, bracket_col));
        match self
            .matcher
            .find_matching_closing_brace(self.document.text(), open_offset)
        {
            Some(close_offset) => {
                let inner_start = open_offset + 1;
                let text = self.document.text()[inner_start..close_offset].to_string();
                let range = Range::new(
                    self.document.position_at(inner_start),
                    self.document.position_at(close_offset),
                );
                let end = self.document.position_at(close_offset + 1);
                let block = Block {
                    name,
                    name_range,
                    content_range: Range::new(content_start, end),
                    disabled,
                    closed: true,
                    content: BlockContent::Code { text, range },
                };
                (block, end.line + 1)
            }
            None => {
                let inner_start = open_offset + 1;
                let text = self.document.text()[inner_start..].to_string();
                let range = Range::new(
                    self.document.position_at(inner_start),
                    self.document.end_position(),
                );
                let block = Block {
                    name,
                    name_range,
                    content_range: Range::new(content_start, self.document.end_position()),
                    disabled,
                    closed: false,
                    content: BlockContent::Code { text, range },
                };
                (block, self.document.line_count())
            }
        }
    }

    fn parse_text_block(
        &self,
        open_line: usize,
        name: String,
        name_range: Range,
        disabled: bool,
        content_start: Position,
    ) -> (Block, usize) {
        let mut lines = Vec::new();
        let mut line = open_line + 1;
        while let Some(text) = self.document.line_text(line) {
            // Free-text content may legitimately contain indented braces;
            // only an unindented lone `}` terminates the block.
            if text == "}" {
                let block = Block {
                    name,
                    name_range,
                    content_range: Range::new(content_start, Position::new(line, 1)),
                    disabled,
                    closed: true,
                    content: BlockContent::Text(lines),
                };
                return (block, line + 1);
            }
            lines.push(TextLine {
                text: text.to_string(),
                range: Range::at_line(line, 0, text.len()),
            });
            line += 1;
        }

        let block = Block {
            name,
            name_range,
            content_range: Range::new(content_start, self.document.end_position()),
            disabled,
            closed: false,
            content: BlockContent::Text(lines),
        };
        (block, self.document.line_count())
    }
}

/// The two outcomes of parsing a dictionary content line.
enum DictLine {
    Field(DictionaryField),
    ArrayStart {
        key: String,
        key_range: Range,
        open_col: usize,
    },
}

/// Parses one dictionary content line into a field.
///
/// Lines matching neither the `key: value` nor the `key: [` pattern are
/// kept as [`DictionaryField::Malformed`] so checks can report exactly
/// which lines are invalid.
fn parse_dictionary_line(text: &str, line: usize) -> DictLine {
    let content_start = text.len() - text.trim_start().len();
    let mut cursor = content_start;
    let mut disabled = false;
    if text[cursor..].starts_with('~') {
        disabled = true;
        cursor += 1;
    }

    let malformed = || {
        DictLine::Field(DictionaryField::Malformed {
            text: text.to_string(),
            range: Range::at_line(line, 0, text.len()),
        })
    };

    let Some(colon_rel) = text[cursor..].find(':') else {
        return malformed();
    };
    let key_raw = &text[cursor..cursor + colon_rel];
    let key = key_raw.trim_end();
    if key.is_empty() {
        return malformed();
    }
    let key_range = Range::at_line(line, cursor, cursor + key.len());

    let after_colon = cursor + colon_rel + 1;
    let value_raw = &text[after_colon..];
    let value_trimmed = value_raw.trim();

    if value_trimmed == "[" {
        let open_col = after_colon + value_raw.find('[').unwrap_or(0);
        return DictLine::ArrayStart {
            key: key.to_string(),
            key_range,
            open_col,
        };
    }

    if value_trimmed.is_empty() {
        return DictLine::Field(DictionaryField::Simple {
            key: key.to_string(),
            key_range,
            value: None,
            value_range: None,
            disabled,
        });
    }

    let value_start = after_colon + (value_raw.len() - value_raw.trim_start().len());
    DictLine::Field(DictionaryField::Simple {
        key: key.to_string(),
        key_range,
        value: Some(value_trimmed.to_string()),
        value_range: Some(Range::at_line(
            line,
            value_start,
            value_start + value_trimmed.len(),
        )),
        disabled,
    })
}

/// Parses one array entry line; blank lines yield no entry. A single
/// trailing comma is not part of the value.
fn array_entry(text: &str, line: usize) -> Option<ArrayEntry> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let content = trimmed
        .strip_suffix(',')
        .map(str::trim_end)
        .unwrap_or(trimmed);
    if content.is_empty() {
        return None;
    }
    let start = text.len() - text.trim_start().len();
    Some(ArrayEntry {
        content: content.to_string(),
        range: Range::at_line(line, start, start + content.len()),
    })
}
