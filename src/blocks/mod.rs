//! The block model.
//!
//! A `.bru` file is a flat sequence of named, bracket-delimited blocks.
//! This module defines the typed representation the parser produces and
//! everything downstream consumes read-only: [`Block`], its four content
//! shapes, the residual [`TextOutsideOfBlocks`] entries, and the
//! [`ParseResult`] that bundles them.

pub mod shape;

use crate::document::Range;
use serde::{Deserialize, Serialize};

pub use shape::{allowed_names, is_auth_block, is_body_block, is_method_block, shape_of, BlockShape};

/// A single entry of an array block or of an array-valued dictionary field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayEntry {
    /// The entry text, trimmed, without a trailing comma
    pub content: String,
    /// Range of the trimmed entry text
    pub range: Range,
}

/// A raw line of a plain-text block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextLine {
    /// The raw line text, without its line break
    pub text: String,
    /// Range of the raw line
    pub range: Range,
}

/// One field of a dictionary block.
///
/// Keys may repeat across fields; duplication is diagnosed later, never
/// rejected at parse time. Lines matching no field pattern are kept as
/// [`DictionaryField::Malformed`] so checks can report exactly which lines
/// are invalid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DictionaryField {
    /// A `key: value` line. A leading `~` marks the field disabled.
    Simple {
        key: String,
        key_range: Range,
        /// The value text, `None` when nothing follows the colon
        value: Option<String>,
        value_range: Option<Range>,
        disabled: bool,
    },
    /// A `key: [` line opening a nested array value.
    ArrayValue {
        key: String,
        key_range: Range,
        /// Range from the opening `[` through the closing `]`
        array_range: Range,
        values: Vec<ArrayEntry>,
    },
    /// A content line matching neither field pattern, kept for diagnosis.
    Malformed { text: String, range: Range },
}

impl DictionaryField {
    /// Returns the field's key, or `None` for malformed lines.
    pub fn key(&self) -> Option<&str> {
        match self {
            DictionaryField::Simple { key, .. } => Some(key),
            DictionaryField::ArrayValue { key, .. } => Some(key),
            DictionaryField::Malformed { .. } => None,
        }
    }

    /// Returns the range of the field's key, or `None` for malformed lines.
    pub fn key_range(&self) -> Option<Range> {
        match self {
            DictionaryField::Simple { key_range, .. } => Some(*key_range),
            DictionaryField::ArrayValue { key_range, .. } => Some(*key_range),
            DictionaryField::Malformed { .. } => None,
        }
    }

    /// Returns true for fields disabled with a leading `~`.
    pub fn disabled(&self) -> bool {
        matches!(self, DictionaryField::Simple { disabled: true, .. })
    }
}

/// The parsed content of a block.
///
/// Which shape a block is *supposed* to have is a pure function of its name
/// (see [`shape::shape_of`]); which shape it actually parsed with depends on
/// the bracket it opened with. The two disagreeing is a diagnosable state,
/// not a parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockContent {
    /// Ordered `key: value` fields
    Dictionary(Vec<DictionaryField>),
    /// Ordered bare values
    Array(Vec<ArrayEntry>),
    /// Embedded script or JSON source, kept raw
    Code {
        /// The raw source between the brackets
        text: String,
        /// Range of the raw source
        range: Range,
    },
    /// Raw lines with ranges; also the degraded fallback shape
    Text(Vec<TextLine>),
}

/// A named, bracket-delimited section of a `.bru` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// The block name as written, e.g. `meta` or `auth:basic`
    pub name: String,
    /// Range of the name token on the opening line
    pub name_range: Range,
    /// Range from just after the opening bracket through the end of the
    /// closing bracket, or through the end of the document when unclosed
    pub content_range: Range,
    /// True when the block carries a leading `~`
    pub disabled: bool,
    /// False when no closing bracket was found before end of document;
    /// the parser-visible "still open" state, diagnosed later
    pub closed: bool,
    pub content: BlockContent,
}

impl Block {
    /// Returns the dictionary fields, or `None` when the block did not
    /// parse as a dictionary.
    pub fn dictionary(&self) -> Option<&[DictionaryField]> {
        match &self.content {
            BlockContent::Dictionary(fields) => Some(fields),
            _ => None,
        }
    }

    /// Returns the first enabled `key: value` field with the given key.
    pub fn field(&self, key: &str) -> Option<&DictionaryField> {
        self.dictionary()?
            .iter()
            .find(|f| f.key() == Some(key) && !f.disabled())
    }

    /// Returns the value text of the first enabled field with the given key.
    pub fn field_value(&self, key: &str) -> Option<&str> {
        match self.field(key)? {
            DictionaryField::Simple { value, .. } => value.as_deref(),
            _ => None,
        }
    }
}

/// A byte range of the document not owned by any recognized block.
///
/// One entry covers a contiguous run of outside lines, blank runs included;
/// the separation check relies on blank runs being represented here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextOutsideOfBlocks {
    pub text: String,
    pub range: Range,
}

impl TextOutsideOfBlocks {
    /// Returns true when the run is entirely blank lines.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// The output of one parse: blocks plus residual text, consumed read-only.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParseResult {
    pub blocks: Vec<Block>,
    pub text_outside_of_blocks: Vec<TextOutsideOfBlocks>,
}

impl ParseResult {
    /// Returns every block with the given name, in document order.
    pub fn blocks_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Block> {
        self.blocks.iter().filter(move |b| b.name == name)
    }

    /// Returns the block with the given name when exactly one exists.
    pub fn single_block(&self, name: &str) -> Option<&Block> {
        let mut found = self.blocks.iter().filter(|b| b.name == name);
        let first = found.next()?;
        if found.next().is_some() {
            return None;
        }
        Some(first)
    }

    /// Returns every block whose name starts with `prefix`, in document order.
    pub fn blocks_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a Block> {
        self.blocks.iter().filter(move |b| b.name.starts_with(prefix))
    }

    /// Returns the method blocks (`get`, `post`, …), in document order.
    pub fn method_blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(|b| is_method_block(&b.name))
    }

    /// Returns the method block when exactly one exists.
    pub fn method_block(&self) -> Option<&Block> {
        let mut methods = self.method_blocks();
        let first = methods.next()?;
        if methods.next().is_some() {
            return None;
        }
        Some(first)
    }

    /// Returns the auth blocks (`auth:basic`, `auth:bearer`, …), excluding
    /// the plain `auth` mode-selector block.
    pub fn auth_blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(|b| is_auth_block(&b.name))
    }

    /// Returns the body blocks, excluding the `body:graphql:vars` companion.
    pub fn body_blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(|b| is_body_block(&b.name))
    }
}
