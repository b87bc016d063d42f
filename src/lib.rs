//! Editor intelligence for Bruno-style request files.
//!
//! This crate is the language core behind `.bru` editor support: it turns
//! raw text into a typed block structure, validates dozens of structural
//! and semantic invariants across block kinds, and keeps the URL string and
//! its parameter blocks consistent via precise text edits.
//!
//! # Architecture
//!
//! The crate is organized into several modules, leaves first:
//!
//! - **document**: immutable line-indexed text view, offset↔position
//!   conversion, line-break and indentation detection
//! - **blocks**: the typed block model and the name→shape lookup table
//! - **parser**: tokenizes raw text into blocks plus residual
//!   text-outside-of-blocks entries; never fails, only degrades
//! - **diagnostics**: a composable set of pure checks producing positioned
//!   diagnostics with related-information chains, and the orchestrator
//!   that selects the pipeline per file kind
//! - **params**: derives path/query parameter names from the URL field and
//!   keeps them consistent with the `params:path` / `params:query` blocks,
//!   both as read-only diagnostics and as write-time corrective edits
//! - **sequence**: enforces `seq` uniqueness across sibling files and
//!   tracks which other files a collision affects
//! - **edit**: the `(range, replacement)` text-edit type all fixes produce
//! - **cancel**: the cooperative cancellation flag observed between checks
//!
//! Data flows one way: raw text → parser → `ParseResult` → diagnostics /
//! param synchronizer / sequence tracker → diagnostics and text edits.
//! Nothing in the core performs I/O except the sequence tracker's sibling
//! lookup, which is a trait implemented by the host.
//!
//! # Example
//!
//! ```
//! use bru_lang::document::Document;
//! use bru_lang::diagnostics::{run_checks, CheckContext};
//! use bru_lang::cancel::CancelFlag;
//! use bru_lang::{parser, FileKind};
//!
//! let text = "meta {\n  name: Get user\n  seq: 1\n}\n\nget {\n  url: https://api.example.com/users\n}\n";
//! let document = Document::new(text);
//! let parsed = parser::parse(&document);
//! let context = CheckContext::new(&document, &parsed, FileKind::Request);
//! let diagnostics = run_checks(&context, &CancelFlag::new());
//! assert!(diagnostics.is_empty());
//! ```

use std::path::Path;

pub mod blocks;
pub mod cancel;
pub mod diagnostics;
pub mod document;
pub mod edit;
pub mod params;
pub mod parser;
pub mod sequence;

/// The kind of `.bru` file under analysis.
///
/// The kind decides which block names are allowed and which check pipeline
/// the diagnostics orchestrator runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// A request file describing one HTTP request
    Request,
    /// A `folder.bru` settings file for a folder of requests
    FolderSettings,
    /// A `collection.bru` settings file at the collection root
    CollectionSettings,
    /// An environment file under `environments/`
    Environment,
}

impl FileKind {
    /// Classifies a file by its path within a collection.
    ///
    /// `folder.bru` and `collection.bru` are settings files; files inside
    /// an `environments` directory are environment files; everything else
    /// is a request file.
    pub fn from_path(path: &Path) -> Self {
        match path.file_name().and_then(|n| n.to_str()) {
            Some("folder.bru") => return FileKind::FolderSettings,
            Some("collection.bru") => return FileKind::CollectionSettings,
            _ => {}
        }
        let in_environments = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            == Some("environments");
        if in_environments {
            FileKind::Environment
        } else {
            FileKind::Request
        }
    }
}
