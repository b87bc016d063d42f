//! Embedded JSON validation for the `body:json` block.
//!
//! Body values routinely contain `{{variable}}` placeholders that are not
//! valid JSON tokens, so the raw text cannot be parsed as-is. Each
//! placeholder is substituted with a digit run of identical byte length
//! (valid both as a bare number token and inside a string), which keeps
//! every offset in the substituted text equal to its offset in the
//! original. A parse error's position therefore maps straight back.

use crate::diagnostics::{BodyCode, CheckContext, Diagnostic, DiagnosticCode};
use crate::document::{Position, Range};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{[^{}\n]*\}\}").unwrap_or_else(|e| panic!("invalid placeholder regex: {}", e))
});

/// Replaces every `{{…}}` placeholder with a same-length digit run.
fn substitute_placeholders(text: &str) -> Cow<'_, str> {
    PLACEHOLDER.replace_all(text, |caps: &regex::Captures| "1".repeat(caps[0].len()))
}

pub fn check_json_body(ctx: &CheckContext) -> Vec<Diagnostic> {
    let block = match ctx.single_body_block() {
        Some(block) if block.name == "body:json" => block,
        _ => return Vec::new(),
    };
    let (text, range) = match &block.content {
        crate::blocks::BlockContent::Code { text, range } => (text, *range),
        _ => return Vec::new(),
    };

    let substituted = substitute_placeholders(text);
    let error = match serde_json::from_str::<serde_json::Value>(&substituted) {
        Ok(_) => return Vec::new(),
        Err(error) => error,
    };

    // serde_json reports 1-based line/column within the substituted text,
    // whose offsets equal the original's. Line 0 means no position is
    // available; fall back to the whole content range.
    let diagnostic_range = if error.line() == 0 {
        range
    } else {
        let position = if error.line() == 1 {
            Position::new(
                range.start.line,
                range.start.character + error.column().saturating_sub(1),
            )
        } else {
            Position::new(
                range.start.line + error.line() - 1,
                error.column().saturating_sub(1),
            )
        };
        if range.contains(position) {
            Range::at(position)
        } else {
            range
        }
    };

    let message = error.to_string();
    let message = message
        .split(" at line ")
        .next()
        .unwrap_or(&message)
        .to_string();

    vec![Diagnostic::error(
        diagnostic_range,
        DiagnosticCode::Body(BodyCode::InvalidJson),
        format!("Invalid JSON body: {}", message),
    )]
}
