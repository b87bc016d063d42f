//! Param extraction and URL/block consistency diagnostics.
//!
//! Path-param names are the `:name` segments of the URL's path portion;
//! query-param entries come from standard query-string decomposition.
//! The read-only checks here compare those against the `params:path` and
//! `params:query` blocks; the corrective edits live in [`sync`].

pub mod sync;

use crate::blocks::Block;
use crate::diagnostics::method::url_field;
use crate::diagnostics::{
    CheckContext, Diagnostic, DiagnosticCode, MethodCode, RelatedInformation,
};
use url::form_urlencoded;

/// Extracts path-param names from a URL: the `:name` segments of the path
/// portion, query string stripped first, order preserved, de-duplicated.
pub fn path_param_names(url: &str) -> Vec<String> {
    let path = url.split('?').next().unwrap_or(url);
    let mut names: Vec<String> = Vec::new();
    for segment in path.split('/') {
        if let Some(name) = segment.strip_prefix(':') {
            if !name.is_empty() && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

/// Extracts query-param entries from everything after the first `?`,
/// duplicates preserved as repeated entries.
pub fn query_param_entries(url: &str) -> Vec<(String, String)> {
    let query = match url.split_once('?') {
        Some((_, query)) => query,
        None => return Vec::new(),
    };
    form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

/// The enabled simple-field keys of a dictionary block, order preserved,
/// de-duplicated.
fn block_keys(block: &Block) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for field in block.dictionary().unwrap_or_default() {
        if field.disabled() {
            continue;
        }
        if let Some(key) = field.key() {
            if !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
            }
        }
    }
    keys
}

/// How a params block relates to the current parse: absent, usable, or
/// out of scope for this check (duplicated or malformed, handled by the
/// structural tier).
enum ParamsBlock<'a> {
    Absent,
    Present(&'a Block),
    Skip,
}

fn params_block<'a>(ctx: &CheckContext<'a>, name: &str) -> ParamsBlock<'a> {
    let count = ctx.parse_result.blocks_named(name).count();
    match count {
        0 => ParamsBlock::Absent,
        1 => match ctx.single_dictionary_block(name) {
            Some(block) => ParamsBlock::Present(block),
            None => ParamsBlock::Skip,
        },
        _ => ParamsBlock::Skip,
    }
}

fn consistency_diagnostics(
    ctx: &CheckContext,
    block_name: &str,
    url_names: Vec<String>,
    url_range: crate::document::Range,
    kind_label: &str,
    code: DiagnosticCode,
) -> Vec<Diagnostic> {
    let block = match params_block(ctx, block_name) {
        ParamsBlock::Absent => {
            if url_names.is_empty() {
                return Vec::new();
            }
            return vec![Diagnostic::error(
                url_range,
                code,
                format!(
                    "URL has {} params ({}) but no '{}' block",
                    kind_label,
                    url_names.join(", "),
                    block_name
                ),
            )];
        }
        ParamsBlock::Present(block) => block,
        ParamsBlock::Skip => return Vec::new(),
    };

    let keys = block_keys(block);
    let missing_in_block: Vec<&str> = url_names
        .iter()
        .map(String::as_str)
        .filter(|name| !keys.iter().any(|k| k == name))
        .collect();
    let missing_in_url: Vec<&str> = keys
        .iter()
        .map(String::as_str)
        .filter(|key| !url_names.iter().any(|n| n == key))
        .collect();

    match (missing_in_block.is_empty(), missing_in_url.is_empty()) {
        (true, true) => Vec::new(),
        (false, true) => vec![Diagnostic::error(
            url_range,
            code,
            format!(
                "Block '{}' is missing {} params from the URL: {}",
                block_name,
                kind_label,
                missing_in_block.join(", ")
            ),
        )
        .with_related(vec![RelatedInformation::new(
            block.name_range,
            format!("Block '{}' defined here", block_name),
        )])],
        (true, false) => vec![Diagnostic::error(
            block.content_range,
            code,
            format!(
                "Block '{}' has {} params not in the URL: {}",
                block_name,
                kind_label,
                missing_in_url.join(", ")
            ),
        )
        .with_related(vec![RelatedInformation::new(
            url_range,
            "URL defined here",
        )])],
        (false, false) => vec![Diagnostic::error(
            url_range,
            code,
            format!(
                "Block '{}' is out of sync with the URL: missing {} params {}; extra {} params {}",
                block_name,
                kind_label,
                missing_in_block.join(", "),
                kind_label,
                missing_in_url.join(", ")
            ),
        )
        .with_related(vec![RelatedInformation::new(
            block.name_range,
            format!("Block '{}' defined here", block_name),
        )])],
    }
}

/// The `params:path` block must mirror the URL's `:name` segments.
pub fn check_path_params(ctx: &CheckContext) -> Vec<Diagnostic> {
    let (url, url_range) = match url_field(ctx) {
        Some(field) => field,
        None => return Vec::new(),
    };
    consistency_diagnostics(
        ctx,
        "params:path",
        path_param_names(&url),
        url_range,
        "path",
        DiagnosticCode::Method(MethodCode::PathParams),
    )
}

/// The `params:query` block must mirror the URL's query string.
pub fn check_query_params(ctx: &CheckContext) -> Vec<Diagnostic> {
    let (url, url_range) = match url_field(ctx) {
        Some(field) => field,
        None => return Vec::new(),
    };
    let mut names: Vec<String> = Vec::new();
    for (name, _) in query_param_entries(&url) {
        if !names.iter().any(|n| *n == name) {
            names.push(name);
        }
    }
    consistency_diagnostics(
        ctx,
        "params:query",
        names,
        url_range,
        "query",
        DiagnosticCode::Method(MethodCode::QueryParams),
    )
}
