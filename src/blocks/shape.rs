//! Block shape classification.
//!
//! A block's *shape* (how its content is parsed and validated) is a pure
//! function of its name, decided once by the lookup table here and
//! independent of what the block actually contains. Adding a new block kind
//! means adding one table entry.

use crate::FileKind;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// How a block's content is parsed, classified purely from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockShape {
    /// `key: value` fields, optionally with array-valued fields
    Dictionary,
    /// A bracketed list of bare values
    Array,
    /// Embedded script source, delimited by lexical brace matching
    Code,
    /// Raw text validated separately as JSON (placeholders allowed)
    Json,
    /// Raw lines, no further structure
    Text,
}

/// The HTTP verb block names.
pub const METHOD_BLOCK_NAMES: &[&str] = &[
    "get", "post", "put", "delete", "patch", "options", "head", "trace", "connect",
];

/// The typed auth block names (the plain `auth` mode selector is separate).
pub const AUTH_BLOCK_NAMES: &[&str] = &[
    "auth:awsv4",
    "auth:basic",
    "auth:bearer",
    "auth:digest",
    "auth:ntlm",
    "auth:oauth2",
    "auth:wsse",
    "auth:apikey",
];

/// The body block names. `body:graphql:vars` rides along with
/// `body:graphql` and is not counted against the one-body rule.
pub const BODY_BLOCK_NAMES: &[&str] = &[
    "body:json",
    "body:text",
    "body:xml",
    "body:sparql",
    "body:graphql",
    "body:form-urlencoded",
    "body:multipart-form",
];

static SHAPES: Lazy<HashMap<&'static str, BlockShape>> = Lazy::new(|| {
    let mut table = HashMap::new();

    table.insert("meta", BlockShape::Dictionary);
    for name in METHOD_BLOCK_NAMES {
        table.insert(*name, BlockShape::Dictionary);
    }
    table.insert("params:path", BlockShape::Dictionary);
    table.insert("params:query", BlockShape::Dictionary);
    table.insert("headers", BlockShape::Dictionary);
    table.insert("auth", BlockShape::Dictionary);
    for name in AUTH_BLOCK_NAMES {
        table.insert(*name, BlockShape::Dictionary);
    }
    table.insert("body:form-urlencoded", BlockShape::Dictionary);
    table.insert("body:multipart-form", BlockShape::Dictionary);
    table.insert("vars:pre-request", BlockShape::Dictionary);
    table.insert("vars:post-response", BlockShape::Dictionary);
    table.insert("assert", BlockShape::Dictionary);
    table.insert("settings", BlockShape::Dictionary);
    table.insert("vars", BlockShape::Dictionary);

    table.insert("vars:secret", BlockShape::Array);

    table.insert("script:pre-request", BlockShape::Code);
    table.insert("script:post-response", BlockShape::Code);
    table.insert("tests", BlockShape::Code);

    // The one json-shaped name: validated separately rather than at parse
    // time, because values routinely contain {{variable}} placeholders.
    table.insert("body:json", BlockShape::Json);

    table.insert("docs", BlockShape::Text);
    table.insert("body:text", BlockShape::Text);
    table.insert("body:xml", BlockShape::Text);
    table.insert("body:sparql", BlockShape::Text);
    table.insert("body:graphql", BlockShape::Text);
    table.insert("body:graphql:vars", BlockShape::Text);

    table
});

/// Returns the expected shape for a block name, or `None` for names the
/// format does not know.
pub fn shape_of(name: &str) -> Option<BlockShape> {
    SHAPES.get(name).copied()
}

/// Returns true for HTTP verb block names.
pub fn is_method_block(name: &str) -> bool {
    METHOD_BLOCK_NAMES.contains(&name)
}

/// Returns true for typed auth block names (`auth:basic` etc.), not the
/// plain `auth` mode selector.
pub fn is_auth_block(name: &str) -> bool {
    AUTH_BLOCK_NAMES.contains(&name)
}

/// Returns true for body block names, excluding `body:graphql:vars`.
pub fn is_body_block(name: &str) -> bool {
    BODY_BLOCK_NAMES.contains(&name)
}

static REQUEST_NAMES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut names = vec!["meta"];
    names.extend_from_slice(METHOD_BLOCK_NAMES);
    names.extend_from_slice(&["params:path", "params:query", "headers"]);
    names.extend_from_slice(AUTH_BLOCK_NAMES);
    names.extend_from_slice(BODY_BLOCK_NAMES);
    names.push("body:graphql:vars");
    names.extend_from_slice(&[
        "vars:pre-request",
        "vars:post-response",
        "assert",
        "script:pre-request",
        "script:post-response",
        "tests",
        "docs",
        "settings",
    ]);
    names
});

static FOLDER_NAMES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut names = vec!["meta", "headers", "auth"];
    names.extend_from_slice(AUTH_BLOCK_NAMES);
    names.extend_from_slice(&[
        "vars:pre-request",
        "vars:post-response",
        "script:pre-request",
        "script:post-response",
        "tests",
        "docs",
    ]);
    names
});

static COLLECTION_NAMES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut names = vec!["headers", "auth"];
    names.extend_from_slice(AUTH_BLOCK_NAMES);
    names.extend_from_slice(&[
        "vars:pre-request",
        "vars:post-response",
        "script:pre-request",
        "script:post-response",
        "tests",
        "docs",
    ]);
    names
});

const ENVIRONMENT_NAMES: &[&str] = &["vars", "vars:secret"];

/// Returns the block names allowed in the given file kind.
pub fn allowed_names(kind: FileKind) -> &'static [&'static str] {
    match kind {
        FileKind::Request => &REQUEST_NAMES,
        FileKind::FolderSettings => &FOLDER_NAMES,
        FileKind::CollectionSettings => &COLLECTION_NAMES,
        FileKind::Environment => ENVIRONMENT_NAMES,
    }
}
