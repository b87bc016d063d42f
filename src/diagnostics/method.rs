//! Checks for the HTTP method block (`get`, `post`, …): keys, and the
//! three-way auth and body consistency rules.

use crate::blocks::{Block, DictionaryField};
use crate::diagnostics::consistency::{ConsistencyCheck, DeclaredType, PresentBlock};
use crate::diagnostics::{dictionary, CheckContext, Diagnostic, DiagnosticCode, MethodCode};
use crate::document::Range;

const REQUIRED_KEYS: &[&str] = &["url"];
const ALLOWED_KEYS: &[&str] = &["url", "body", "auth"];

const AUTH_TYPES: &[&str] = &[
    "awsv4", "basic", "bearer", "digest", "ntlm", "oauth2", "wsse", "apikey",
];
const AUTH_SENTINELS: &[&str] = &["none", "inherit"];

const BODY_TYPES: &[&str] = &[
    "json",
    "text",
    "xml",
    "sparql",
    "graphql",
    "form-urlencoded",
    "multipart-form",
];
const BODY_SENTINELS: &[&str] = &["none"];

pub fn check_method_block(ctx: &CheckContext) -> Vec<Diagnostic> {
    let block = match ctx.single_method_block() {
        Some(block) => block,
        None => return Vec::new(),
    };

    let mut diagnostics = Vec::new();
    diagnostics.extend(dictionary::check_missing_keys(
        block,
        REQUIRED_KEYS,
        DiagnosticCode::Method(MethodCode::MissingKeys),
    ));
    diagnostics.extend(dictionary::check_unknown_keys(
        block,
        ALLOWED_KEYS,
        DiagnosticCode::Method(MethodCode::UnknownKeys),
    ));
    diagnostics.extend(dictionary::check_duplicate_keys(
        block,
        DiagnosticCode::Method(MethodCode::DuplicateKeys),
    ));
    diagnostics
}

/// Returns the declaring field's value and anchor range, when present with
/// a value.
fn declared_type<'a>(block: &'a Block, key: &str) -> Option<DeclaredType<'a>> {
    match block.field(key)? {
        DictionaryField::Simple {
            value: Some(value),
            value_range: Some(range),
            ..
        } => Some(DeclaredType {
            value,
            range: *range,
        }),
        _ => None,
    }
}

fn single_family_block<'a>(
    mut blocks: impl Iterator<Item = &'a Block>,
) -> Result<Option<PresentBlock<'a>>, ()> {
    let first = match blocks.next() {
        Some(block) => block,
        None => return Ok(None),
    };
    if blocks.next().is_some() {
        // Multiples are the cardinality check's concern.
        return Err(());
    }
    Ok(Some(PresentBlock {
        name: &first.name,
        name_range: first.name_range,
    }))
}

fn consistency(
    ctx: &CheckContext,
    key: &str,
    check: ConsistencyCheck,
    family_blocks: Result<Option<PresentBlock>, ()>,
) -> Vec<Diagnostic> {
    let method = match ctx.single_method_block() {
        Some(block) => block,
        None => return Vec::new(),
    };
    let block = match family_blocks {
        Ok(block) => block,
        Err(()) => return Vec::new(),
    };
    check.run(declared_type(method, key), block, method.name_range)
}

/// The method block's `auth` field must agree with the `auth:*` block.
pub fn check_auth_consistency(ctx: &CheckContext) -> Vec<Diagnostic> {
    consistency(
        ctx,
        "auth",
        ConsistencyCheck {
            family: "Auth",
            block_prefix: "auth",
            sentinels: AUTH_SENTINELS,
            known_types: AUTH_TYPES,
            code: DiagnosticCode::Method(MethodCode::AuthBlock),
        },
        single_family_block(ctx.parse_result.auth_blocks()),
    )
}

/// The method block's `body` field must agree with the `body:*` block.
pub fn check_body_consistency(ctx: &CheckContext) -> Vec<Diagnostic> {
    consistency(
        ctx,
        "body",
        ConsistencyCheck {
            family: "Body",
            block_prefix: "body",
            sentinels: BODY_SENTINELS,
            known_types: BODY_TYPES,
            code: DiagnosticCode::Method(MethodCode::BodyBlock),
        },
        single_family_block(ctx.parse_result.body_blocks()),
    )
}

/// Returns the method block's `url` value with its range, the input to the
/// param checks.
pub(crate) fn url_field(ctx: &CheckContext) -> Option<(String, Range)> {
    let method = ctx.single_method_block()?;
    match method.field("url")? {
        DictionaryField::Simple {
            value: Some(value),
            value_range: Some(range),
            ..
        } => Some((value.clone(), *range)),
        _ => None,
    }
}
