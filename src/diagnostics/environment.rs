//! Checks for environment files: `vars` and `vars:secret`.

use crate::blocks::{Block, BlockContent};
use crate::diagnostics::meta::duplicate_entries_diagnostic;
use crate::diagnostics::{
    dictionary, CheckContext, Diagnostic, DiagnosticCode, EnvironmentCode, RelatedInformation,
};

pub fn check_vars_block(ctx: &CheckContext) -> Vec<Diagnostic> {
    let block = match ctx.single_dictionary_block("vars") {
        Some(block) => block,
        None => return Vec::new(),
    };
    dictionary::check_duplicate_keys(
        block,
        DiagnosticCode::Environment(EnvironmentCode::DuplicateKeys),
    )
}

fn secret_block<'a>(ctx: &CheckContext<'a>) -> Option<&'a Block> {
    let block = ctx.parse_result.single_block("vars:secret")?;
    match block.content {
        BlockContent::Array(_) => Some(block),
        _ => None,
    }
}

/// Secret names must be unique, grouped like duplicated tags.
pub fn check_secret_block(ctx: &CheckContext) -> Vec<Diagnostic> {
    let block = match secret_block(ctx) {
        Some(block) => block,
        None => return Vec::new(),
    };
    let entries = match &block.content {
        BlockContent::Array(entries) => entries,
        _ => return Vec::new(),
    };
    duplicate_entries_diagnostic(
        entries,
        "secret name",
        DiagnosticCode::Environment(EnvironmentCode::DuplicateSecrets),
    )
    .into_iter()
    .collect()
}

/// A secret name must not shadow a plain variable of the same name.
pub fn check_secret_shadowing(ctx: &CheckContext) -> Vec<Diagnostic> {
    let secrets = match secret_block(ctx) {
        Some(block) => block,
        None => return Vec::new(),
    };
    let vars = match ctx.single_dictionary_block("vars") {
        Some(block) => block,
        None => return Vec::new(),
    };
    let entries = match &secrets.content {
        BlockContent::Array(entries) => entries,
        _ => return Vec::new(),
    };

    entries
        .iter()
        .filter_map(|entry| {
            let field = vars.field(&entry.content)?;
            let mut diagnostic = Diagnostic::error(
                entry.range,
                DiagnosticCode::Environment(EnvironmentCode::SecretShadowed),
                format!(
                    "Secret '{}' shadows a variable of the same name",
                    entry.content
                ),
            );
            if let Some(key_range) = field.key_range() {
                diagnostic = diagnostic.with_related(vec![RelatedInformation::new(
                    key_range,
                    format!("Variable '{}' defined here", entry.content),
                )]);
            }
            Some(diagnostic)
        })
        .collect()
}
