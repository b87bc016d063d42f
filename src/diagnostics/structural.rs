//! The structural tier: checks that run unconditionally for every file
//! kind, before any block-specific rule.

use crate::blocks::{
    allowed_names, shape_of, Block, BlockContent, BlockShape, ParseResult,
};
use crate::diagnostics::{
    CheckContext, Diagnostic, DiagnosticCode, GlobalCode, RelatedInformation,
};
use crate::document::{Position, Range};
use crate::FileKind;

fn code(code: GlobalCode) -> DiagnosticCode {
    DiagnosticCode::Global(code)
}

/// Builds the shared multiple-blocks diagnostic: primary range is the last
/// block's name range, every earlier one becomes related information.
fn multiple_blocks_diagnostic(
    blocks: &[&Block],
    family: &str,
    diagnostic_code: GlobalCode,
) -> Option<Diagnostic> {
    let (last, earlier) = blocks.split_last()?;
    if earlier.is_empty() {
        return None;
    }
    let related = earlier
        .iter()
        .map(|block| {
            RelatedInformation::new(
                block.name_range,
                format!("Other {} block with name '{}'", family, block.name),
            )
        })
        .collect();
    Some(
        Diagnostic::error(
            last.name_range,
            code(diagnostic_code),
            format!(
                "Multiple {} blocks found; at most one is allowed",
                family
            ),
        )
        .with_related(related),
    )
}

/// No block name may be used more than once, and the method, auth and body
/// families each allow at most one member.
pub fn check_block_cardinality(ctx: &CheckContext) -> Vec<Diagnostic> {
    let result = ctx.parse_result;
    let mut diagnostics = Vec::new();

    // Same-name duplicates, in document order of the duplicated name.
    let mut seen: Vec<&str> = Vec::new();
    for block in &result.blocks {
        if seen.contains(&block.name.as_str()) {
            continue;
        }
        seen.push(&block.name);
        let instances: Vec<&Block> = result.blocks_named(&block.name).collect();
        if instances.len() > 1 {
            if let Some((last, earlier)) = instances.split_last() {
                let related = earlier
                    .iter()
                    .map(|b| {
                        RelatedInformation::new(
                            b.name_range,
                            format!("Other block with name '{}'", b.name),
                        )
                    })
                    .collect();
                diagnostics.push(
                    Diagnostic::error(
                        last.name_range,
                        code(GlobalCode::DuplicateBlockName),
                        format!("Block '{}' is defined more than once", block.name),
                    )
                    .with_related(related),
                );
            }
        }
    }

    let methods: Vec<&Block> = result.method_blocks().collect();
    diagnostics.extend(multiple_blocks_diagnostic(
        &methods,
        "method",
        GlobalCode::MultipleMethodBlocks,
    ));

    let auths: Vec<&Block> = result.auth_blocks().collect();
    diagnostics.extend(multiple_blocks_diagnostic(
        &auths,
        "auth",
        GlobalCode::MultipleAuthBlocks,
    ));

    let bodies: Vec<&Block> = result.body_blocks().collect();
    diagnostics.extend(multiple_blocks_diagnostic(
        &bodies,
        "body",
        GlobalCode::MultipleBodyBlocks,
    ));

    diagnostics
}

/// No non-blank text may appear outside a block.
pub fn check_stray_text(ctx: &CheckContext) -> Vec<Diagnostic> {
    ctx.parse_result
        .text_outside_of_blocks
        .iter()
        .filter(|run| !run.is_blank())
        .map(|run| {
            Diagnostic::error(
                run.range,
                code(GlobalCode::StrayText),
                "Text outside of a block is not allowed",
            )
        })
        .collect()
}

/// Blocks must be separated by exactly one blank line.
pub fn check_block_separation(ctx: &CheckContext) -> Vec<Diagnostic> {
    let blocks = &ctx.parse_result.blocks;
    let mut diagnostics = Vec::new();
    for pair in blocks.windows(2) {
        let previous_end = pair[0].content_range.end.line;
        let next_start = pair[1].name_range.start.line;
        let blank_lines = next_start.saturating_sub(previous_end + 1);
        if blank_lines != 1 {
            diagnostics.push(Diagnostic::warning(
                pair[1].name_range,
                code(GlobalCode::BlockSeparation),
                "Blocks must be separated by exactly one blank line",
            ));
        }
    }
    diagnostics
}

fn expected_content_matches(shape: BlockShape, content: &BlockContent) -> bool {
    matches!(
        (shape, content),
        (BlockShape::Dictionary, BlockContent::Dictionary(_))
            | (BlockShape::Array, BlockContent::Array(_))
            | (BlockShape::Code, BlockContent::Code { .. })
            | (BlockShape::Json, BlockContent::Code { .. })
            | (BlockShape::Text, BlockContent::Text(_))
    )
}

/// Every block must parse with the shape its name classifies it as.
pub fn check_dictionary_shapes(ctx: &CheckContext) -> Vec<Diagnostic> {
    ctx.parse_result
        .blocks
        .iter()
        .filter_map(|block| {
            let shape = shape_of(&block.name)?;
            if expected_content_matches(shape, &block.content) {
                return None;
            }
            Some(Diagnostic::error(
                block.name_range,
                code(GlobalCode::MalformedBlock),
                format!("Block '{}' is not structured correctly", block.name),
            ))
        })
        .collect()
}

/// Content lines of dictionary blocks must match a dictionary-line pattern.
pub fn check_malformed_dictionary_lines(ctx: &CheckContext) -> Vec<Diagnostic> {
    ctx.parse_result
        .blocks
        .iter()
        .filter(|block| matches!(block.content, BlockContent::Dictionary(_)))
        .flat_map(|block| {
            crate::diagnostics::dictionary::check_malformed_lines(
                block,
                code(GlobalCode::MalformedLine),
            )
        })
        .collect()
}

/// Dictionary blocks must not be empty.
pub fn check_empty_dictionary_blocks(ctx: &CheckContext) -> Vec<Diagnostic> {
    ctx.parse_result
        .blocks
        .iter()
        .filter(|block| !block.disabled)
        .filter_map(|block| {
            if shape_of(&block.name)? != BlockShape::Dictionary {
                return None;
            }
            match &block.content {
                BlockContent::Dictionary(fields) if fields.is_empty() => {
                    Some(Diagnostic::error(
                        block.name_range,
                        code(GlobalCode::EmptyDictionaryBlock),
                        format!("Block '{}' is empty", block.name),
                    ))
                }
                _ => None,
            }
        })
        .collect()
}

/// Only file-kind-appropriate block names may appear.
///
/// All offenders are reported in one diagnostic: names sorted and
/// de-duplicated in the message, range spanning the first offender through
/// the last by position.
pub fn check_allowed_block_names(ctx: &CheckContext) -> Vec<Diagnostic> {
    let allowed = allowed_names(ctx.file_kind);
    let offenders: Vec<&Block> = ctx
        .parse_result
        .blocks
        .iter()
        .filter(|block| !allowed.contains(&block.name.as_str()))
        .collect();
    let (first, rest) = match offenders.split_first() {
        Some(split) => split,
        None => return Vec::new(),
    };

    let range = rest
        .iter()
        .fold(first.name_range, |acc, block| acc.covering(&block.name_range));
    let mut names: Vec<&str> = offenders.iter().map(|block| block.name.as_str()).collect();
    names.sort_unstable();
    names.dedup();

    vec![Diagnostic::error(
        range,
        code(GlobalCode::InvalidBlockNames),
        format!(
            "{} not allowed in {}: {}",
            if names.len() == 1 {
                "Block name"
            } else {
                "Block names"
            },
            file_kind_label(ctx.file_kind),
            names.join(", ")
        ),
    )]
}

fn file_kind_label(kind: FileKind) -> &'static str {
    match kind {
        FileKind::Request => "a request file",
        FileKind::FolderSettings => "a folder settings file",
        FileKind::CollectionSettings => "a collection settings file",
        FileKind::Environment => "an environment file",
    }
}

/// Every block must close its bracket before end of document.
pub fn check_unclosed_blocks(ctx: &CheckContext) -> Vec<Diagnostic> {
    ctx.parse_result
        .blocks
        .iter()
        .filter(|block| !block.closed)
        .map(|block| {
            Diagnostic::error(
                block.name_range,
                code(GlobalCode::UnclosedBlock),
                format!("Block '{}' is never closed", block.name),
            )
        })
        .collect()
}

/// Request files must carry exactly one `meta` block and one method block.
///
/// The more-than-one side is covered by the cardinality check; this one
/// reports absence, anchored at the start of the document.
pub fn check_request_singletons(ctx: &CheckContext) -> Vec<Diagnostic> {
    if ctx.file_kind != FileKind::Request {
        return Vec::new();
    }
    let anchor = Range::at(Position::new(0, 0));
    let mut diagnostics = Vec::new();
    if !has_block(ctx.parse_result, "meta") {
        diagnostics.push(Diagnostic::error(
            anchor,
            code(GlobalCode::MissingMetaBlock),
            "Request file is missing its 'meta' block",
        ));
    }
    if ctx.parse_result.method_blocks().next().is_none() {
        diagnostics.push(Diagnostic::error(
            anchor,
            code(GlobalCode::MissingMethodBlock),
            "Request file is missing a method block (get, post, …)",
        ));
    }
    diagnostics
}

fn has_block(result: &ParseResult, name: &str) -> bool {
    result.blocks_named(name).next().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelFlag;
    use crate::diagnostics::run_checks;
    use crate::document::Document;
    use crate::parser;

    fn diagnose(text: &str, kind: FileKind) -> Vec<Diagnostic> {
        let document = Document::new(text);
        let parsed = parser::parse(&document);
        let ctx = CheckContext::new(&document, &parsed, kind);
        run_checks(&ctx, &CancelFlag::new())
    }

    fn codes(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.code.as_str()).collect()
    }

    #[test]
    fn test_duplicate_block_name() {
        let text = "meta {\n  name: a\n  seq: 1\n}\n\nget {\n  url: https://x\n}\n\nheaders {\n  a: 1\n}\n\nheaders {\n  b: 2\n}\n";
        let diagnostics = diagnose(text, FileKind::Request);
        let duplicate: Vec<&Diagnostic> = diagnostics
            .iter()
            .filter(|d| d.code == DiagnosticCode::Global(GlobalCode::DuplicateBlockName))
            .collect();
        assert_eq!(duplicate.len(), 1);
        // Primary range points at the last headers block.
        assert_eq!(duplicate[0].range.start.line, 13);
        assert_eq!(duplicate[0].related_information.len(), 1);
        assert_eq!(duplicate[0].related_information[0].range.start.line, 9);
    }

    #[test]
    fn test_multiple_method_blocks() {
        let text = "meta {\n  name: a\n  seq: 1\n}\n\nget {\n  url: https://x\n}\n\npost {\n  url: https://x\n}\n";
        let diagnostics = diagnose(text, FileKind::Request);
        let multi: Vec<&Diagnostic> = diagnostics
            .iter()
            .filter(|d| d.code == DiagnosticCode::Global(GlobalCode::MultipleMethodBlocks))
            .collect();
        assert_eq!(multi.len(), 1);
        assert_eq!(multi[0].range.start.line, 9);
        assert_eq!(
            multi[0].related_information[0].message,
            "Other method block with name 'get'"
        );
    }

    #[test]
    fn test_stray_text_and_separation() {
        let text = "junk\nmeta {\n  name: a\n  seq: 1\n}\nget {\n  url: https://x\n}\n";
        let diagnostics = diagnose(text, FileKind::Request);
        let all = codes(&diagnostics);
        assert!(all.contains(&"global.strayText"));
        assert!(all.contains(&"global.blockSeparation"));
        let separation = diagnostics
            .iter()
            .find(|d| d.code == DiagnosticCode::Global(GlobalCode::BlockSeparation))
            .unwrap();
        assert_eq!(separation.severity, crate::diagnostics::DiagnosticSeverity::Warning);
    }

    #[test]
    fn test_two_blank_lines_between_blocks() {
        let text = "meta {\n  name: a\n  seq: 1\n}\n\n\nget {\n  url: https://x\n}\n";
        let diagnostics = diagnose(text, FileKind::Request);
        assert!(codes(&diagnostics).contains(&"global.blockSeparation"));
    }

    #[test]
    fn test_malformed_block_shape() {
        // headers is dictionary-shaped; an opening `[` parses it as an array.
        let text = "meta {\n  name: a\n  seq: 1\n}\n\nget {\n  url: https://x\n}\n\nheaders [\n  a\n]\n";
        let diagnostics = diagnose(text, FileKind::Request);
        let malformed = diagnostics
            .iter()
            .find(|d| d.code == DiagnosticCode::Global(GlobalCode::MalformedBlock))
            .unwrap();
        assert!(malformed.message.contains("headers"));
    }

    #[test]
    fn test_empty_dictionary_block() {
        let text = "meta {\n  name: a\n  seq: 1\n}\n\nget {\n  url: https://x\n}\n\nheaders {\n}\n";
        let diagnostics = diagnose(text, FileKind::Request);
        assert!(codes(&diagnostics).contains(&"global.emptyDictionaryBlock"));
    }

    #[test]
    fn test_invalid_block_names_single_diagnostic() {
        let text = "meta {\n  name: a\n  seq: 1\n}\n\nget {\n  url: https://x\n}\n\nzebra {\n  a: 1\n}\n\nalpha {\n  b: 2\n}\n";
        let diagnostics = diagnose(text, FileKind::Request);
        let invalid: Vec<&Diagnostic> = diagnostics
            .iter()
            .filter(|d| d.code == DiagnosticCode::Global(GlobalCode::InvalidBlockNames))
            .collect();
        assert_eq!(invalid.len(), 1);
        // Sorted names, range from first offender to last.
        assert!(invalid[0].message.contains("alpha, zebra"));
        assert_eq!(invalid[0].range.start.line, 9);
        assert_eq!(invalid[0].range.end.line, 13);
    }

    #[test]
    fn test_environment_kind_rejects_request_blocks() {
        let text = "vars {\n  host: https://x\n}\n\nget {\n  url: https://x\n}\n";
        let diagnostics = diagnose(text, FileKind::Environment);
        let invalid = diagnostics
            .iter()
            .find(|d| d.code == DiagnosticCode::Global(GlobalCode::InvalidBlockNames))
            .unwrap();
        assert!(invalid.message.contains("get"));
        assert!(invalid.message.contains("environment file"));
    }

    #[test]
    fn test_unclosed_block() {
        let text = "meta {\n  name: a\n  seq: 1\n}\n\nget {\n  url: https://x\n";
        let diagnostics = diagnose(text, FileKind::Request);
        let unclosed = diagnostics
            .iter()
            .find(|d| d.code == DiagnosticCode::Global(GlobalCode::UnclosedBlock))
            .unwrap();
        assert!(unclosed.message.contains("get"));
    }

    #[test]
    fn test_missing_meta_and_method() {
        let diagnostics = diagnose("headers {\n  a: 1\n}\n", FileKind::Request);
        let all = codes(&diagnostics);
        assert!(all.contains(&"global.missingMetaBlock"));
        assert!(all.contains(&"global.missingMethodBlock"));
    }
}
