//! Checks for the `meta` block: required and allowed keys, sequence
//! validity, and tag duplication.

use crate::blocks::{ArrayEntry, Block, DictionaryField};
use crate::diagnostics::{
    dictionary, CheckContext, Diagnostic, DiagnosticCode, MetaCode, RelatedInformation,
};
use crate::document::Range;

const REQUIRED_KEYS: &[&str] = &["name", "seq"];
const ALLOWED_KEYS: &[&str] = &["name", "type", "seq", "tags"];

pub fn check_meta_block(ctx: &CheckContext) -> Vec<Diagnostic> {
    let block = match ctx.single_dictionary_block("meta") {
        Some(block) => block,
        None => return Vec::new(),
    };

    let mut diagnostics = Vec::new();
    diagnostics.extend(dictionary::check_missing_keys(
        block,
        REQUIRED_KEYS,
        DiagnosticCode::Meta(MetaCode::MissingKeys),
    ));
    diagnostics.extend(dictionary::check_unknown_keys(
        block,
        ALLOWED_KEYS,
        DiagnosticCode::Meta(MetaCode::UnknownKeys),
    ));
    diagnostics.extend(dictionary::check_duplicate_keys(
        block,
        DiagnosticCode::Meta(MetaCode::DuplicateKeys),
    ));
    diagnostics.extend(check_seq_validity(block));
    diagnostics.extend(check_duplicate_tags(block));
    diagnostics
}

/// Returns the value range of the first enabled simple field with the given
/// key, along with its value text.
fn simple_field_value(block: &Block, key: &str) -> Option<(Option<String>, Range)> {
    match block.field(key)? {
        DictionaryField::Simple {
            value,
            value_range,
            key_range,
            ..
        } => Some((value.clone(), value_range.unwrap_or(*key_range))),
        _ => None,
    }
}

/// A `seq` value must be a base-10 integer and at least 1.
fn check_seq_validity(block: &Block) -> Vec<Diagnostic> {
    let (value, range) = match simple_field_value(block, "seq") {
        Some(field) => field,
        None => return Vec::new(),
    };
    let valid = value
        .as_deref()
        .filter(|v| !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|v| v.parse::<u64>().ok())
        .is_some_and(|n| n >= 1);
    if valid {
        return Vec::new();
    }
    vec![Diagnostic::error(
        range,
        DiagnosticCode::Meta(MetaCode::InvalidSeq),
        format!(
            "Value '{}' of key 'seq' must be an integer of at least 1",
            value.unwrap_or_default()
        ),
    )]
}

/// Reports duplicated entries of an array-valued field in one diagnostic.
///
/// The primary range is computed over each duplicated value's latest
/// occurrence: of those, the latest by position wins. Every non-latest
/// occurrence of every duplicated value becomes related information.
pub(super) fn duplicate_entries_diagnostic(
    entries: &[ArrayEntry],
    noun: &str,
    code: DiagnosticCode,
) -> Option<Diagnostic> {
    let mut occurrences: Vec<(&str, Vec<Range>)> = Vec::new();
    for entry in entries {
        match occurrences.iter_mut().find(|(v, _)| *v == entry.content) {
            Some((_, ranges)) => ranges.push(entry.range),
            None => occurrences.push((&entry.content, vec![entry.range])),
        }
    }
    occurrences.retain(|(_, ranges)| ranges.len() > 1);
    if occurrences.is_empty() {
        return None;
    }

    let primary = occurrences
        .iter()
        .filter_map(|(_, ranges)| ranges.last().copied())
        .max_by_key(|range| range.start)?;

    let mut related = Vec::new();
    for (value, ranges) in &occurrences {
        for range in &ranges[..ranges.len() - 1] {
            related.push(RelatedInformation::new(
                *range,
                format!("Previous occurrence of {} '{}'", noun, value),
            ));
        }
    }

    let mut values: Vec<&str> = occurrences.iter().map(|(v, _)| *v).collect();
    values.sort_unstable();
    values.dedup();

    Some(
        Diagnostic::error(
            primary,
            code,
            format!(
                "Duplicate {}{}: {}",
                noun,
                if values.len() == 1 { "" } else { "s" },
                values.join(", ")
            ),
        )
        .with_related(related),
    )
}

fn check_duplicate_tags(block: &Block) -> Vec<Diagnostic> {
    let values = match block.field("tags") {
        Some(DictionaryField::ArrayValue { values, .. }) => values,
        _ => return Vec::new(),
    };
    duplicate_entries_diagnostic(values, "tag", DiagnosticCode::Meta(MetaCode::DuplicateTags))
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::parser;
    use crate::FileKind;

    fn diagnose(text: &str) -> Vec<Diagnostic> {
        let document = Document::new(text);
        let parsed = parser::parse(&document);
        let ctx = CheckContext::new(&document, &parsed, FileKind::Request);
        check_meta_block(&ctx)
    }

    #[test]
    fn test_valid_meta_block() {
        assert!(diagnose("meta {\n  name: Get user\n  seq: 1\n}\n").is_empty());
    }

    #[test]
    fn test_missing_name_and_seq() {
        let diagnostics = diagnose("meta {\n  type: http\n}\n");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code.as_str(), "meta.missingKeys");
        assert!(diagnostics[0].message.contains("name, seq"));
    }

    #[test]
    fn test_seq_zero_invalid() {
        let diagnostics = diagnose("meta {\n  name: a\n  seq: 0\n}\n");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code.as_str(), "meta.invalidSeq");
        // Anchored at the value range.
        assert_eq!(diagnostics[0].range, Range::at_line(2, 7, 8));
    }

    #[test]
    fn test_seq_non_numeric_invalid() {
        for value in ["abc", "1.5", "-2", "+3", "1e3"] {
            let text = format!("meta {{\n  name: a\n  seq: {}\n}}\n", value);
            let diagnostics = diagnose(&text);
            assert_eq!(diagnostics.len(), 1, "seq: {}", value);
            assert_eq!(diagnostics[0].code.as_str(), "meta.invalidSeq");
        }
    }

    #[test]
    fn test_seq_without_value() {
        let diagnostics = diagnose("meta {\n  name: a\n  seq:\n}\n");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code.as_str(), "meta.invalidSeq");
    }

    #[test]
    fn test_duplicate_tags_tie_break() {
        // Duplicated values: a (lines 4, 6) and b (lines 5, 7). The primary
        // range is the latest of the per-value latest occurrences: b at
        // line 7.
        let text = "meta {\n  name: x\n  seq: 1\n  tags: [\n    a,\n    b,\n    a,\n    b\n  ]\n}\n";
        let diagnostics = diagnose(text);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code.as_str(), "meta.duplicateTags");
        assert_eq!(diagnostics[0].range.start.line, 7);
        // Earlier occurrences of both values: a at 4, b at 5.
        assert_eq!(diagnostics[0].related_information.len(), 2);
        assert_eq!(diagnostics[0].related_information[0].range.start.line, 4);
        assert_eq!(diagnostics[0].related_information[1].range.start.line, 5);
        assert!(diagnostics[0].message.contains("a, b"));
    }

    #[test]
    fn test_unique_tags_are_fine() {
        let text = "meta {\n  name: x\n  seq: 1\n  tags: [\n    smoke,\n    regression\n  ]\n}\n";
        assert!(diagnose(text).is_empty());
    }

    #[test]
    fn test_gate_skips_duplicated_meta_block() {
        let text = "meta {\n  seq: 0\n}\n\nmeta {\n  seq: 0\n}\n";
        // Structural checks report the duplication; this check stays quiet.
        assert!(diagnose(text).is_empty());
    }
}
