//! Shared key checks for dictionary blocks.
//!
//! Every dictionary block goes through the same three key checks; the
//! per-block modules supply their required/allowed key tables and the
//! scope-specific codes.

use crate::blocks::{Block, DictionaryField};
use crate::diagnostics::{Diagnostic, DiagnosticCode, RelatedInformation};
use crate::document::Range;
use std::collections::BTreeMap;

/// Reports every missing required key in one diagnostic.
///
/// Disabled (`~`-prefixed) fields do not satisfy a requirement. The
/// diagnostic is anchored at the block's name range.
pub fn check_missing_keys(
    block: &Block,
    required: &[&str],
    code: DiagnosticCode,
) -> Vec<Diagnostic> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|key| block.field(key).is_none())
        .collect();
    if missing.is_empty() {
        return Vec::new();
    }
    vec![Diagnostic::error(
        block.name_range,
        code,
        format!(
            "Block '{}' is missing required {}: {}",
            block.name,
            if missing.len() == 1 { "key" } else { "keys" },
            missing.join(", ")
        ),
    )]
}

/// Reports every unknown key in one diagnostic, echoing the allowed set.
///
/// Offenders are listed sorted and de-duplicated; the range spans the first
/// offending key through the last by position.
pub fn check_unknown_keys(
    block: &Block,
    allowed: &[&str],
    code: DiagnosticCode,
) -> Vec<Diagnostic> {
    let fields = match block.dictionary() {
        Some(fields) => fields,
        None => return Vec::new(),
    };

    let mut offenders: Vec<(&str, Range)> = Vec::new();
    for field in fields {
        if let (Some(key), Some(range)) = (field.key(), field.key_range()) {
            if !allowed.contains(&key) {
                offenders.push((key, range));
            }
        }
    }
    if offenders.is_empty() {
        return Vec::new();
    }

    let range = offenders
        .iter()
        .skip(1)
        .fold(offenders[0].1, |acc, (_, r)| acc.covering(r));
    let mut names: Vec<&str> = offenders.iter().map(|(key, _)| *key).collect();
    names.sort_unstable();
    names.dedup();

    vec![Diagnostic::error(
        range,
        code,
        format!(
            "Unknown {} in block '{}': {}. Allowed keys are: {}",
            if names.len() == 1 { "key" } else { "keys" },
            block.name,
            names.join(", "),
            allowed.join(", ")
        ),
    )]
}

/// Reports duplicated keys, one diagnostic per duplicated key.
///
/// The primary range is the last occurrence's key range; every earlier
/// occurrence becomes a related-information entry. Disabled fields still
/// count as occurrences since they would conflict once re-enabled.
pub fn check_duplicate_keys(block: &Block, code: DiagnosticCode) -> Vec<Diagnostic> {
    let fields = match block.dictionary() {
        Some(fields) => fields,
        None => return Vec::new(),
    };

    let mut occurrences: BTreeMap<&str, Vec<Range>> = BTreeMap::new();
    for field in fields {
        if let (Some(key), Some(range)) = (field.key(), field.key_range()) {
            occurrences.entry(key).or_default().push(range);
        }
    }

    let mut diagnostics: Vec<(Range, Diagnostic)> = occurrences
        .into_iter()
        .filter(|(_, ranges)| ranges.len() > 1)
        .filter_map(|(key, ranges)| {
            let (&last, earlier) = ranges.split_last()?;
            let related = earlier
                .iter()
                .map(|range| {
                    RelatedInformation::new(
                        *range,
                        format!("Previous definition for key '{}'", key),
                    )
                })
                .collect();
            let diagnostic = Diagnostic::error(
                last,
                code,
                format!("Duplicate key '{}' in block '{}'", key, block.name),
            )
            .with_related(related);
            Some((last, diagnostic))
        })
        .collect();
    diagnostics.sort_by_key(|(range, _)| range.start);
    diagnostics.into_iter().map(|(_, d)| d).collect()
}

/// Reports content lines that match neither dictionary-line pattern.
pub fn check_malformed_lines(block: &Block, code: DiagnosticCode) -> Vec<Diagnostic> {
    let fields = match block.dictionary() {
        Some(fields) => fields,
        None => return Vec::new(),
    };
    fields
        .iter()
        .filter_map(|field| match field {
            DictionaryField::Malformed { text, range } => Some(Diagnostic::error(
                *range,
                code,
                format!(
                    "Line '{}' in block '{}' is not a 'key: value' pair",
                    text.trim(),
                    block.name
                ),
            )),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MetaCode;
    use crate::document::Document;
    use crate::parser;

    fn parse_single(text: &str) -> (Document, crate::blocks::ParseResult) {
        let document = Document::new(text);
        let parsed = parser::parse(&document);
        (document, parsed)
    }

    #[test]
    fn test_missing_keys_reported_together() {
        let (_, parsed) = parse_single("meta {\n  type: http\n}\n");
        let block = parsed.single_block("meta").unwrap();
        let diagnostics = check_missing_keys(
            block,
            &["name", "seq"],
            DiagnosticCode::Meta(MetaCode::MissingKeys),
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("name, seq"));
        assert_eq!(diagnostics[0].range, block.name_range);
    }

    #[test]
    fn test_disabled_field_does_not_satisfy_requirement() {
        let (_, parsed) = parse_single("meta {\n  ~name: a\n  seq: 1\n}\n");
        let block = parsed.single_block("meta").unwrap();
        let diagnostics = check_missing_keys(
            block,
            &["name", "seq"],
            DiagnosticCode::Meta(MetaCode::MissingKeys),
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("name"));
        assert!(!diagnostics[0].message.contains("seq"));
    }

    #[test]
    fn test_unknown_keys_sorted_and_deduplicated() {
        let text = "meta {\n  zz: 1\n  aa: 2\n  zz: 3\n  name: x\n  seq: 1\n}\n";
        let (_, parsed) = parse_single(text);
        let block = parsed.single_block("meta").unwrap();
        let diagnostics = check_unknown_keys(
            block,
            &["name", "type", "seq", "tags"],
            DiagnosticCode::Meta(MetaCode::UnknownKeys),
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("aa, zz"));
        assert!(diagnostics[0]
            .message
            .contains("Allowed keys are: name, type, seq, tags"));
        // Range spans the first offender through the last.
        assert_eq!(diagnostics[0].range.start.line, 1);
        assert_eq!(diagnostics[0].range.end.line, 3);
    }

    #[test]
    fn test_duplicate_key_grouping() {
        // Keys [a, a, b, a]: one diagnostic for a at the third occurrence
        // with two related entries, nothing for b.
        let text = "meta {\n  a: 1\n  a: 2\n  b: 3\n  a: 4\n}\n";
        let (_, parsed) = parse_single(text);
        let block = parsed.single_block("meta").unwrap();
        let diagnostics =
            check_duplicate_keys(block, DiagnosticCode::Meta(MetaCode::DuplicateKeys));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].range.start.line, 4);
        assert_eq!(diagnostics[0].related_information.len(), 2);
        assert_eq!(
            diagnostics[0].related_information[0].message,
            "Previous definition for key 'a'"
        );
        assert_eq!(diagnostics[0].related_information[0].range.start.line, 1);
        assert_eq!(diagnostics[0].related_information[1].range.start.line, 2);
    }

    #[test]
    fn test_no_duplicates_no_diagnostics() {
        let (_, parsed) = parse_single("meta {\n  name: x\n  seq: 1\n}\n");
        let block = parsed.single_block("meta").unwrap();
        assert!(
            check_duplicate_keys(block, DiagnosticCode::Meta(MetaCode::DuplicateKeys)).is_empty()
        );
    }
}
