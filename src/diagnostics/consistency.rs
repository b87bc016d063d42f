//! Three-way consistency between a declaring field and a typed block.
//!
//! Used by the method block (`auth` field vs `auth:*` block, `body` field
//! vs `body:*` block) and by the folder/collection auth-mode block. Each
//! caller supplies its own sentinels, known types and diagnostic code; all
//! three outcomes of one check share that code.

use crate::diagnostics::{Diagnostic, DiagnosticCode, RelatedInformation};
use crate::document::Range;

/// The declaring field's value and the range diagnostics anchor at.
#[derive(Debug, Clone, Copy)]
pub struct DeclaredType<'a> {
    pub value: &'a str,
    pub range: Range,
}

/// The typed block actually present, if any.
#[derive(Debug, Clone, Copy)]
pub struct PresentBlock<'a> {
    pub name: &'a str,
    pub name_range: Range,
}

pub struct ConsistencyCheck<'a> {
    /// Capitalized family label for messages, e.g. "Auth"
    pub family: &'a str,
    /// Prefix the expected block name is built from, e.g. "auth"
    pub block_prefix: &'a str,
    /// Field values meaning "no typed block expected"
    pub sentinels: &'a [&'a str],
    /// Every valid non-sentinel type
    pub known_types: &'a [&'a str],
    pub code: DiagnosticCode,
}

impl ConsistencyCheck<'_> {
    /// Runs the check. `fallback_anchor` is used for the unexpected-block
    /// outcome when no declaring field exists at all.
    pub fn run(
        &self,
        declared: Option<DeclaredType>,
        block: Option<PresentBlock>,
        fallback_anchor: Range,
    ) -> Vec<Diagnostic> {
        if let Some(d) = declared {
            if !self.sentinels.contains(&d.value) && !self.known_types.contains(&d.value) {
                return vec![Diagnostic::error(
                    d.range,
                    self.code,
                    format!(
                        "Unknown {} type '{}'. Valid types are: {}",
                        self.family.to_lowercase(),
                        d.value,
                        self.known_types.join(", ")
                    ),
                )];
            }
        }

        let effective = declared.filter(|d| !self.sentinels.contains(&d.value));
        match (effective, block) {
            (None, None) => Vec::new(),
            (Some(d), None) => vec![Diagnostic::error(
                d.range,
                self.code,
                format!(
                    "{} type '{}' is declared but block '{}:{}' is missing",
                    self.family, d.value, self.block_prefix, d.value
                ),
            )],
            (None, Some(b)) => {
                let anchor = declared.map(|d| d.range).unwrap_or(fallback_anchor);
                vec![Diagnostic::error(
                    anchor,
                    self.code,
                    format!(
                        "Block '{}' is present but no matching {} type is declared",
                        b.name,
                        self.family.to_lowercase()
                    ),
                )
                .with_related(vec![RelatedInformation::new(
                    b.name_range,
                    format!("Block '{}' defined here", b.name),
                )])]
            }
            (Some(d), Some(b)) => {
                let expected = format!("{}:{}", self.block_prefix, d.value);
                if b.name == expected {
                    return Vec::new();
                }
                vec![Diagnostic::error(
                    d.range,
                    self.code,
                    format!(
                        "Declared {} type '{}' does not match block '{}'",
                        self.family.to_lowercase(),
                        d.value,
                        b.name
                    ),
                )
                .with_related(vec![RelatedInformation::new(
                    b.name_range,
                    format!("Block '{}' defined here", b.name),
                )])]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MethodCode;
    use crate::document::Range;

    fn check() -> ConsistencyCheck<'static> {
        ConsistencyCheck {
            family: "Auth",
            block_prefix: "auth",
            sentinels: &["none", "inherit"],
            known_types: &["basic", "bearer"],
            code: DiagnosticCode::Method(MethodCode::AuthBlock),
        }
    }

    fn declared(value: &str) -> Option<DeclaredType> {
        Some(DeclaredType {
            value,
            range: Range::at_line(1, 8, 8 + value.len()),
        })
    }

    fn block(name: &'static str) -> Option<PresentBlock<'static>> {
        Some(PresentBlock {
            name,
            name_range: Range::at_line(5, 0, name.len()),
        })
    }

    #[test]
    fn test_matching_pair_is_clean() {
        assert!(check()
            .run(declared("basic"), block("auth:basic"), Range::at_line(0, 0, 3))
            .is_empty());
    }

    #[test]
    fn test_missing_block() {
        let diagnostics = check().run(declared("basic"), None, Range::at_line(0, 0, 3));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("'auth:basic' is missing"));
    }

    #[test]
    fn test_mismatch_is_not_missing() {
        let diagnostics =
            check().run(declared("basic"), block("auth:bearer"), Range::at_line(0, 0, 3));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("does not match"));
        assert_eq!(diagnostics[0].related_information.len(), 1);
    }

    #[test]
    fn test_sentinel_with_block_present() {
        let diagnostics =
            check().run(declared("none"), block("auth:basic"), Range::at_line(0, 0, 3));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("no matching auth type"));
        // Anchored at the sentinel field, not the block.
        assert_eq!(diagnostics[0].range.start.line, 1);
    }

    #[test]
    fn test_unknown_type() {
        let diagnostics = check().run(declared("kerberos"), None, Range::at_line(0, 0, 3));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("Unknown auth type 'kerberos'"));
    }

    #[test]
    fn test_nothing_declared_nothing_present() {
        assert!(check().run(None, None, Range::at_line(0, 0, 3)).is_empty());
    }
}
