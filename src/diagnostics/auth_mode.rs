//! Checks for the folder/collection `auth` mode-selector block.

use crate::blocks::DictionaryField;
use crate::diagnostics::consistency::{ConsistencyCheck, DeclaredType, PresentBlock};
use crate::diagnostics::{
    dictionary, AuthModeCode, CheckContext, Diagnostic, DiagnosticCode,
};

const ALLOWED_KEYS: &[&str] = &["mode"];

const MODES: &[&str] = &[
    "awsv4", "basic", "bearer", "digest", "ntlm", "oauth2", "wsse", "apikey",
];
const SENTINELS: &[&str] = &["none", "inherit"];

pub fn check_auth_mode_block(ctx: &CheckContext) -> Vec<Diagnostic> {
    let block = match ctx.single_dictionary_block("auth") {
        Some(block) => block,
        None => return Vec::new(),
    };

    let mut diagnostics = Vec::new();
    diagnostics.extend(dictionary::check_missing_keys(
        block,
        ALLOWED_KEYS,
        DiagnosticCode::AuthMode(AuthModeCode::MissingMode),
    ));
    diagnostics.extend(dictionary::check_unknown_keys(
        block,
        ALLOWED_KEYS,
        DiagnosticCode::AuthMode(AuthModeCode::UnknownKeys),
    ));
    diagnostics.extend(dictionary::check_duplicate_keys(
        block,
        DiagnosticCode::AuthMode(AuthModeCode::DuplicateKeys),
    ));

    let declared = match block.field("mode") {
        Some(DictionaryField::Simple {
            value: Some(value),
            value_range: Some(range),
            ..
        }) => {
            if !SENTINELS.contains(&value.as_str()) && !MODES.contains(&value.as_str()) {
                diagnostics.push(Diagnostic::error(
                    *range,
                    DiagnosticCode::AuthMode(AuthModeCode::InvalidMode),
                    format!(
                        "Unknown auth mode '{}'. Valid modes are: none, inherit, {}",
                        value,
                        MODES.join(", ")
                    ),
                ));
                return diagnostics;
            }
            Some(DeclaredType {
                value,
                range: *range,
            })
        }
        _ => None,
    };

    let mut auth_blocks = ctx.parse_result.auth_blocks();
    let typed = auth_blocks.next().map(|b| PresentBlock {
        name: &b.name,
        name_range: b.name_range,
    });
    if auth_blocks.next().is_some() {
        // Multiples are the cardinality check's concern.
        return diagnostics;
    }

    let check = ConsistencyCheck {
        family: "Auth",
        block_prefix: "auth",
        sentinels: SENTINELS,
        known_types: MODES,
        code: DiagnosticCode::AuthMode(AuthModeCode::AuthBlock),
    };
    diagnostics.extend(check.run(declared, typed, block.name_range));
    diagnostics
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
        let ctx = CheckContext::new(&document, &parsed, FileKind::FolderSettings);
        check_auth_mode_block(&ctx)
    }

    #[test]
    fn test_inherit_mode_alone_is_clean() {
        assert!(diagnose("auth {\n  mode: inherit\n}\n").is_empty());
    }

    #[test]
    fn test_mode_matching_block_is_clean() {
        let text = "auth {\n  mode: bearer\n}\n\nauth:bearer {\n  token: abc\n}\n";
        assert!(diagnose(text).is_empty());
    }

    #[test]
    fn test_missing_mode_key() {
        let diagnostics = diagnose("auth {\n  kind: basic\n}\n");
        let codes: Vec<&str> = diagnostics.iter().map(|d| d.code.as_str()).collect();
        assert!(codes.contains(&"authMode.missingMode"));
        assert!(codes.contains(&"authMode.unknownKeys"));
    }

    #[test]
    fn test_invalid_mode() {
        let diagnostics = diagnose("auth {\n  mode: kerberos\n}\n");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code.as_str(), "authMode.invalidMode");
    }

    #[test]
    fn test_mode_without_matching_block() {
        let diagnostics = diagnose("auth {\n  mode: basic\n}\n");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code.as_str(), "authMode.authBlock");
        assert!(diagnostics[0].message.contains("'auth:basic' is missing"));
    }

    #[test]
    fn test_mode_mismatch() {
        let text = "auth {\n  mode: basic\n}\n\nauth:bearer {\n  token: abc\n}\n";
        let diagnostics = diagnose(text);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("does not match block 'auth:bearer'"));
    }
}
