//! Checks for the `settings` block.

use crate::blocks::DictionaryField;
use crate::diagnostics::{dictionary, CheckContext, Diagnostic, DiagnosticCode, SettingsCode};

const ALLOWED_KEYS: &[&str] = &["encodeUrl"];
const BOOLEAN_KEYS: &[&str] = &["encodeUrl"];

pub fn check_settings_block(ctx: &CheckContext) -> Vec<Diagnostic> {
    let block = match ctx.single_dictionary_block("settings") {
        Some(block) => block,
        None => return Vec::new(),
    };

    let mut diagnostics = Vec::new();
    diagnostics.extend(dictionary::check_unknown_keys(
        block,
        ALLOWED_KEYS,
        DiagnosticCode::Settings(SettingsCode::UnknownKeys),
    ));
    diagnostics.extend(dictionary::check_duplicate_keys(
        block,
        DiagnosticCode::Settings(SettingsCode::DuplicateKeys),
    ));

    for key in BOOLEAN_KEYS {
        let field = match block.field(key) {
            Some(field) => field,
            None => continue,
        };
        if let DictionaryField::Simple {
            value,
            value_range,
            key_range,
            ..
        } = field
        {
            let valid = matches!(value.as_deref(), Some("true") | Some("false"));
            if !valid {
                diagnostics.push(Diagnostic::error(
                    value_range.unwrap_or(*key_range),
                    DiagnosticCode::Settings(SettingsCode::InvalidValue),
                    format!(
                        "Value '{}' of key '{}' must be 'true' or 'false'",
                        value.as_deref().unwrap_or_default(),
                        key
                    ),
                ));
            }
        }
    }
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
        let ctx = CheckContext::new(&document, &parsed, FileKind::Request);
        check_settings_block(&ctx)
    }

    #[test]
    fn test_valid_settings() {
        assert!(diagnose("settings {\n  encodeUrl: true\n}\n").is_empty());
        assert!(diagnose("settings {\n  encodeUrl: false\n}\n").is_empty());
    }

    #[test]
    fn test_non_boolean_value() {
        let diagnostics = diagnose("settings {\n  encodeUrl: yes\n}\n");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code.as_str(), "settings.invalidValue");
        assert_eq!(diagnostics[0].range.start.line, 1);
        assert_eq!(diagnostics[0].range.start.character, 13);
    }

    #[test]
    fn test_unknown_setting() {
        let diagnostics = diagnose("settings {\n  followRedirects: true\n}\n");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code.as_str(), "settings.unknownKeys");
        assert!(diagnostics[0].message.contains("encodeUrl"));
    }
}
