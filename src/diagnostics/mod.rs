//! Diagnostics engine and orchestrator.
//!
//! Every check is a pure function from a [`CheckContext`] to a list of
//! diagnostics. The orchestrator selects the check pipeline by file kind,
//! runs every check (no check can suppress another, and there is no
//! short-circuiting), flattens the results, and observes cooperative
//! cancellation between checks.
//!
//! Diagnostic codes are stable strings namespaced by scope; consumers rely
//! on them for filtering and for idempotently adding or removing a
//! specific diagnostic class.

pub mod auth;
pub mod auth_mode;
pub mod body;
pub mod consistency;
pub mod dictionary;
pub mod environment;
pub mod meta;
pub mod method;
pub mod settings;
pub mod structural;

use crate::blocks::{shape_of, Block, BlockContent, BlockShape, ParseResult};
use crate::cancel::CancelFlag;
use crate::document::{Document, Range};
use crate::FileKind;
use serde::Serialize;
use std::fmt;

/// Diagnostic severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticSeverity {
    /// The file will not behave correctly
    Error,
    /// The file works but has issues
    Warning,
    /// Informational message
    Info,
}

/// A secondary location attached to a diagnostic, explaining or
/// cross-referencing the primary location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelatedInformation {
    pub range: Range,
    pub message: String,
}

impl RelatedInformation {
    pub fn new(range: Range, message: impl Into<String>) -> Self {
        Self {
            range,
            message: message.into(),
        }
    }
}

macro_rules! scoped_codes {
    ($(#[$meta:meta])* $name:ident, $scope:literal, { $($variant:ident => $code:literal,)* }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)*
        }

        impl $name {
            /// Returns the stable string form of this code.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => concat!($scope, ".", $code),)*
                }
            }
        }
    };
}

scoped_codes!(
    /// Codes for the structural tier, applicable to every file kind.
    GlobalCode, "global", {
        DuplicateBlockName => "duplicateBlockName",
        MultipleMethodBlocks => "multipleMethodBlocks",
        MultipleAuthBlocks => "multipleAuthBlocks",
        MultipleBodyBlocks => "multipleBodyBlocks",
        StrayText => "strayText",
        BlockSeparation => "blockSeparation",
        MalformedBlock => "malformedBlock",
        EmptyDictionaryBlock => "emptyDictionaryBlock",
        MalformedLine => "malformedLine",
        InvalidBlockNames => "invalidBlockNames",
        UnclosedBlock => "unclosedBlock",
        MissingMetaBlock => "missingMetaBlock",
        MissingMethodBlock => "missingMethodBlock",
    }
);

scoped_codes!(
    /// Codes for the `meta` block.
    MetaCode, "meta", {
        MissingKeys => "missingKeys",
        UnknownKeys => "unknownKeys",
        DuplicateKeys => "duplicateKeys",
        InvalidSeq => "invalidSeq",
        DuplicateTags => "duplicateTags",
        SeqCollision => "seqCollision",
    }
);

scoped_codes!(
    /// Codes for the typed `auth:*` blocks.
    AuthCode, "auth", {
        MissingKeys => "missingKeys",
        UnknownKeys => "unknownKeys",
        DuplicateKeys => "duplicateKeys",
    }
);

scoped_codes!(
    /// Codes for the HTTP method block.
    MethodCode, "method", {
        MissingKeys => "missingKeys",
        UnknownKeys => "unknownKeys",
        DuplicateKeys => "duplicateKeys",
        AuthBlock => "authBlock",
        BodyBlock => "bodyBlock",
        PathParams => "pathParams",
        QueryParams => "queryParams",
    }
);

scoped_codes!(
    /// Codes for the body blocks.
    BodyCode, "body", {
        InvalidJson => "invalidJson",
    }
);

scoped_codes!(
    /// Codes for the `settings` block.
    SettingsCode, "settings", {
        UnknownKeys => "unknownKeys",
        DuplicateKeys => "duplicateKeys",
        InvalidValue => "invalidValue",
    }
);

scoped_codes!(
    /// Codes for the folder/collection `auth` mode block.
    AuthModeCode, "authMode", {
        MissingMode => "missingMode",
        InvalidMode => "invalidMode",
        AuthBlock => "authBlock",
        UnknownKeys => "unknownKeys",
        DuplicateKeys => "duplicateKeys",
    }
);

scoped_codes!(
    /// Codes for environment files.
    EnvironmentCode, "environment", {
        DuplicateKeys => "duplicateKeys",
        DuplicateSecrets => "duplicateSecrets",
        SecretShadowed => "secretShadowed",
    }
);

/// A diagnostic code, drawn from a small closed set of per-scope
/// enumerations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    Global(GlobalCode),
    Meta(MetaCode),
    Auth(AuthCode),
    Method(MethodCode),
    Body(BodyCode),
    Settings(SettingsCode),
    AuthMode(AuthModeCode),
    Environment(EnvironmentCode),
}

impl DiagnosticCode {
    /// Returns the stable string form, e.g. `meta.duplicateKeys`.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::Global(code) => code.as_str(),
            DiagnosticCode::Meta(code) => code.as_str(),
            DiagnosticCode::Auth(code) => code.as_str(),
            DiagnosticCode::Method(code) => code.as_str(),
            DiagnosticCode::Body(code) => code.as_str(),
            DiagnosticCode::Settings(code) => code.as_str(),
            DiagnosticCode::AuthMode(code) => code.as_str(),
            DiagnosticCode::Environment(code) => code.as_str(),
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DiagnosticCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A positioned diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// The range the diagnostic applies to
    pub range: Range,
    pub severity: DiagnosticSeverity,
    pub message: String,
    pub code: DiagnosticCode,
    /// Secondary locations, e.g. earlier definitions of a duplicated key
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_information: Vec<RelatedInformation>,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    pub fn error(range: Range, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            range,
            severity: DiagnosticSeverity::Error,
            message: message.into(),
            code,
            related_information: Vec::new(),
        }
    }

    /// Creates a new warning diagnostic.
    pub fn warning(range: Range, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            range,
            severity: DiagnosticSeverity::Warning,
            message: message.into(),
            code,
            related_information: Vec::new(),
        }
    }

    /// Attaches related information.
    pub fn with_related(mut self, related: Vec<RelatedInformation>) -> Self {
        self.related_information = related;
        self
    }
}

/// Everything a check needs: the document, its parse result, and the file
/// kind. Created fresh per check cycle, consumed read-only.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    pub document: &'a Document,
    pub parse_result: &'a ParseResult,
    pub file_kind: FileKind,
}

impl<'a> CheckContext<'a> {
    pub fn new(document: &'a Document, parse_result: &'a ParseResult, file_kind: FileKind) -> Self {
        Self {
            document,
            parse_result,
            file_kind,
        }
    }

    /// Returns the block with the given name when exactly one instance
    /// exists *and* it parsed as a dictionary. This is the gate for every
    /// block-specific check, so a duplicated or malformed block is never
    /// double-reported.
    pub fn single_dictionary_block(&self, name: &str) -> Option<&'a Block> {
        let block = self.parse_result.single_block(name)?;
        match block.content {
            BlockContent::Dictionary(_) => Some(block),
            _ => None,
        }
    }

    /// Returns the method block when exactly one exists and it parsed as
    /// a dictionary.
    pub fn single_method_block(&self) -> Option<&'a Block> {
        let block = self.parse_result.method_block()?;
        match block.content {
            BlockContent::Dictionary(_) => Some(block),
            _ => None,
        }
    }

    /// Returns the auth block when exactly one exists and it parsed with
    /// its expected (dictionary) shape.
    pub fn single_auth_block(&self) -> Option<&'a Block> {
        let mut blocks = self.parse_result.auth_blocks();
        let block = blocks.next()?;
        if blocks.next().is_some() {
            return None;
        }
        match block.content {
            BlockContent::Dictionary(_) => Some(block),
            _ => None,
        }
    }

    /// Returns the body block when exactly one exists and it parsed with
    /// its expected shape.
    pub fn single_body_block(&self) -> Option<&'a Block> {
        let mut blocks = self.parse_result.body_blocks();
        let block = blocks.next()?;
        if blocks.next().is_some() {
            return None;
        }
        let expected_shape = shape_of(&block.name)?;
        let shape_matches = matches!(
            (&block.content, expected_shape),
            (BlockContent::Dictionary(_), BlockShape::Dictionary)
                | (BlockContent::Code { .. }, BlockShape::Json)
                | (BlockContent::Text(_), BlockShape::Text)
        );
        if shape_matches {
            Some(block)
        } else {
            None
        }
    }
}

/// A single check: pure, independent, and free to return nothing.
pub type Check = fn(&CheckContext) -> Vec<Diagnostic>;

/// The structural tier, run unconditionally for every file kind.
const STRUCTURAL_CHECKS: &[Check] = &[
    structural::check_block_cardinality,
    structural::check_stray_text,
    structural::check_block_separation,
    structural::check_dictionary_shapes,
    structural::check_malformed_dictionary_lines,
    structural::check_empty_dictionary_blocks,
    structural::check_allowed_block_names,
    structural::check_unclosed_blocks,
    structural::check_request_singletons,
];

const REQUEST_CHECKS: &[Check] = &[
    meta::check_meta_block,
    method::check_method_block,
    method::check_auth_consistency,
    method::check_body_consistency,
    auth::check_auth_block,
    body::check_json_body,
    settings::check_settings_block,
    crate::params::check_path_params,
    crate::params::check_query_params,
];

const FOLDER_CHECKS: &[Check] = &[
    meta::check_meta_block,
    auth_mode::check_auth_mode_block,
    auth::check_auth_block,
];

const COLLECTION_CHECKS: &[Check] = &[auth_mode::check_auth_mode_block, auth::check_auth_block];

const ENVIRONMENT_CHECKS: &[Check] = &[
    environment::check_vars_block,
    environment::check_secret_block,
    environment::check_secret_shadowing,
];

fn pipeline(kind: FileKind) -> &'static [Check] {
    match kind {
        FileKind::Request => REQUEST_CHECKS,
        FileKind::FolderSettings => FOLDER_CHECKS,
        FileKind::CollectionSettings => COLLECTION_CHECKS,
        FileKind::Environment => ENVIRONMENT_CHECKS,
    }
}

/// Runs the full check pipeline for the context's file kind.
///
/// Every check runs; results are flattened in pipeline order. When the
/// cancel flag is observed set, the run returns an empty list rather than
/// a partial, inconsistent one.
pub fn run_checks(ctx: &CheckContext, cancel: &CancelFlag) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for check in STRUCTURAL_CHECKS.iter().chain(pipeline(ctx.file_kind)) {
        if cancel.is_cancelled() {
            log::debug!("check run cancelled, dropping {} diagnostics", diagnostics.len());
            return Vec::new();
        }
        diagnostics.extend(check(ctx));
    }
    log::trace!(
        "{:?} check run produced {} diagnostics",
        ctx.file_kind,
        diagnostics.len()
    );
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn run(text: &str, kind: FileKind) -> Vec<Diagnostic> {
        let document = Document::new(text);
        let parsed = parser::parse(&document);
        let ctx = CheckContext::new(&document, &parsed, kind);
        run_checks(&ctx, &CancelFlag::new())
    }

    #[test]
    fn test_clean_request_file_has_no_diagnostics() {
        let text = "meta {\n  name: Get user\n  seq: 1\n}\n\nget {\n  url: https://api.example.com/users\n}\n";
        assert_eq!(run(text, FileKind::Request), Vec::new());
    }

    #[test]
    fn test_cancelled_run_returns_nothing() {
        let document = Document::new("not a block\n");
        let parsed = parser::parse(&document);
        let ctx = CheckContext::new(&document, &parsed, FileKind::Request);
        let cancel = CancelFlag::new();
        cancel.cancel();
        assert!(run_checks(&ctx, &cancel).is_empty());
        // The same context does produce diagnostics when not cancelled.
        assert!(!run_checks(&ctx, &CancelFlag::new()).is_empty());
    }

    #[test]
    fn test_codes_are_stable_strings() {
        assert_eq!(
            DiagnosticCode::Global(GlobalCode::StrayText).as_str(),
            "global.strayText"
        );
        assert_eq!(
            DiagnosticCode::Meta(MetaCode::DuplicateKeys).as_str(),
            "meta.duplicateKeys"
        );
        assert_eq!(
            DiagnosticCode::AuthMode(AuthModeCode::InvalidMode).as_str(),
            "authMode.invalidMode"
        );
    }

    #[test]
    fn test_code_serializes_as_string() {
        let json =
            serde_json::to_string(&DiagnosticCode::Method(MethodCode::PathParams)).unwrap();
        assert_eq!(json, "\"method.pathParams\"");
    }

    #[test]
    fn test_checks_are_independent() {
        // A file with several unrelated problems reports all of them.
        let text = "stray\nmeta {\n  name: a\n  seq: 0\n}\nget {\n  url: https://x\n}\n";
        let diagnostics = run(text, FileKind::Request);
        let codes: Vec<&str> = diagnostics.iter().map(|d| d.code.as_str()).collect();
        assert!(codes.contains(&"global.strayText"));
        assert!(codes.contains(&"global.blockSeparation"));
        assert!(codes.contains(&"meta.invalidSeq"));
    }
}
