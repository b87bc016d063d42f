//! Key checks for the typed `auth:*` blocks.

use crate::diagnostics::{dictionary, AuthCode, CheckContext, Diagnostic, DiagnosticCode};

/// Required and allowed key tables per auth kind.
struct AuthKeyTable {
    block_name: &'static str,
    required: &'static [&'static str],
    allowed: &'static [&'static str],
}

const AUTH_KEY_TABLES: &[AuthKeyTable] = &[
    AuthKeyTable {
        block_name: "auth:awsv4",
        required: &["accessKeyId", "secretAccessKey"],
        allowed: &[
            "accessKeyId",
            "secretAccessKey",
            "sessionToken",
            "service",
            "region",
            "profileName",
        ],
    },
    AuthKeyTable {
        block_name: "auth:basic",
        required: &["username", "password"],
        allowed: &["username", "password"],
    },
    AuthKeyTable {
        block_name: "auth:bearer",
        required: &["token"],
        allowed: &["token"],
    },
    AuthKeyTable {
        block_name: "auth:digest",
        required: &["username", "password"],
        allowed: &["username", "password"],
    },
    AuthKeyTable {
        block_name: "auth:ntlm",
        required: &["username", "password"],
        allowed: &["username", "password", "domain"],
    },
    AuthKeyTable {
        block_name: "auth:oauth2",
        required: &["grantType"],
        allowed: &[
            "grantType",
            "callbackUrl",
            "authorizationUrl",
            "accessTokenUrl",
            "refreshTokenUrl",
            "clientId",
            "clientSecret",
            "scope",
            "state",
            "pkce",
            "credentialsPlacement",
            "tokenPlacement",
            "tokenHeaderPrefix",
            "tokenQueryKey",
            "username",
            "password",
            "autoFetchToken",
            "autoRefreshToken",
        ],
    },
    AuthKeyTable {
        block_name: "auth:wsse",
        required: &["username", "password"],
        allowed: &["username", "password"],
    },
    AuthKeyTable {
        block_name: "auth:apikey",
        required: &["key", "value"],
        allowed: &["key", "value", "placement"],
    },
];

pub fn check_auth_block(ctx: &CheckContext) -> Vec<Diagnostic> {
    let block = match ctx.single_auth_block() {
        Some(block) => block,
        None => return Vec::new(),
    };
    let table = match AUTH_KEY_TABLES.iter().find(|t| t.block_name == block.name) {
        Some(table) => table,
        None => return Vec::new(),
    };

    let mut diagnostics = Vec::new();
    diagnostics.extend(dictionary::check_missing_keys(
        block,
        table.required,
        DiagnosticCode::Auth(AuthCode::MissingKeys),
    ));
    diagnostics.extend(dictionary::check_unknown_keys(
        block,
        table.allowed,
        DiagnosticCode::Auth(AuthCode::UnknownKeys),
    ));
    diagnostics.extend(dictionary::check_duplicate_keys(
        block,
        DiagnosticCode::Auth(AuthCode::DuplicateKeys),
    ));
    diagnostics
}
