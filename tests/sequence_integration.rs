//! Integration tests for the sequence invariant tracker.

use bru_lang::blocks::ParseResult;
use bru_lang::cancel::CancelFlag;
use bru_lang::diagnostics::{DiagnosticCode, MetaCode};
use bru_lang::document::Document;
use bru_lang::parser;
use bru_lang::sequence::{
    check_sequence_collision, ConflictRegistry, SiblingFuture, SiblingIndex, SiblingSequence,
};
use std::path::{Path, PathBuf};

const CODE: DiagnosticCode = DiagnosticCode::Meta(MetaCode::SeqCollision);

/// A sibling index over a fixed in-memory set, standing in for the host's
/// collection index.
struct FixedIndex {
    siblings: Vec<SiblingSequence>,
}

impl SiblingIndex for FixedIndex {
    fn sibling_sequences(&self, _directory: &Path) -> SiblingFuture<'_> {
        let siblings = self.siblings.clone();
        Box::pin(async move { Ok(siblings) })
    }
}

fn request_file(seq: u64) -> ParseResult {
    let text = format!("meta {{\n  name: r\n  seq: {}\n}}\n", seq);
    parser::parse(&Document::new(text))
}

fn sibling(path: &str, sequence: u64) -> SiblingSequence {
    SiblingSequence {
        path: PathBuf::from(path),
        sequence: Some(sequence),
    }
}

#[tokio::test]
async fn test_collision_propagates_to_both_files() {
    // Two sibling request files both carry seq 1; checking each one
    // diagnoses it and the registry accumulates the shared conflict set.
    let registry = ConflictRegistry::new();
    let index = FixedIndex {
        siblings: vec![sibling("/c/a.bru", 1), sibling("/c/b.bru", 1)],
    };
    let parsed = request_file(1);

    for path in ["/c/a.bru", "/c/b.bru"] {
        let diagnostics = check_sequence_collision(
            Path::new(path),
            &parsed,
            &index,
            &registry,
            &CancelFlag::new(),
        )
        .await;
        assert_eq!(diagnostics.len(), 1, "collision expected on {}", path);
        assert_eq!(diagnostics[0].code.as_str(), "meta.seqCollision");
    }

    let affected = registry.affected_files(CODE);
    assert!(affected.contains(Path::new("/c/a.bru")));
    assert!(affected.contains(Path::new("/c/b.bru")));
}

#[tokio::test]
async fn test_resolving_collision_withdraws_both_registrations() {
    let registry = ConflictRegistry::new();

    // Both files collide on seq 1.
    let index = FixedIndex {
        siblings: vec![sibling("/c/a.bru", 1), sibling("/c/b.bru", 1)],
    };
    let parsed = request_file(1);
    for path in ["/c/a.bru", "/c/b.bru"] {
        check_sequence_collision(
            Path::new(path),
            &parsed,
            &index,
            &registry,
            &CancelFlag::new(),
        )
        .await;
    }
    assert_eq!(registry.affected_files(CODE).len(), 2);

    // One file moves to seq 2; the next check of each file is clean and
    // withdraws its registration.
    let index = FixedIndex {
        siblings: vec![sibling("/c/a.bru", 2), sibling("/c/b.bru", 1)],
    };
    let moved = request_file(2);
    let diagnostics = check_sequence_collision(
        Path::new("/c/a.bru"),
        &moved,
        &index,
        &registry,
        &CancelFlag::new(),
    )
    .await;
    assert!(diagnostics.is_empty());

    let kept = request_file(1);
    let diagnostics = check_sequence_collision(
        Path::new("/c/b.bru"),
        &kept,
        &index,
        &registry,
        &CancelFlag::new(),
    )
    .await;
    assert!(diagnostics.is_empty());
    assert!(
        registry.affected_files(CODE).is_empty(),
        "registry must be empty once both files re-check clean"
    );
}

#[tokio::test]
async fn test_collision_lists_every_colliding_sibling() {
    let registry = ConflictRegistry::new();
    let index = FixedIndex {
        siblings: vec![
            sibling("/c/a.bru", 1),
            sibling("/c/b.bru", 1),
            sibling("/c/c.bru", 1),
            sibling("/c/d.bru", 2),
        ],
    };
    let parsed = request_file(1);
    let diagnostics = check_sequence_collision(
        Path::new("/c/a.bru"),
        &parsed,
        &index,
        &registry,
        &CancelFlag::new(),
    )
    .await;

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].related_information.len(), 2);
    let affected = registry.affected_files(CODE);
    assert_eq!(affected.len(), 3, "current file plus both colliding siblings");
    assert!(!affected.contains(Path::new("/c/d.bru")));
}
