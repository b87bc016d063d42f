//! Cross-file sequence uniqueness.
//!
//! A request file's `seq` must be unique among its siblings. Sibling
//! enumeration is the collaborator's job, behind [`SiblingIndex`]; this
//! module diagnoses collisions on the file under edit and keeps the
//! process-wide [`ConflictRegistry`] current so the host knows which other
//! open files need their diagnostics recomputed or cleared.

pub mod renumber;

use crate::blocks::{DictionaryField, ParseResult};
use crate::cancel::CancelFlag;
use crate::diagnostics::{Diagnostic, DiagnosticCode, MetaCode, RelatedInformation};
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;

const COLLISION_CODE: DiagnosticCode = DiagnosticCode::Meta(MetaCode::SeqCollision);

/// One sibling file and its cached sequence value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiblingSequence {
    pub path: PathBuf,
    /// `None` when the sibling has no parseable `seq`
    pub sequence: Option<u64>,
}

pub type SiblingFuture<'a> = Pin<Box<dyn Future<Output = io::Result<Vec<SiblingSequence>>> + Send + 'a>>;

/// The collaborator that enumerates sibling files and their cached
/// sequence values. The only suspending operation in the crate.
pub trait SiblingIndex: Send + Sync {
    fn sibling_sequences(&self, directory: &Path) -> SiblingFuture<'_>;
}

/// Process-wide conflict membership, keyed by diagnostic code.
///
/// Holds no diagnostic content, only file-set membership: each registrant
/// records the files its last check found in conflict, and
/// [`affected_files`](Self::affected_files) returns the union. Created
/// empty at startup, mutated on every check run, never persisted.
/// Concurrent check runs from different files may race; last writer wins
/// per registrant entry, which is safe because each file only registers
/// its own membership.
#[derive(Debug, Default)]
pub struct ConflictRegistry {
    entries: DashMap<&'static str, HashMap<PathBuf, HashSet<PathBuf>>>,
}

impl ConflictRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the file set `registrant`'s latest check found in conflict.
    pub fn register(
        &self,
        code: DiagnosticCode,
        registrant: &Path,
        files: impl IntoIterator<Item = PathBuf>,
    ) {
        self.entries
            .entry(code.as_str())
            .or_default()
            .insert(registrant.to_path_buf(), files.into_iter().collect());
    }

    /// Withdraws `registrant`'s entry for the given code.
    pub fn unregister(&self, registrant: &Path, code: DiagnosticCode) {
        if let Some(mut entry) = self.entries.get_mut(code.as_str()) {
            entry.remove(registrant);
        }
    }

    /// Returns every file any registrant currently holds in conflict for
    /// the given code.
    pub fn affected_files(&self, code: DiagnosticCode) -> HashSet<PathBuf> {
        self.entries
            .get(code.as_str())
            .map(|entry| entry.values().flatten().cloned().collect())
            .unwrap_or_default()
    }
}

/// Returns the file's `seq` value and its value range, when present and
/// valid. Invalid values are the meta checks' concern.
fn sequence_value(result: &ParseResult) -> Option<(u64, crate::document::Range)> {
    let meta = result.single_block("meta")?;
    match meta.field("seq")? {
        DictionaryField::Simple {
            value: Some(value),
            value_range: Some(range),
            ..
        } => {
            let sequence = value.parse::<u64>().ok().filter(|n| *n >= 1)?;
            Some((sequence, *range))
        }
        _ => None,
    }
}

/// Checks the file's `seq` against its siblings.
///
/// On a collision: one diagnostic at the `seq` value range, the colliding
/// siblings listed as related information, and the full conflict set
/// registered. When clean, any previous registration is withdrawn.
pub async fn check_sequence_collision(
    path: &Path,
    result: &ParseResult,
    index: &dyn SiblingIndex,
    registry: &ConflictRegistry,
    cancel: &CancelFlag,
) -> Vec<Diagnostic> {
    let (sequence, range) = match sequence_value(result) {
        Some(value) => value,
        None => {
            registry.unregister(path, COLLISION_CODE);
            return Vec::new();
        }
    };

    if cancel.is_cancelled() {
        return Vec::new();
    }
    let directory = match path.parent() {
        Some(directory) => directory,
        None => return Vec::new(),
    };
    let siblings = match index.sibling_sequences(directory).await {
        Ok(siblings) => siblings,
        Err(error) => {
            log::debug!("sibling lookup failed for {}: {}", directory.display(), error);
            return Vec::new();
        }
    };
    if cancel.is_cancelled() {
        return Vec::new();
    }

    let colliding: Vec<&SiblingSequence> = siblings
        .iter()
        .filter(|sibling| sibling.path != path && sibling.sequence == Some(sequence))
        .collect();

    if colliding.is_empty() {
        registry.unregister(path, COLLISION_CODE);
        return Vec::new();
    }

    let mut conflict_set: Vec<PathBuf> = vec![path.to_path_buf()];
    conflict_set.extend(colliding.iter().map(|sibling| sibling.path.clone()));
    registry.register(COLLISION_CODE, path, conflict_set);
    log::trace!(
        "seq {} on {} collides with {} sibling(s)",
        sequence,
        path.display(),
        colliding.len()
    );

    let related = colliding
        .iter()
        .map(|sibling| {
            RelatedInformation::new(
                range,
                format!("Also used by '{}'", sibling.path.display()),
            )
        })
        .collect();
    vec![Diagnostic::error(
        range,
        COLLISION_CODE,
        format!("Sequence number {} is already used by a sibling file", sequence),
    )
    .with_related(related)]
}
