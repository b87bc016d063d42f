//! Cooperative cancellation.
//!
//! Check pipelines can run over large files and may be superseded by a
//! newer edit before they finish. The orchestrator observes a
//! [`CancelFlag`] at coarse boundaries (between independent checks, before
//! cross-file lookups) and returns no further diagnostics once it is set.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cheap, cloneable cancellation flag.
///
/// Clones share the same underlying flag; cancelling any clone cancels
/// them all.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    /// Creates a new, unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Returns true once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}
