//! Submission-in-progress indicator cleared on every exit path.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Tracks in-flight submissions so the presentation layer can show a busy
/// indicator.
#[derive(Debug, Clone, Default)]
pub struct PendingFlag {
    in_flight: Arc<AtomicUsize>,
}

impl PendingFlag {
    /// Create an idle flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a submission as started; the returned guard ends it when dropped.
    pub fn begin(&self) -> PendingGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        PendingGuard {
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    /// Whether any submission is still outstanding.
    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }
}

/// Scope guard returned by [`PendingFlag::begin`].
#[derive(Debug)]
#[must_use = "the pending state ends as soon as the guard is dropped"]
pub struct PendingGuard {
    in_flight: Arc<AtomicUsize>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
