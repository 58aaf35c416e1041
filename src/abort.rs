//! Cooperative cancellation for long-running exposures.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancellation handle polled by exposure loops.
///
/// Clones share the underlying flag, so a token handed to a signal handler
/// or another thread aborts the exposure running on the calling thread.
#[derive(Debug, Clone, Default)]
pub struct AbortToken {
    flag: Arc<AtomicBool>,
}

impl AbortToken {
    /// Create a new, untriggered token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the current exposure stop.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether an abort has been requested.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can be reused for the next exposure.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
