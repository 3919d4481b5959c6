//! Single-run mutual exclusion.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Atomic "a sync is running" flag.
///
/// Ownership is taken with a compare-and-set, so two concurrent starts can
/// never both win. Release is unconditional and idempotent.
#[derive(Debug, Clone, Default)]
pub struct RunFlag {
    active: Arc<AtomicBool>,
}

impl RunFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to take ownership of the run slot. Returns false when a run is
    /// already active.
    pub fn try_acquire(&self) -> bool {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn release(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}
