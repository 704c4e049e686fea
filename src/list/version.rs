//! Shared column data version.
//!
//! Every row remembers the version it was last decoded under. Bumping the
//! shared counter makes every row stale at once without visiting any of
//! them; a row notices on its next access by comparing stamps.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Version a row carries before its first decode. Never equal to a live version.
pub const UNSET_VERSION: u64 = 0;

/// Cloneable handle to one process-wide version counter.
///
/// Clones observe the same counter. The counter only moves forward; a `u64`
/// does not wrap at any realistic invalidation rate.
#[derive(Debug, Clone)]
pub struct DataVersion {
    counter: Arc<AtomicU64>,
}

impl DataVersion {
    /// Create a counter starting at 1.
    pub fn new() -> Self {
        Self {
            counter: Arc::new(AtomicU64::new(UNSET_VERSION + 1)),
        }
    }

    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::Acquire)
    }

    /// Mark every row's cached column text stale.
    pub fn invalidate_all(&self) {
        let previous = self.counter.fetch_add(1, Ordering::AcqRel);
        tracing::debug!(version = previous + 1, "Column data invalidated");
    }
}

impl Default for DataVersion {
    fn default() -> Self {
        Self::new()
    }
}
