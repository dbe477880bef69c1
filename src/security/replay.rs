//! Timestamp replay window.
//!
//! There is no nonce store: a captured request can be replayed for as long
//! as its timestamp stays inside the window.

use std::sync::Arc;

use crate::clock::Clock;

pub struct ReplayGuard {
    tolerance_secs: u64,
    clock: Arc<dyn Clock>,
}

impl ReplayGuard {
    pub fn new(tolerance_secs: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            tolerance_secs,
            clock,
        }
    }

    /// A zero timestamp means "unsigned by time" and is always accepted.
    /// Otherwise the distance to now may be at most the tolerance, either way.
    pub fn fresh(&self, timestamp_secs: i64) -> bool {
        if timestamp_secs == 0 {
            return true;
        }
        self.clock.now_secs().abs_diff(timestamp_secs) <= self.tolerance_secs
    }
}
