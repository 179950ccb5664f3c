//! # Health evaluation with a saturation grace window.
//!
//! The engine is **backpressured** when every global slot is busy and at least
//! one request is waiting. Backpressure is tolerated for `grace`; after that the
//! snapshot reports `healthy = false`. A lane that has reached its ceiling is
//! unhealthy immediately, since new submissions of that type are being refused.
//!
//! Saturation with an empty queue is healthy: the providers are busy, but
//! nobody is waiting.
//!
//! ```text
//!   t0: active=limit, queued>0   → saturated_since = t0, healthy
//!   t0 + grace:                  → unhealthy
//!   queued == 0 or active<limit  → saturated_since = None, healthy
//! ```

use std::time::Duration;

use tokio::time::Instant;

use super::HealthSnapshot;

/// Inputs of one evaluation, gathered from the ledger and the admission queue.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Occupancy {
    pub active_global: usize,
    pub global_limit: usize,
    pub total_queued: usize,
    pub any_lane_full: bool,
    pub max_queue: usize,
}

/// Stateful evaluator; remembers when the current saturation episode began.
#[derive(Debug)]
pub(crate) struct HealthEvaluator {
    grace: Duration,
    saturated_since: Option<Instant>,
}

impl HealthEvaluator {
    pub fn new(grace: Duration) -> Self {
        Self {
            grace,
            saturated_since: None,
        }
    }

    pub fn evaluate(&mut self, occ: Occupancy, now: Instant) -> HealthSnapshot {
        let backpressured = occ.active_global >= occ.global_limit && occ.total_queued > 0;

        let over_grace = if backpressured {
            let since = *self.saturated_since.get_or_insert(now);
            now.saturating_duration_since(since) >= self.grace
        } else {
            self.saturated_since = None;
            false
        };

        HealthSnapshot {
            healthy: !over_grace && !occ.any_lane_full,
            total_queued: occ.total_queued,
            active_global: occ.active_global,
            max_queue: occ.max_queue,
        }
    }
}
