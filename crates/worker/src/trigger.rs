//! Invocation trigger: a per-layer throttle in front of the orchestrator.
//!
//! Callers fire the trigger opportunistically (a view loads, a session
//! resumes). It only limits redundant network calls; uniqueness of summaries
//! is the store's job.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rollup_core::{Clock, Layer, OwnerContext, RollupOutcome, SkipReason};
use std::sync::Arc;
use telemetry::metrics;
use tracing::debug;

use crate::rollup::RollupOrchestrator;

/// Default minimum spacing between two passes.
pub const DEFAULT_TRIGGER_INTERVAL_MINUTES: i64 = 5;

/// Throttled entry point bound to one layer.
///
/// Owns its `last_checked_at`; create one per owner (or session) and layer.
pub struct InvocationTrigger {
    layer: Layer,
    orchestrator: Arc<RollupOrchestrator>,
    min_interval: Duration,
    last_checked_at: Mutex<Option<DateTime<Utc>>>,
}

impl InvocationTrigger {
    pub fn new(layer: Layer, orchestrator: Arc<RollupOrchestrator>) -> Self {
        Self::with_interval(
            layer,
            orchestrator,
            Duration::minutes(DEFAULT_TRIGGER_INTERVAL_MINUTES),
        )
    }

    pub fn with_interval(
        layer: Layer,
        orchestrator: Arc<RollupOrchestrator>,
        min_interval: Duration,
    ) -> Self {
        Self {
            layer,
            orchestrator,
            min_interval,
            last_checked_at: Mutex::new(None),
        }
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    pub fn last_checked_at(&self) -> Option<DateTime<Utc>> {
        *self.last_checked_at.lock()
    }

    /// Run one pass unless the previous one started less than
    /// `min_interval` ago. The timestamp is taken before the pass, so it is
    /// updated whatever the outcome, and overlapping fires collapse to one.
    pub async fn fire(&self, owner: &OwnerContext) -> RollupOutcome {
        if !self.claim(self.orchestrator.clock().as_ref()) {
            metrics().triggers_throttled.inc();
            debug!(owner_id = %owner.owner_id, layer = %self.layer, "Trigger throttled");
            return RollupOutcome::skipped(SkipReason::Throttled, None);
        }

        metrics().triggers_fired.inc();
        self.orchestrator.run_once(self.layer, owner).await
    }

    fn claim(&self, clock: &dyn Clock) -> bool {
        let now = clock.now();
        let mut last = self.last_checked_at.lock();
        if let Some(previous) = *last {
            if now - previous < self.min_interval {
                return false;
            }
        }
        *last = Some(now);
        true
    }
}
