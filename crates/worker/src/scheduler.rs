//! Optional background sweep.
//!
//! Rollups normally advance on access. When enabled, the sweep additionally
//! runs one pass per configured owner per rollup layer on every tick,
//! children first, so a cascade reaches the yearly layer over successive
//! ticks. A tick never loops a layer until it is caught up.

use rollup_core::{OwnerContext, ROLLUP_LAYERS};
use serde::Serialize;
use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::config::SchedulerConfig;
use crate::rollup::RollupOrchestrator;

/// Tally of one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub created: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// Background sweep scheduler.
pub struct RollupScheduler {
    config: SchedulerConfig,
    orchestrator: Arc<RollupOrchestrator>,
}

impl RollupScheduler {
    pub fn new(config: SchedulerConfig, orchestrator: Arc<RollupOrchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    /// Starts the sweep task if enabled.
    pub fn start(self: Arc<Self>) -> Vec<tokio::task::JoinHandle<()>> {
        if !self.config.enabled {
            info!("Background sweep disabled; rollups run on access only");
            return Vec::new();
        }

        if self.config.owners.is_empty() {
            warn!("Background sweep enabled with no owners configured");
        }

        let scheduler = self.clone();
        let handle = tokio::spawn(async move {
            scheduler.run_sweeps().await;
        });

        info!(
            owners = self.config.owners.len(),
            interval_secs = self.config.sweep_interval_secs,
            "Background sweep started"
        );
        vec![handle]
    }

    async fn run_sweeps(&self) {
        let mut ticker = interval(self.config.sweep_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let report = self.sweep_once(&self.config.owners).await;
            let snapshot = telemetry::metrics().snapshot();

            info!(
                created = report.created,
                skipped = report.skipped,
                failed = report.failed,
                total_created = snapshot.summaries_created,
                total_errors = snapshot.rollup_errors,
                decrypt_failures = snapshot.decrypt_failures,
                "Sweep complete"
            );
        }
    }

    /// One pass per owner per rollup layer.
    pub async fn sweep_once(&self, owners: &[OwnerContext]) -> SweepReport {
        let mut report = SweepReport::default();

        for owner in owners {
            for layer in ROLLUP_LAYERS {
                let outcome = self.orchestrator.run_once(layer, owner).await;
                if outcome.created {
                    report.created += 1;
                } else if outcome.is_error() {
                    report.failed += 1;
                } else {
                    report.skipped += 1;
                }
            }
        }

        report
    }
}
