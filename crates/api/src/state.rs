//! Application state shared across handlers.

use moka::future::Cache;
use rollup_core::Layer;
use std::sync::Arc;
use std::time::Duration;
use summary_store::SummaryStore;
use tracing::debug;
use worker::{EngineConfig, InvocationTrigger, RollupOrchestrator};

/// Triggers idle longer than this are dropped; a fresh one starts unthrottled.
const TRIGGER_IDLE_TTL: Duration = Duration::from_secs(60 * 60);

/// Maximum live triggers.
const TRIGGER_MAX_CAPACITY: u64 = 100_000;

/// Invocation triggers keyed by (owner, layer).
///
/// Each trigger owns its own throttle timestamp; nothing is shared across
/// owners or layers.
#[derive(Clone)]
pub struct TriggerRegistry {
    orchestrator: Arc<RollupOrchestrator>,
    interval: chrono::Duration,
    triggers: Cache<(String, Layer), Arc<InvocationTrigger>>,
}

impl TriggerRegistry {
    pub fn new(orchestrator: Arc<RollupOrchestrator>, interval: chrono::Duration) -> Self {
        Self {
            orchestrator,
            interval,
            triggers: Cache::builder()
                .max_capacity(TRIGGER_MAX_CAPACITY)
                .time_to_idle(TRIGGER_IDLE_TTL)
                .build(),
        }
    }

    /// The trigger for this owner and layer, created on first use.
    pub async fn get(&self, owner_id: &str, layer: Layer) -> Arc<InvocationTrigger> {
        let key = (owner_id.to_string(), layer);
        self.triggers
            .get_with(key, async {
                debug!(owner_id, layer = %layer, "Creating invocation trigger");
                Arc::new(InvocationTrigger::with_interval(
                    layer,
                    self.orchestrator.clone(),
                    self.interval,
                ))
            })
            .await
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<RollupOrchestrator>,
    pub triggers: TriggerRegistry,
}

impl AppState {
    pub fn new(orchestrator: Arc<RollupOrchestrator>, engine: &EngineConfig) -> Self {
        Self {
            triggers: TriggerRegistry::new(orchestrator.clone(), engine.trigger_interval()),
            orchestrator,
        }
    }

    pub fn store(&self) -> &Arc<dyn SummaryStore> {
        self.orchestrator.store()
    }
}
