//! Common test setup.

use api::{router, AppState};
use axum::Router;
use chrono::{DateTime, Utc};
use rollup_core::{Layer, ManualClock, OwnerContext, PeriodSummary, RollupOutcome};
use std::sync::Arc;
use summary_store::{MemorySummaryStore, SummaryStore};
use worker::{
    ContentGenerator, EngineConfig, InvocationTrigger, RollupOrchestrator, RollupScheduler,
    SchedulerConfig,
};

use crate::mocks::{MockCipher, MockGenerator};

/// In-process engine with a manual clock.
///
/// Uses the real orchestrator, trigger and router; only the cipher and
/// generation service are mocked.
pub struct TestContext {
    pub store: Arc<MemorySummaryStore>,
    pub clock: Arc<ManualClock>,
    pub cipher: Arc<MockCipher>,
    pub generator: Arc<MockGenerator>,
    pub orchestrator: Arc<RollupOrchestrator>,
    pub engine: EngineConfig,
}

impl TestContext {
    /// Engine with default policy, clock stopped at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_engine(now, EngineConfig::default())
    }

    pub fn with_engine(now: DateTime<Utc>, engine: EngineConfig) -> Self {
        let generator = Arc::new(MockGenerator::new());
        Self::with_generator(now, engine, generator.clone(), generator)
    }

    /// Engine whose orchestrator calls `active` instead of the captured mock.
    pub fn with_generator(
        now: DateTime<Utc>,
        engine: EngineConfig,
        generator: Arc<MockGenerator>,
        active: Arc<dyn ContentGenerator>,
    ) -> Self {
        let clock = Arc::new(ManualClock::new(now));
        let store = Arc::new(MemorySummaryStore::with_clock(clock.clone()));
        let cipher = Arc::new(MockCipher::new());

        let orchestrator = Arc::new(RollupOrchestrator::new(
            store.clone(),
            cipher.clone(),
            active,
            clock.clone(),
            engine.locator(),
        ));

        Self {
            store,
            clock,
            cipher,
            generator,
            orchestrator,
            engine,
        }
    }

    /// Seed upstream summaries.
    pub fn seed(&self, summaries: impl IntoIterator<Item = PeriodSummary>) {
        for summary in summaries {
            assert!(self.store.seed(summary), "duplicate fixture period");
        }
    }

    pub async fn run(&self, layer: Layer, owner: &OwnerContext) -> RollupOutcome {
        self.orchestrator.run_once(layer, owner).await
    }

    /// Run passes until one creates nothing; returns the number created.
    pub async fn run_until_idle(&self, layer: Layer, owner: &OwnerContext) -> usize {
        let mut created = 0;
        while self.run(layer, owner).await.created {
            created += 1;
        }
        created
    }

    pub async fn summaries(&self, owner_id: &str, layer: Layer) -> Vec<PeriodSummary> {
        let mut summaries = self
            .store
            .list_summaries(owner_id, layer)
            .await
            .expect("memory store never fails");
        summaries.sort_by_key(|summary| summary.period_start);
        summaries
    }

    pub fn trigger(&self, layer: Layer) -> InvocationTrigger {
        InvocationTrigger::with_interval(
            layer,
            self.orchestrator.clone(),
            self.engine.trigger_interval(),
        )
    }

    pub fn scheduler(&self, owners: Vec<OwnerContext>) -> RollupScheduler {
        RollupScheduler::new(
            SchedulerConfig {
                enabled: true,
                owners,
                ..SchedulerConfig::default()
            },
            self.orchestrator.clone(),
        )
    }

    /// The real router over this context's orchestrator.
    pub fn router(&self) -> Router {
        router(AppState::new(self.orchestrator.clone(), &self.engine))
    }
}
