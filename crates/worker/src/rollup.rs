//! Rollup orchestrator: one bounded pass for one layer of one owner.
//!
//! A pass locates at most one gap, decrypts its children, asks the generation
//! service for prose, encrypts the result and persists a single summary.
//! Nothing is retried here; the caller re-invokes later.

use futures::future::join_all;
use rollup_core::{
    group_children, Clock, Error, Gap, GapLocator, GapSearch, Layer, NewPeriodSummary,
    OwnerContext, Period, Result, RollupOutcome, SkipReason,
};
use std::sync::Arc;
use std::time::Instant;
use summary_store::{PersistOutcome, SummaryStore};
use telemetry::metrics;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::cipher::Cipher;
use crate::generation::{ContentGenerator, DecryptedChild, GenerationRequest};

/// Drives the rollup of any layer against its child layer.
pub struct RollupOrchestrator {
    store: Arc<dyn SummaryStore>,
    cipher: Arc<dyn Cipher>,
    generator: Arc<dyn ContentGenerator>,
    clock: Arc<dyn Clock>,
    locator: GapLocator,
}

impl RollupOrchestrator {
    pub fn new(
        store: Arc<dyn SummaryStore>,
        cipher: Arc<dyn Cipher>,
        generator: Arc<dyn ContentGenerator>,
        clock: Arc<dyn Clock>,
        locator: GapLocator,
    ) -> Self {
        Self {
            store,
            cipher,
            generator,
            clock,
            locator,
        }
    }

    pub fn store(&self) -> &Arc<dyn SummaryStore> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Advance `layer` for `owner` by at most one period.
    ///
    /// Never fails across this boundary: every error becomes
    /// `RollupOutcome { created: false, error: Some(..) }`.
    pub async fn run_once(&self, layer: Layer, owner: &OwnerContext) -> RollupOutcome {
        let span = info_span!("rollup", owner_id = %owner.owner_id, layer = %layer);

        async {
            let start = Instant::now();
            metrics().rollup_runs.inc();
            let in_flight = metrics().rollups_in_flight.track();

            let outcome = match self.try_run(layer, owner).await {
                Ok(outcome) => outcome,
                Err(e) => RollupOutcome::failed(e.to_string(), None),
            };

            drop(in_flight);
            metrics()
                .rollup_latency_ms
                .observe(start.elapsed().as_millis() as u64);

            if outcome.created {
                metrics().summaries_created.inc();
            } else if let Some(ref e) = outcome.error {
                metrics().rollup_errors.inc();
                error!(error = %e, "Rollup pass failed");
            } else {
                metrics().rollups_skipped.inc();
            }

            outcome
        }
        .instrument(span)
        .await
    }

    async fn try_run(&self, layer: Layer, owner: &OwnerContext) -> Result<RollupOutcome> {
        let child_layer = layer.require_child()?;
        let tz = owner.time_zone()?;
        let owner_id = owner.owner_id.as_str();

        let (parents, children) = tokio::try_join!(
            self.store.list_summaries(owner_id, layer),
            self.store.list_summaries(owner_id, child_layer),
        )?;

        let buckets = group_children(children, layer, self.locator.windower());
        let now = self.clock.now();

        let gap = match self.locator.find_gap(&parents, buckets, layer, now, &tz) {
            GapSearch::Found(gap) => gap,
            GapSearch::NoChildren => {
                debug!("No child summaries yet");
                return Ok(RollupOutcome::skipped(SkipReason::NoGap, None));
            }
            GapSearch::Stalled { key } => {
                let period = self.locator.windower().window_for_date(key, layer);
                debug!(stalled_period = %period, "Adjacent period has no child summaries");
                return Ok(RollupOutcome::skipped(SkipReason::NoGap, Some(period)));
            }
            GapSearch::NotClosed { period } => {
                debug!(period = %period, "Adjacent period has not matured");
                return Ok(RollupOutcome::skipped(SkipReason::NoGap, Some(period)));
            }
            GapSearch::Exhausted => {
                warn!("Next period is outside the supported calendar range");
                return Ok(RollupOutcome::skipped(SkipReason::NoGap, None));
            }
        };

        let period = gap.period;
        Ok(self
            .roll_up(gap, owner)
            .await
            .unwrap_or_else(|e| RollupOutcome::failed(e.to_string(), Some(period))))
    }

    async fn roll_up(&self, gap: Gap, owner: &OwnerContext) -> Result<RollupOutcome> {
        let Gap { period, children } = gap;
        let owner_id = owner.owner_id.as_str();

        let readable = self.decrypt_children(owner_id, &children).await;
        if readable.is_empty() {
            info!(period = %period, children = children.len(), "No readable child summaries");
            return Ok(RollupOutcome::skipped(
                SkipReason::NoReadableChildren,
                Some(period),
            ));
        }

        let request = GenerationRequest {
            owner_id: owner_id.to_string(),
            layer: period.layer,
            period_start: period.start,
            period_end: period.end,
            children: readable,
            personalization: owner.personalization.clone(),
        };

        let started = Instant::now();
        let generated = self.generator.generate(&request).await?;
        metrics()
            .generation_latency_ms
            .observe(started.elapsed().as_millis() as u64);

        if generated.already_exists {
            return Ok(self.race_lost(period, "generation service"));
        }

        let (content, supplementary_content) = tokio::try_join!(
            self.encrypt(owner_id, &generated.content),
            async {
                match generated.supplementary_content.as_deref() {
                    Some(text) => self.encrypt(owner_id, text).await.map(Some),
                    None => Ok(None),
                }
            },
        )?;

        let summary = NewPeriodSummary {
            owner_id: owner_id.to_string(),
            layer: period.layer,
            period_start: period.start,
            period_end: period.end,
            content,
            supplementary_content,
            source_child_ids: request.children.iter().map(|child| child.id).collect(),
        };

        match self.store.persist_summary(summary).await? {
            PersistOutcome::Created(id) => {
                info!(
                    period = %period,
                    summary_id = %id,
                    children = request.children.len(),
                    "Created summary"
                );
                Ok(RollupOutcome::created(id, period))
            }
            PersistOutcome::AlreadyExists(_) => Ok(self.race_lost(period, "store")),
        }
    }

    /// Decrypt children concurrently, dropping the ones that fail.
    async fn decrypt_children(
        &self,
        owner_id: &str,
        children: &[rollup_core::ChildSummary],
    ) -> Vec<DecryptedChild> {
        let attempts = children.iter().map(|child| async move {
            let plaintext = self.cipher.decrypt(owner_id, &child.content).await;
            (child, plaintext)
        });

        join_all(attempts)
            .await
            .into_iter()
            .filter_map(|(child, plaintext)| match plaintext {
                Ok(content) => Some(DecryptedChild {
                    id: child.id,
                    period_start: child.period_start,
                    period_end: child.period_end,
                    content,
                }),
                Err(e) => {
                    metrics().decrypt_failures.inc();
                    warn!(child_id = %child.id, error = %e, "Skipping unreadable child summary");
                    None
                }
            })
            .collect()
    }

    async fn encrypt(&self, owner_id: &str, plaintext: &str) -> Result<String> {
        self.cipher
            .encrypt(owner_id, plaintext)
            .await
            .map_err(|e| match e {
                Error::Coded { .. } => e,
                other => Error::encrypt(other.to_string()),
            })
    }

    fn race_lost(&self, period: Period, reported_by: &str) -> RollupOutcome {
        metrics().race_losses.inc();
        info!(period = %period, reported_by, "Period already summarized by another writer");
        RollupOutcome::skipped(SkipReason::AlreadyExists, Some(period))
    }
}
