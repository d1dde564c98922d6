//! In-memory summary store.

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use rollup_core::{Clock, Layer, NewPeriodSummary, PeriodSummary, Result, SystemClock};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

use crate::store::{PersistOutcome, SummaryStore};

type Partition = BTreeMap<NaiveDate, PeriodSummary>;

/// Process-local store keyed by (owner, layer), then period start.
///
/// The uniqueness check and the insert happen under one write lock, so
/// concurrent persists of the same period resolve to exactly one row.
pub struct MemorySummaryStore {
    partitions: RwLock<HashMap<(String, Layer), Partition>>,
    clock: Arc<dyn Clock>,
}

impl MemorySummaryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Stamp `created_at` from the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            partitions: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Insert a fully-formed summary, e.g. a daily summary produced upstream.
    ///
    /// Returns false when the period is already taken.
    pub fn seed(&self, summary: PeriodSummary) -> bool {
        let mut partitions = self.partitions.write();
        let partition = partitions
            .entry((summary.owner_id.clone(), summary.layer))
            .or_default();
        if partition.contains_key(&summary.period_start) {
            return false;
        }
        partition.insert(summary.period_start, summary);
        true
    }

    /// Total summaries of one layer for an owner.
    pub fn count(&self, owner_id: &str, layer: Layer) -> usize {
        self.partitions
            .read()
            .get(&(owner_id.to_string(), layer))
            .map(|partition| partition.len())
            .unwrap_or(0)
    }
}

impl Default for MemorySummaryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SummaryStore for MemorySummaryStore {
    async fn list_summaries(&self, owner_id: &str, layer: Layer) -> Result<Vec<PeriodSummary>> {
        Ok(self
            .partitions
            .read()
            .get(&(owner_id.to_string(), layer))
            .map(|partition| partition.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn persist_summary(&self, summary: NewPeriodSummary) -> Result<PersistOutcome> {
        let mut partitions = self.partitions.write();
        let partition = partitions
            .entry((summary.owner_id.clone(), summary.layer))
            .or_default();

        if let Some(existing) = partition.get(&summary.period_start) {
            debug!(
                owner_id = %summary.owner_id,
                layer = %summary.layer,
                period_start = %summary.period_start,
                existing_id = %existing.id,
                "Summary already exists"
            );
            return Ok(PersistOutcome::AlreadyExists(existing.id));
        }

        let record = summary.into_summary(self.clock.now());
        let id = record.id;
        partition.insert(record.period_start, record);
        Ok(PersistOutcome::Created(id))
    }
}
