//! The persistence collaborator seen by the rollup orchestrator.

use async_trait::async_trait;
use rollup_core::{Layer, NewPeriodSummary, PeriodSummary, Result};
use uuid::Uuid;

/// Result of persisting a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// New row written with this id.
    Created(Uuid),
    /// A summary for the same (owner, layer, period start) already exists.
    AlreadyExists(Uuid),
}

impl PersistOutcome {
    pub fn id(&self) -> Uuid {
        match self {
            Self::Created(id) | Self::AlreadyExists(id) => *id,
        }
    }
}

/// Summary persistence.
///
/// Implementations must enforce uniqueness of (owner, layer, period start)
/// and report a duplicate as `AlreadyExists`, never as an error.
#[async_trait]
pub trait SummaryStore: Send + Sync {
    /// All summaries of `layer` for the owner, ordered by period start.
    async fn list_summaries(&self, owner_id: &str, layer: Layer) -> Result<Vec<PeriodSummary>>;

    /// Persist a new summary.
    async fn persist_summary(&self, summary: NewPeriodSummary) -> Result<PersistOutcome>;

    /// Fetch one summary by id.
    async fn get_summary(
        &self,
        owner_id: &str,
        layer: Layer,
        id: Uuid,
    ) -> Result<Option<PeriodSummary>> {
        Ok(self
            .list_summaries(owner_id, layer)
            .await?
            .into_iter()
            .find(|summary| summary.id == id))
    }

    /// Whether the store is currently usable.
    fn is_healthy(&self) -> bool {
        true
    }
}
