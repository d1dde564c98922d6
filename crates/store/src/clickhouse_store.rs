//! ClickHouse-backed summary store.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use clickhouse::Row;
use rollup_core::{Error, Layer, NewPeriodSummary, PeriodSummary, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use telemetry::health;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::client::ClickHouseClient;
use crate::schema::SUMMARIES_TABLE;
use crate::store::{PersistOutcome, SummaryStore};

const SELECT_PARTITION: &str = "SELECT ?fields FROM period_summaries FINAL \
     WHERE owner_id = ? AND layer = ? ORDER BY period_start";

const SELECT_PERIOD: &str = "SELECT ?fields FROM period_summaries FINAL \
     WHERE owner_id = ? AND layer = ? AND period_start = ? LIMIT 1";

/// Row for the period_summaries table.
#[derive(Debug, Clone, Row, Serialize, Deserialize)]
pub struct SummaryRow {
    pub id: String,
    pub owner_id: String,
    pub layer: String,
    pub period_start: String,
    pub period_end: String,
    pub content: String,
    pub supplementary_content: Option<String>,
    pub source_child_ids: Vec<String>,
    /// Milliseconds since epoch (DateTime64(3))
    pub created_at: i64,
    /// Replacing version, see [`row_version`]
    pub version: u64,
}

/// Version for a row created at `created_at_millis`.
///
/// ReplacingMergeTree keeps the highest version per key, so inverting the
/// creation time makes the earliest writer the one that survives.
pub fn row_version(created_at_millis: i64) -> u64 {
    u64::MAX - created_at_millis.max(0) as u64
}

/// Insert deduplication token: one per (owner, layer, period start).
pub fn dedup_token(owner_id: &str, layer: Layer, period_start: NaiveDate) -> String {
    format!("{}:{}:{}", owner_id, layer, period_start)
}

/// Decide a persist from the row served back after inserting `inserted`.
///
/// Only a read-back of our own id counts as created. A missing row means the
/// insert is not visible yet; ours is the only candidate, so it stands.
pub fn resolve_persist(inserted: Uuid, served: Option<&PeriodSummary>) -> PersistOutcome {
    match served {
        Some(winner) if winner.id != inserted => PersistOutcome::AlreadyExists(winner.id),
        _ => PersistOutcome::Created(inserted),
    }
}

impl From<&PeriodSummary> for SummaryRow {
    fn from(summary: &PeriodSummary) -> Self {
        Self {
            id: summary.id.to_string(),
            owner_id: summary.owner_id.clone(),
            layer: summary.layer.as_str().to_string(),
            period_start: summary.period_start.to_string(),
            period_end: summary.period_end.to_string(),
            content: summary.content.clone(),
            supplementary_content: summary.supplementary_content.clone(),
            source_child_ids: summary
                .source_child_ids
                .iter()
                .map(|id| id.to_string())
                .collect(),
            created_at: summary.created_at.timestamp_millis(),
            version: row_version(summary.created_at.timestamp_millis()),
        }
    }
}

impl TryFrom<SummaryRow> for PeriodSummary {
    type Error = Error;

    fn try_from(row: SummaryRow) -> Result<Self> {
        let parse_id = |raw: &str| {
            Uuid::parse_str(raw).map_err(|e| Error::store(format!("bad uuid {:?}: {}", raw, e)))
        };
        let parse_date = |raw: &str| {
            raw.parse::<NaiveDate>()
                .map_err(|e| Error::store(format!("bad date {:?}: {}", raw, e)))
        };

        Ok(PeriodSummary {
            id: parse_id(&row.id)?,
            layer: row.layer.parse::<Layer>()?,
            period_start: parse_date(&row.period_start)?,
            period_end: parse_date(&row.period_end)?,
            source_child_ids: row
                .source_child_ids
                .iter()
                .map(|id| parse_id(id))
                .collect::<Result<Vec<_>>>()?,
            created_at: DateTime::from_timestamp_millis(row.created_at)
                .ok_or_else(|| Error::store(format!("bad created_at: {}", row.created_at)))?,
            owner_id: row.owner_id,
            content: row.content,
            supplementary_content: row.supplementary_content,
        })
    }
}

/// Summary store on a ClickHouse `ReplacingMergeTree`.
///
/// ClickHouse has no unique constraint, so `persist_summary` checks for an
/// existing row, inserts, and then reads the period back. Rows are versioned
/// so the earliest insert wins; if a concurrent writer's row is the one
/// served, the insert is reported as `AlreadyExists` with the winner's id.
#[derive(Clone)]
pub struct ClickHouseSummaryStore {
    client: Arc<ClickHouseClient>,
}

impl ClickHouseSummaryStore {
    pub fn new(client: Arc<ClickHouseClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ClickHouseClient {
        &self.client
    }

    /// Run a query future under the configured timeout, tracking health.
    async fn timed<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, clickhouse::error::Error>>,
    {
        match tokio::time::timeout(self.client.timeout(), fut).await {
            Ok(Ok(value)) => {
                health().store.set_healthy();
                Ok(value)
            }
            Ok(Err(e)) => {
                warn!(operation = what, error = %e, "ClickHouse operation failed");
                health().store.set_unhealthy(e.to_string());
                Err(Error::store(format!("{} failed: {}", what, e)))
            }
            Err(_) => {
                warn!(operation = what, "ClickHouse operation timed out");
                health().store.set_unhealthy(format!("{} timed out", what));
                Err(Error::store(format!("{} timed out", what)))
            }
        }
    }

    async fn find_period(
        &self,
        owner_id: &str,
        layer: Layer,
        period_start: NaiveDate,
    ) -> Result<Option<SummaryRow>> {
        let query = self
            .client
            .inner()
            .query(SELECT_PERIOD)
            .bind(owner_id)
            .bind(layer.as_str())
            .bind(period_start.to_string());

        self.timed("find period", query.fetch_optional::<SummaryRow>())
            .await
    }

    async fn insert_summary(&self, summary: &PeriodSummary) -> Result<()> {
        let row = SummaryRow::from(summary);
        let token = dedup_token(&summary.owner_id, summary.layer, summary.period_start);

        let mut insert = self
            .client
            .inner()
            .clone()
            .with_option("insert_deduplication_token", token)
            .insert::<SummaryRow>(SUMMARIES_TABLE)
            .map_err(|e| Error::store(format!("Insert error: {}", e)))?;

        self.timed("write summary", insert.write(&row)).await?;
        self.timed("commit summary", insert.end()).await
    }
}

#[async_trait]
impl SummaryStore for ClickHouseSummaryStore {
    async fn list_summaries(&self, owner_id: &str, layer: Layer) -> Result<Vec<PeriodSummary>> {
        let query = self
            .client
            .inner()
            .query(SELECT_PARTITION)
            .bind(owner_id)
            .bind(layer.as_str());

        let rows = self
            .timed("list summaries", query.fetch_all::<SummaryRow>())
            .await?;

        rows.into_iter().map(PeriodSummary::try_from).collect()
    }

    async fn persist_summary(&self, summary: NewPeriodSummary) -> Result<PersistOutcome> {
        let start = Instant::now();
        let (owner_id, layer, period_start) =
            (summary.owner_id.clone(), summary.layer, summary.period_start);

        if let Some(existing) = self.find_period(&owner_id, layer, period_start).await? {
            let id = PeriodSummary::try_from(existing)?.id;
            return Ok(PersistOutcome::AlreadyExists(id));
        }

        let record = summary.into_summary(chrono::Utc::now());
        self.insert_summary(&record).await?;

        let served = self
            .find_period(&owner_id, layer, period_start)
            .await?
            .map(PeriodSummary::try_from)
            .transpose()?;

        debug!(
            owner_id = %owner_id,
            layer = %layer,
            period_start = %period_start,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Persisted summary"
        );

        Ok(resolve_persist(record.id, served.as_ref()))
    }

    fn is_healthy(&self) -> bool {
        health().store.is_healthy()
    }
}
