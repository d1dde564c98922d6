//! Summary records and rollup results.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::layer::Layer;
use crate::period::Period;

/// A persisted summary for one period of one layer.
///
/// Immutable once written. The next layer up references it by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub id: Uuid,
    pub owner_id: String,
    pub layer: Layer,
    /// First calendar day of the period
    pub period_start: NaiveDate,
    /// Last calendar day of the period
    pub period_end: NaiveDate,
    /// Opaque ciphertext
    pub content: String,
    /// Opaque ciphertext of the optional supplementary narrative
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplementary_content: Option<String>,
    /// Child summaries consumed to produce this one, in chronological order
    pub source_child_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Summaries of the child layer are the same record shape.
pub type ChildSummary = PeriodSummary;

impl PeriodSummary {
    pub fn period(&self) -> Period {
        Period {
            layer: self.layer,
            start: self.period_start,
            end: self.period_end,
        }
    }
}

/// Insert payload for a new summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPeriodSummary {
    pub owner_id: String,
    pub layer: Layer,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub content: String,
    pub supplementary_content: Option<String>,
    pub source_child_ids: Vec<Uuid>,
}

impl NewPeriodSummary {
    /// Materialize the record with a fresh id and creation time.
    pub fn into_summary(self, created_at: DateTime<Utc>) -> PeriodSummary {
        PeriodSummary {
            id: Uuid::new_v4(),
            owner_id: self.owner_id,
            layer: self.layer,
            period_start: self.period_start,
            period_end: self.period_end,
            content: self.content,
            supplementary_content: self.supplementary_content,
            source_child_ids: self.source_child_ids,
            created_at,
        }
    }
}

/// The one period eligible for rollup, with its child summaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gap {
    pub period: Period,
    pub children: Vec<ChildSummary>,
}

/// Why a rollup pass ended without creating anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No adjacent, closed period with child data
    NoGap,
    /// Every child in the gap failed decryption
    NoReadableChildren,
    /// A concurrent writer already summarized the period
    AlreadyExists,
    /// The invocation trigger ran too recently
    Throttled,
}

/// Result of one rollup pass. Never an error across the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollupOutcome {
    pub created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RollupOutcome {
    pub fn created(summary_id: Uuid, period: Period) -> Self {
        Self {
            created: true,
            summary_id: Some(summary_id),
            period: Some(period),
            skipped: None,
            error: None,
        }
    }

    pub fn skipped(reason: SkipReason, period: Option<Period>) -> Self {
        Self {
            created: false,
            summary_id: None,
            period,
            skipped: Some(reason),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>, period: Option<Period>) -> Self {
        Self {
            created: false,
            summary_id: None,
            period,
            skipped: None,
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
