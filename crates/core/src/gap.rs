//! Gap location: the single next period a layer may roll up.
//!
//! The locator only ever proposes the period directly after the latest
//! existing summary (or the earliest bucket when the layer is empty). It never
//! searches further ahead, so a period with no child data stalls the layer at
//! that key.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::grouper::ChildBuckets;
use crate::layer::Layer;
use crate::maturation::MaturationPolicy;
use crate::period::{Period, PeriodWindower};
use crate::summary::{Gap, PeriodSummary};

/// Result of a gap search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GapSearch {
    /// Eligible period with its children.
    Found(Gap),
    /// No existing summaries and no child data at all.
    NoChildren,
    /// The adjacent period has no child bucket.
    Stalled { key: NaiveDate },
    /// The adjacent period has data but has not matured yet.
    NotClosed { period: Period },
    /// The next period would fall outside the representable calendar.
    Exhausted,
}

impl GapSearch {
    pub fn into_gap(self) -> Option<Gap> {
        match self {
            Self::Found(gap) => Some(gap),
            _ => None,
        }
    }
}

/// Finds at most one parent period lacking a summary but having child data.
#[derive(Debug, Clone, Copy, Default)]
pub struct GapLocator {
    windower: PeriodWindower,
    policy: MaturationPolicy,
}

impl GapLocator {
    pub fn new(windower: PeriodWindower, policy: MaturationPolicy) -> Self {
        Self { windower, policy }
    }

    pub fn windower(&self) -> &PeriodWindower {
        &self.windower
    }

    pub fn policy(&self) -> &MaturationPolicy {
        &self.policy
    }

    /// Locate the next gap for `layer`.
    ///
    /// `existing` are the layer's own summaries in any order; `buckets` the
    /// grouped child summaries. The matching bucket is moved out of `buckets`.
    pub fn find_gap<Tz: TimeZone>(
        &self,
        existing: &[PeriodSummary],
        mut buckets: ChildBuckets,
        layer: Layer,
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> GapSearch {
        let latest = existing.iter().map(|summary| summary.period_start).max();

        let key = match latest {
            None => match buckets.keys().next() {
                Some(earliest) => *earliest,
                None => return GapSearch::NoChildren,
            },
            Some(latest_start) => match self.windower.step(latest_start, layer, 1) {
                Some(next) => self.windower.key_for(next, layer),
                None => return GapSearch::Exhausted,
            },
        };

        let Some(children) = buckets.remove(&key) else {
            return GapSearch::Stalled { key };
        };

        let period = self.windower.window_for_date(key, layer);
        if !self.policy.is_closed(&period, now, tz) {
            return GapSearch::NotClosed { period };
        }

        GapSearch::Found(Gap { period, children })
    }
}
