//! Maturation policy: when is a period permanently closed.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::period::{advance, local_midnight, Period};

/// Default number of additional whole periods to wait after a period ends.
pub const DEFAULT_BUFFER_PERIODS: u32 = 1;

/// Decides whether child data for a period can still arrive.
///
/// A period closes `buffer_periods` whole periods of its own layer after it
/// ends: a week one week after its last day, a month one calendar month
/// after, a year one year after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaturationPolicy {
    pub buffer_periods: u32,
}

impl Default for MaturationPolicy {
    fn default() -> Self {
        Self {
            buffer_periods: DEFAULT_BUFFER_PERIODS,
        }
    }
}

impl MaturationPolicy {
    pub fn new(buffer_periods: u32) -> Self {
        Self { buffer_periods }
    }

    /// The instant from which the period counts as closed.
    ///
    /// `None` when the deadline falls outside the representable calendar.
    pub fn closes_at<Tz: TimeZone>(&self, period: &Period, tz: &Tz) -> Option<DateTime<Utc>> {
        advance(period.end_exclusive(), period.layer, self.buffer_periods)
            .map(|deadline| local_midnight(tz, deadline))
    }

    /// True once `now >= period end + buffer`.
    pub fn is_closed<Tz: TimeZone>(&self, period: &Period, now: DateTime<Utc>, tz: &Tz) -> bool {
        self.closes_at(period, tz)
            .map(|deadline| now >= deadline)
            .unwrap_or(false)
    }
}
