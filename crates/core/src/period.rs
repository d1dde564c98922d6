//! Period windowing.
//!
//! A period is stored at day granularity: `start` is the first calendar day and
//! `end` the last calendar day, both in the owner's time zone. As instants the
//! period covers `[start 00:00, end_exclusive 00:00)` local time.
//!
//! Boundaries are always derived from calendar components of a local date.
//! Instants are projected into the owner's zone before anything else, so a
//! late-evening UTC write never lands in the neighbouring day.

use chrono::{
    DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc, Weekday,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::layer::Layer;

/// A calendar period at one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub layer: Layer,
    /// First calendar day.
    pub start: NaiveDate,
    /// Last calendar day (inclusive).
    pub end: NaiveDate,
}

impl Period {
    /// The first day after the period.
    pub fn end_exclusive(&self) -> NaiveDate {
        self.end.succ_opt().unwrap_or(NaiveDate::MAX)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Local midnight at the start of the period, as an instant.
    pub fn start_instant<Tz: TimeZone>(&self, tz: &Tz) -> DateTime<Utc> {
        local_midnight(tz, self.start)
    }

    /// Local midnight after the last day of the period, as an instant.
    pub fn end_instant<Tz: TimeZone>(&self, tz: &Tz) -> DateTime<Utc> {
        local_midnight(tz, self.end_exclusive())
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}..{}", self.layer, self.start, self.end)
    }
}

/// Resolve local midnight of `date` in `tz` to a UTC instant.
///
/// Zones that skip midnight on a DST transition resolve to the first
/// representable local time after it.
pub fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..=2)
        .find_map(|hours| {
            tz.from_local_datetime(&(midnight + Duration::hours(hours)))
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
        })
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// Move `date` forward by `periods` whole periods of `layer`, by calendar.
///
/// `None` when the result leaves the representable calendar.
pub fn advance(date: NaiveDate, layer: Layer, periods: u32) -> Option<NaiveDate> {
    match layer {
        Layer::Daily => date.checked_add_days(Days::new(periods as u64)),
        Layer::Weekly => date.checked_add_days(Days::new(7 * periods as u64)),
        Layer::Monthly => date.checked_add_months(Months::new(periods)),
        Layer::Yearly => date.checked_add_months(Months::new(periods.checked_mul(12)?)),
    }
}

/// Computes period boundaries for every layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindower {
    week_start: Weekday,
}

impl Default for PeriodWindower {
    fn default() -> Self {
        Self::new(Weekday::Mon)
    }
}

impl PeriodWindower {
    pub fn new(week_start: Weekday) -> Self {
        Self { week_start }
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    /// The period of `layer` containing the instant, as seen in `tz`.
    pub fn window_for<Tz: TimeZone>(
        &self,
        instant: &DateTime<Utc>,
        layer: Layer,
        tz: &Tz,
    ) -> Period {
        let local = instant.with_timezone(tz).date_naive();
        self.window_for_date(local, layer)
    }

    /// The period of `layer` containing the local calendar date.
    pub fn window_for_date(&self, date: NaiveDate, layer: Layer) -> Period {
        let (start, end) = match layer {
            Layer::Daily => (date, date),
            Layer::Weekly => {
                let back = (7 + date.weekday().num_days_from_monday()
                    - self.week_start.num_days_from_monday())
                    % 7;
                let start = date
                    .checked_sub_days(Days::new(back as u64))
                    .unwrap_or(NaiveDate::MIN);
                let end = start.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX);
                (start, end)
            }
            Layer::Monthly => {
                let start = date.with_day(1).unwrap_or(date);
                let end = start
                    .checked_add_months(Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .unwrap_or(NaiveDate::MAX);
                (start, end)
            }
            Layer::Yearly => {
                let start = NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date);
                let end = NaiveDate::from_ymd_opt(date.year(), 12, 31).unwrap_or(NaiveDate::MAX);
                (start, end)
            }
        };

        Period { layer, start, end }
    }

    /// Bucket key for a date: the start of its enclosing period.
    pub fn key_for(&self, date: NaiveDate, layer: Layer) -> NaiveDate {
        self.window_for_date(date, layer).start
    }

    /// Move `date` forward by `periods` whole periods of `layer`.
    ///
    /// Months and years step by calendar, never by a fixed day count.
    pub fn step(&self, date: NaiveDate, layer: Layer, periods: u32) -> Option<NaiveDate> {
        advance(date, layer, periods)
    }

    /// The period immediately after `period`.
    pub fn next_period(&self, period: &Period) -> Option<Period> {
        self.step(period.start, period.layer, 1)
            .map(|date| self.window_for_date(date, period.layer))
    }
}
