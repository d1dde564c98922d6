//! Internal metrics collection.
//!
//! Counters are process-wide and cumulative. They are reported by the health
//! endpoint and logged by the sweep scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonically increasing counter.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec(&self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }

    /// Increment now, decrement when the guard drops.
    pub fn track(&self) -> GaugeGuard<'_> {
        self.inc();
        GaugeGuard(self)
    }
}

/// Holds one unit of a gauge; released on drop, including when the owning
/// future is abandoned mid-await.
#[must_use]
#[derive(Debug)]
pub struct GaugeGuard<'a>(&'a Gauge);

impl Drop for GaugeGuard<'_> {
    fn drop(&mut self) {
        self.0.dec();
    }
}

/// Latency histogram in milliseconds.
///
/// Generation calls are slow remote round trips, so the buckets reach a minute.
#[derive(Debug)]
pub struct Histogram {
    buckets: [AtomicU64; 10],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 10] = [10, 50, 100, 250, 500, 1000, 2500, 5000, 15000, 60000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let idx = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(Self::BUCKET_BOUNDS.len() - 1);
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Returns (upper bound, count) per bucket.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for the rollup engine.
#[derive(Debug, Default)]
pub struct Metrics {
    // Rollup passes
    pub rollup_runs: Counter,
    pub summaries_created: Counter,
    pub rollups_skipped: Counter,
    pub rollup_errors: Counter,
    pub race_losses: Counter,

    // Per-child failures
    pub decrypt_failures: Counter,

    // Trigger throttle
    pub triggers_fired: Counter,
    pub triggers_throttled: Counter,

    // Latency histograms
    pub rollup_latency_ms: Histogram,
    pub generation_latency_ms: Histogram,

    // Gauges
    pub rollups_in_flight: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub rollup_runs: u64,
    pub summaries_created: u64,
    pub rollups_skipped: u64,
    pub rollup_errors: u64,
    pub race_losses: u64,
    pub decrypt_failures: u64,
    pub triggers_fired: u64,
    pub triggers_throttled: u64,
    pub rollup_latency_mean_ms: f64,
    pub generation_latency_mean_ms: f64,
    pub rollups_in_flight: u64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            rollup_runs: self.rollup_runs.get(),
            summaries_created: self.summaries_created.get(),
            rollups_skipped: self.rollups_skipped.get(),
            rollup_errors: self.rollup_errors.get(),
            race_losses: self.race_losses.get(),
            decrypt_failures: self.decrypt_failures.get(),
            triggers_fired: self.triggers_fired.get(),
            triggers_throttled: self.triggers_throttled.get(),
            rollup_latency_mean_ms: self.rollup_latency_ms.mean(),
            generation_latency_mean_ms: self.generation_latency_ms.mean(),
            rollups_in_flight: self.rollups_in_flight.get(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
