//! Worker configuration.

use chrono::Weekday;
use rollup_core::{GapLocator, MaturationPolicy, OwnerContext, PeriodWindower};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Rollup engine policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum seconds between two trigger-driven passes for one owner and layer
    #[serde(default = "default_trigger_interval_secs")]
    pub trigger_interval_secs: u64,
    /// First day of the week for weekly periods
    #[serde(default = "default_week_start")]
    pub week_start: Weekday,
    /// Whole periods to wait after a period ends before summarizing it
    #[serde(default = "default_buffer_periods")]
    pub maturation_buffer_periods: u32,
}

fn default_trigger_interval_secs() -> u64 {
    300
}

fn default_week_start() -> Weekday {
    Weekday::Mon
}

fn default_buffer_periods() -> u32 {
    rollup_core::DEFAULT_BUFFER_PERIODS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trigger_interval_secs: default_trigger_interval_secs(),
            week_start: default_week_start(),
            maturation_buffer_periods: default_buffer_periods(),
        }
    }
}

impl EngineConfig {
    pub fn trigger_interval(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.trigger_interval_secs as i64)
    }

    pub fn locator(&self) -> GapLocator {
        GapLocator::new(
            PeriodWindower::new(self.week_start),
            MaturationPolicy::new(self.maturation_buffer_periods),
        )
    }
}

/// Remote generation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL, e.g. "http://summarizer:8090"
    #[serde(default = "default_generation_url")]
    pub url: String,
    /// Request timeout in seconds
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
    /// Bearer token (optional)
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_generation_url() -> String {
    "http://localhost:8090".to_string()
}

fn default_generation_timeout_secs() -> u64 {
    60
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            url: default_generation_url(),
            timeout_secs: default_generation_timeout_secs(),
            api_key: None,
        }
    }
}

/// Background sweep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Off by default: rollups normally run on access via the trigger endpoint
    #[serde(default)]
    pub enabled: bool,
    /// Seconds between sweeps
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Owners to sweep. Each carries a fixed UTC offset; for owners in a
    /// daylight-saving zone pick the offset whose boundaries matter most, as
    /// it is not adjusted seasonally.
    #[serde(default)]
    pub owners: Vec<OwnerContext>,
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sweep_interval_secs: default_sweep_interval_secs(),
            owners: Vec::new(),
        }
    }
}

impl SchedulerConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
