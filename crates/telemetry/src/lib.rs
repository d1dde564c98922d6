//! Internal telemetry for the rollup engine.
//!
//! Metrics stay in-process and are exposed through the health endpoint and
//! periodic log lines; there is no external metrics backend.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
