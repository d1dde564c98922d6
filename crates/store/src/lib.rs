//! Summary persistence for the rollup engine.
//!
//! The engine treats the store as the authority on uniqueness: one summary
//! per (owner, layer, period start). Both backends report a duplicate insert
//! as `PersistOutcome::AlreadyExists` instead of an error.

pub mod client;
pub mod clickhouse_store;
pub mod config;
pub mod health;
pub mod memory;
pub mod schema;
pub mod store;

pub use client::*;
pub use clickhouse_store::ClickHouseSummaryStore;
pub use config::*;
pub use memory::MemorySummaryStore;
pub use store::*;
