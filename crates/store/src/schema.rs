//! ClickHouse table schema for period summaries.
//!
//! - One table for all layers, `layer` as LowCardinality
//! - ReplacingMergeTree keyed on (owner_id, layer, period_start) so racing
//!   inserts collapse to one row; reads use FINAL, and a writer confirms its
//!   insert by reading the period back
//! - `version` falls as `created_at` rises, so the earliest write survives a
//!   merge and a summary never changes once served
//! - Inserts carry a deduplication token per period; with the non-replicated
//!   deduplication window a second insert for the same period is dropped
//! - Dates stored as ISO `YYYY-MM-DD` strings, which sort chronologically

/// Table name, relative to the configured database.
pub const SUMMARIES_TABLE: &str = "period_summaries";

/// SQL for creating the summaries table.
pub const CREATE_SUMMARIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS period_summaries (
    id String,
    owner_id String,
    layer LowCardinality(String),
    period_start String,
    period_end String,

    -- Opaque ciphertext
    content String,
    supplementary_content Nullable(String),

    -- Child summary ids consumed, chronological
    source_child_ids Array(String),

    created_at DateTime64(3),

    -- u64::MAX - created_at millis: earliest row wins
    version UInt64
)
ENGINE = ReplacingMergeTree(version)
ORDER BY (owner_id, layer, period_start)
SETTINGS index_granularity = 8192, non_replicated_deduplication_window = 10000
"#;

/// Returns all DDL statements in execution order.
pub fn all_tables() -> Vec<&'static str> {
    vec![CREATE_SUMMARIES_TABLE]
}
