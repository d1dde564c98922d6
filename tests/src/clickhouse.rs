//! ClickHouse connection for store tests.
//!
//! Set `ROLLUP_TEST_CLICKHOUSE_URL` (plus optional `_DB`, `_USER`,
//! `_PASSWORD`) to run the ClickHouse tests; without it they return early.

use std::sync::Arc;
use summary_store::{health::init_schema, ClickHouseClient, ClickHouseConfig};

/// Connection settings from the environment, if configured.
pub fn config_from_env() -> Option<ClickHouseConfig> {
    let url = std::env::var("ROLLUP_TEST_CLICKHOUSE_URL")
        .ok()
        .filter(|v| !v.trim().is_empty())?;

    Some(ClickHouseConfig {
        url,
        database: std::env::var("ROLLUP_TEST_CLICKHOUSE_DB")
            .unwrap_or_else(|_| "default".to_string()),
        username: std::env::var("ROLLUP_TEST_CLICKHOUSE_USER").ok(),
        password: std::env::var("ROLLUP_TEST_CLICKHOUSE_PASSWORD").ok(),
        ..ClickHouseConfig::default()
    })
}

/// Client with the summaries table created, or None when not configured.
pub async fn client_from_env() -> Option<Arc<ClickHouseClient>> {
    let client = Arc::new(ClickHouseClient::new(config_from_env()?));
    init_schema(&client)
        .await
        .expect("Failed to initialize summary schema");
    Some(client)
}
