//! Store health checks and schema bootstrap.

use rollup_core::{Error, Result};
use telemetry::health;
use tracing::{debug, error, info};

use crate::client::ClickHouseClient;
use crate::schema::all_tables;

/// Probe ClickHouse and record the result in the health registry.
pub async fn check_connection(client: &ClickHouseClient) -> bool {
    match client.inner().query("SELECT 1").fetch_one::<u8>().await {
        Ok(_) => {
            debug!("ClickHouse connection healthy");
            health().store.set_healthy();
            true
        }
        Err(e) => {
            error!(error = %e, "ClickHouse health check failed");
            health().store.set_unhealthy(format!("ClickHouse unreachable: {}", e));
            false
        }
    }
}

/// Create the summaries table if it does not exist.
pub async fn init_schema(client: &ClickHouseClient) -> Result<()> {
    for ddl in all_tables() {
        client
            .inner()
            .query(ddl)
            .execute()
            .await
            .map_err(|e| Error::store(format!("Failed to execute DDL: {}", e)))?;
    }

    info!(database = %client.config().database, "Summary schema initialized");
    Ok(())
}
