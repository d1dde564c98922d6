//! Hierarchical Temporal Summary Rollup Engine
//!
//! Rolls per-day summaries up into weekly, monthly and yearly summaries:
//! - One summary per period per layer, never reprocessing rolled-up material
//! - Periods summarized only after they have definitively closed
//! - Passes triggered on access over HTTP, optionally by a background sweep

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use api::{router, AppState};
use rollup_core::SystemClock;
use summary_store::{
    health::{check_connection, init_schema},
    ClickHouseClient, ClickHouseSummaryStore, MemorySummaryStore, StoreBackend, StoreConfig,
    SummaryStore,
};
use telemetry::{health, init_tracing_from_env};
use worker::{
    EngineConfig, GenerationConfig, HttpContentGenerator, PassthroughCipher, RollupOrchestrator,
    RollupScheduler, SchedulerConfig,
};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    #[serde(default)]
    store: StoreConfig,

    #[serde(default)]
    generation: GenerationConfig,

    #[serde(default)]
    engine: EngineConfig,

    #[serde(default)]
    scheduler: SchedulerConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            store: StoreConfig::default(),
            generation: GenerationConfig::default(),
            engine: EngineConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting rollup engine v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;

    info!(
        store = ?config.store.backend,
        generation_url = %config.generation.url,
        trigger_interval_secs = config.engine.trigger_interval_secs,
        week_start = %config.engine.week_start,
        buffer_periods = config.engine.maturation_buffer_periods,
        "Loaded configuration"
    );

    let store = build_store(&config.store).await;

    let generator = Arc::new(
        HttpContentGenerator::new(&config.generation)
            .context("Failed to create generation client")?,
    );
    // Assume reachable until the first call says otherwise.
    health().generator.set_healthy();

    let orchestrator = Arc::new(RollupOrchestrator::new(
        store,
        Arc::new(PassthroughCipher),
        generator,
        Arc::new(SystemClock),
        config.engine.locator(),
    ));

    let scheduler = Arc::new(RollupScheduler::new(
        config.scheduler.clone(),
        orchestrator.clone(),
    ));
    let _sweep_handles = scheduler.start();

    let state = AppState::new(orchestrator, &config.engine);
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

/// Build the configured summary store.
async fn build_store(config: &StoreConfig) -> Arc<dyn SummaryStore> {
    match config.backend {
        StoreBackend::Memory => {
            warn!("Using in-memory summary store; summaries are lost on restart");
            health().store.set_healthy();
            Arc::new(MemorySummaryStore::new())
        }
        StoreBackend::Clickhouse => {
            let client = Arc::new(ClickHouseClient::new(config.clickhouse.clone()));

            if check_connection(&client).await {
                info!("ClickHouse connection: healthy");
                if let Err(e) = init_schema(&client).await {
                    // Table may already exist with restricted DDL rights.
                    error!("Failed to initialize summary schema: {}", e);
                }
            } else {
                error!("ClickHouse connection: unhealthy");
            }

            Arc::new(ClickHouseSummaryStore::new(client))
        }
    }
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("ROLLUP")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // The config crate's nested parsing doesn't work reliably with underscored field names
    if let Ok(url) = std::env::var("ROLLUP_CLICKHOUSE_URL") {
        config.store.clickhouse.url = url;
    }
    if let Ok(database) = std::env::var("ROLLUP_CLICKHOUSE_DATABASE") {
        config.store.clickhouse.database = database;
    }
    if let Ok(username) = std::env::var("ROLLUP_CLICKHOUSE_USERNAME") {
        config.store.clickhouse.username = Some(username);
    }
    if let Ok(password) = std::env::var("ROLLUP_CLICKHOUSE_PASSWORD") {
        config.store.clickhouse.password = Some(password);
    }
    if let Ok(url) = std::env::var("ROLLUP_GENERATION_URL") {
        config.generation.url = url;
    }
    if let Ok(key) = std::env::var("ROLLUP_GENERATION_API_KEY") {
        config.generation.api_key = Some(key);
    }

    Ok(config)
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
