//! API routes.

pub mod health;
pub mod rollup;
pub mod summaries;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/rollups/:layer/trigger", post(rollup::trigger_handler))
        .route("/rollups/:layer/run", post(rollup::run_handler))
        .route("/summaries/:layer", get(summaries::list_handler))
        .route("/summaries/:layer/:id", get(summaries::get_handler))
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
