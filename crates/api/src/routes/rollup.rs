//! Rollup endpoints.
//!
//! Both answer 200 with a `RollupOutcome`: a failed pass is reported in the
//! body (`error`), not as an HTTP error. Only malformed requests get 4xx.

use axum::{
    extract::{Path, State},
    Json,
};
use rollup_core::{Layer, RollupOutcome};
use tracing::debug;

use crate::extractors::Owner;
use crate::response::ApiError;
use crate::state::AppState;

/// Optional request body.
#[derive(Debug, Default, serde::Deserialize)]
pub struct RollupRequest {
    /// Forwarded to the generation service
    #[serde(default)]
    pub personalization: serde_json::Value,
}

/// POST /rollups/:layer/trigger - Opportunistic, throttled per owner and layer.
pub async fn trigger_handler(
    State(state): State<AppState>,
    Path(layer): Path<String>,
    Owner(owner): Owner,
    body: Option<Json<RollupRequest>>,
) -> Result<Json<RollupOutcome>, ApiError> {
    let layer = layer.parse::<Layer>()?;
    layer.require_child()?;
    let owner = with_personalization(owner, body);

    let trigger = state.triggers.get(&owner.owner_id, layer).await;
    let outcome = trigger.fire(&owner).await;

    debug!(owner_id = %owner.owner_id, layer = %layer, created = outcome.created, "Trigger handled");
    Ok(Json(outcome))
}

/// POST /rollups/:layer/run - On-demand pass, bypasses the throttle.
pub async fn run_handler(
    State(state): State<AppState>,
    Path(layer): Path<String>,
    Owner(owner): Owner,
    body: Option<Json<RollupRequest>>,
) -> Result<Json<RollupOutcome>, ApiError> {
    let layer = layer.parse::<Layer>()?;
    layer.require_child()?;
    let owner = with_personalization(owner, body);

    Ok(Json(state.orchestrator.run_once(layer, &owner).await))
}

fn with_personalization(
    owner: rollup_core::OwnerContext,
    body: Option<Json<RollupRequest>>,
) -> rollup_core::OwnerContext {
    match body {
        Some(Json(request)) => owner.with_personalization(request.personalization),
        None => owner,
    }
}
