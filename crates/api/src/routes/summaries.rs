//! Summary listing.

use axum::{
    extract::{Path, State},
    Json,
};
use rollup_core::{Layer, PeriodSummary};
use uuid::Uuid;

use crate::extractors::Owner;
use crate::response::{ApiError, SummaryListResponse};
use crate::state::AppState;

/// GET /summaries/:layer - The owner's summaries for a layer, oldest first.
///
/// Content stays ciphertext; decryption is the client's business.
pub async fn list_handler(
    State(state): State<AppState>,
    Path(layer): Path<String>,
    Owner(owner): Owner,
) -> Result<Json<SummaryListResponse>, ApiError> {
    let layer = layer.parse::<Layer>()?;
    let summaries = state.store().list_summaries(&owner.owner_id, layer).await?;

    Ok(Json(SummaryListResponse {
        owner_id: owner.owner_id,
        layer,
        summaries,
    }))
}

/// GET /summaries/:layer/:id - One summary of the owner.
pub async fn get_handler(
    State(state): State<AppState>,
    Path((layer, id)): Path<(String, String)>,
    Owner(owner): Owner,
) -> Result<Json<PeriodSummary>, ApiError> {
    let layer = layer.parse::<Layer>()?;
    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::bad_request(format!("invalid summary id: {}", id)))?;

    state
        .store()
        .get_summary(&owner.owner_id, layer, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("no {} summary {}", layer, id)))
}
