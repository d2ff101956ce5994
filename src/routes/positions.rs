use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{PositionView, RecomputeSummary};
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_positions))
        .route("/recompute", post(recompute_positions))
}

pub async fn list_positions(
    State(state): State<AppState>,
) -> Result<Json<Vec<PositionView>>, AppError> {
    info!("GET /positions - Listing current positions");
    let positions = services::position_service::list(&state.pool)
        .await
        .map_err(|e| {
            error!("Failed to list positions: {}", e);
            e
        })?;
    Ok(Json(positions))
}

pub async fn recompute_positions(
    State(state): State<AppState>,
) -> Result<Json<RecomputeSummary>, AppError> {
    info!("POST /positions/recompute - Rebuilding positions from operation log");
    let summary = services::position_service::recompute(&state.pool)
        .await
        .map_err(|e| {
            error!("Failed to recompute positions: {}", e);
            e
        })?;
    Ok(Json(summary))
}
