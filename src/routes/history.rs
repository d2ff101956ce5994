use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{HistoryQuery, HistoryResponse};
use crate::services::history_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/portfolio", get(portfolio_history))
        .route("/asset/:ticker", get(asset_history))
}

async fn portfolio_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    info!("GET /history/portfolio - Computing portfolio history");
    let params = history_service::parse_query(query)?;
    history_service::get_series(&state.pool, state.reference_tz, params)
        .await
        .map(Json)
        .map_err(|e| {
            error!("Failed to compute portfolio history: {}", e);
            e
        })
}

async fn asset_history(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    info!("GET /history/asset/{} - Computing asset history", ticker);
    let params = history_service::parse_query(query)?;
    history_service::get_asset_series(&state.pool, state.reference_tz, &ticker, params)
        .await
        .map(Json)
        .map_err(|e| {
            error!("Failed to compute history for {}: {}", ticker, e);
            e
        })
}
