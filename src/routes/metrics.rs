use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::PortfolioMetrics;
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_metrics))
}

async fn get_metrics(State(state): State<AppState>) -> Result<Json<PortfolioMetrics>, AppError> {
    info!("GET /metrics - Computing portfolio metrics");
    services::metrics_service::get_metrics(&state.pool)
        .await
        .map(Json)
        .map_err(|e| {
            error!("Failed to compute metrics: {}", e);
            e
        })
}
