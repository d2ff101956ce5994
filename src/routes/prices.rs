use axum::extract::{Path, State};
use http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{CreatePricePoint, PricePoint, RecordPriceResult};
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(record_price))
        .route("/:ticker", get(get_prices))
        .route("/:ticker/latest", get(get_latest_price))
}

pub async fn get_prices(
    Path(ticker): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<PricePoint>>, AppError> {
    info!("GET /prices/{} - Getting price history", ticker);
    let prices = services::price_service::get_history(&state.pool, &ticker).await?;
    Ok(Json(prices))
}

pub async fn get_latest_price(
    Path(ticker): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PricePoint>, AppError> {
    info!("GET /prices/{}/latest - Getting latest price", ticker);
    let price = services::price_service::get_latest(&state.pool, &ticker).await?;
    Ok(Json(price))
}

pub async fn record_price(
    State(state): State<AppState>,
    Json(data): Json<CreatePricePoint>,
) -> Result<(StatusCode, Json<RecordPriceResult>), AppError> {
    info!("POST /prices - Recording closing price");
    let result = services::price_service::record(&state.pool, data)
        .await
        .map_err(|e| {
            error!("Failed to record price: {}", e);
            e
        })?;
    let status = if result.inserted { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(result)))
}
