use axum::extract::State;
use http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::{BatchImportResult, CreateOperation, Operation};
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_operations).post(create_operation))
        .route("/batch", post(import_operations))
}

pub async fn list_operations(
    State(state): State<AppState>,
) -> Result<Json<Vec<Operation>>, AppError> {
    info!("GET /operations - Listing operation log");
    let operations = services::operation_service::list(&state.pool).await?;
    Ok(Json(operations))
}

pub async fn create_operation(
    State(state): State<AppState>,
    Json(data): Json<CreateOperation>,
) -> Result<(StatusCode, Json<Operation>), AppError> {
    info!("POST /operations - Recording operation");
    let operation = services::operation_service::record(&state.pool, data)
        .await
        .map_err(|e| {
            match &e {
                AppError::Validation(_) | AppError::InsufficientHoldings { .. } => {
                    warn!("Operation rejected: {}", e)
                }
                _ => error!("Failed to record operation: {}", e),
            }
            e
        })?;
    Ok((StatusCode::CREATED, Json(operation)))
}

pub async fn import_operations(
    State(state): State<AppState>,
    Json(rows): Json<Vec<CreateOperation>>,
) -> Result<Json<BatchImportResult>, AppError> {
    info!("POST /operations/batch - Importing {} operations", rows.len());
    let result = services::operation_service::import_batch(&state.pool, rows)
        .await
        .map_err(|e| {
            error!("Batch import failed: {}", e);
            e
        })?;
    Ok(Json(result))
}
