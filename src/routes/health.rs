use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Router};
use tracing::{error, info};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health))
        .route("/db", get(db_health))
}

async fn health() -> &'static str {
    info!("GET /health - Health check");
    "OK"
}

async fn db_health(State(state): State<AppState>) -> (StatusCode, &'static str) {
    info!("GET /health/db - Database health check");
    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => (StatusCode::OK, "OK"),
        Err(e) => {
            error!("Database health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "Database unavailable")
        }
    }
}
