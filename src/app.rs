use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::routes::{health, history, metrics, operations, positions, prices};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api/operations", operations::router())
        .nest("/api/positions", positions::router())
        .nest("/api/metrics", metrics::router())
        .nest("/api/history", history::router())
        .nest("/api/prices", prices::router())
        .with_state(state)
}

/// Wraps the router with request tracing and CORS for the frontend origin.
/// Without an origin every origin is allowed.
pub fn with_middleware(app: Router, cors_allow_origin: Option<&str>) -> Router {
    let cors = match cors_allow_origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        Some(Err(e)) => {
            warn!("Ignoring invalid CORS_ALLOW_ORIGIN ({}), allowing any origin", e);
            CorsLayer::permissive()
        }
        None => CorsLayer::permissive(),
    };

    app.layer(cors).layer(TraceLayer::new_for_http())
}
