use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use investfolio_backend::app;
use investfolio_backend::config::AppConfig;
use investfolio_backend::logging::{init_logging, LoggingConfig};
use investfolio_backend::services::position_service;
use investfolio_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env())
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(config.connect_options()?)
        .await
        .context("Failed to connect to the database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    // positions are derived data; rebuild them so they always match the log
    position_service::recompute(&pool)
        .await
        .context("Failed to rebuild positions at startup")?;

    let state = AppState {
        pool,
        reference_tz: config.reference_tz,
    };
    let app = app::with_middleware(app::create_app(state), config.cors_allow_origin.as_deref());

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Investfolio backend running at http://{}/", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
