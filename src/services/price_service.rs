use sqlx::PgPool;
use tracing::{error, info};

use crate::db;
use crate::errors::AppError;
use crate::models::{CreatePricePoint, PricePoint, RecordPriceResult};
use crate::utils::{parse_amount, parse_iso_date};

pub async fn get_history(pool: &PgPool, ticker: &str) -> Result<Vec<PricePoint>, AppError> {
    db::price_queries::fetch_all(pool, ticker).await.map_err(|e| {
        error!("Failed to fetch price history for ticker {}: {}", ticker, e);
        AppError::Db(e)
    })
}

pub async fn get_latest(pool: &PgPool, ticker: &str) -> Result<PricePoint, AppError> {
    db::price_queries::fetch_latest(pool, ticker)
        .await
        .map_err(|e| {
            error!("Failed to fetch latest price for ticker {}: {}", ticker, e);
            AppError::Db(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("No price data found for ticker {}", ticker)))
}

/// Stores a closing price. An existing price for the same ticker and day wins.
pub async fn record(pool: &PgPool, input: CreatePricePoint) -> Result<RecordPriceResult, AppError> {
    let ticker = input.ticker.as_deref().map(str::trim).unwrap_or("").to_string();
    if ticker.is_empty() {
        return Err(AppError::Validation("ticker is required".into()));
    }
    let date = parse_iso_date("date", input.date.as_deref().unwrap_or(""))?;
    let close_price = parse_amount("close_price", input.close_price)?;

    let inserted = db::price_queries::insert_if_missing(pool, &ticker, date, &close_price).await?;
    if inserted {
        info!("Recorded close of {} for {} on {}", close_price, ticker, date);
    } else {
        info!("Price for {} on {} already recorded, keeping existing value", ticker, date);
    }
    Ok(RecordPriceResult { ticker, date, inserted })
}
