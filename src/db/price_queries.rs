use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::PricePoint;

/// Inserts the closing price unless one is already recorded for `(ticker, date)`.
/// Returns whether a row was written.
pub async fn insert_if_missing<'e, E>(
    executor: E,
    ticker: &str,
    date: NaiveDate,
    close_price: &BigDecimal,
) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        "INSERT INTO price_points (id, ticker, date, close_price)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (ticker, date) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(ticker)
    .bind(date)
    .bind(close_price)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_all(pool: &PgPool, ticker: &str) -> Result<Vec<PricePoint>, sqlx::Error> {
    sqlx::query_as::<_, PricePoint>(
        "SELECT id, ticker, date, close_price, created_at
         FROM price_points
         WHERE ticker = $1
         ORDER BY date ASC",
    )
    .bind(ticker)
    .fetch_all(pool)
    .await
}

pub async fn fetch_latest(pool: &PgPool, ticker: &str) -> Result<Option<PricePoint>, sqlx::Error> {
    sqlx::query_as::<_, PricePoint>(
        "SELECT id, ticker, date, close_price, created_at
         FROM price_points
         WHERE ticker = $1
         ORDER BY date DESC
         LIMIT 1",
    )
    .bind(ticker)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_latest_batch(
    pool: &PgPool,
    tickers: &[String],
) -> Result<HashMap<String, PricePoint>, sqlx::Error> {
    if tickers.is_empty() {
        return Ok(HashMap::new());
    }

    // DISTINCT ON keeps the newest row per ticker
    let prices = sqlx::query_as::<_, PricePoint>(
        r#"
        SELECT DISTINCT ON (ticker) id, ticker, date, close_price, created_at
        FROM price_points
        WHERE ticker = ANY($1)
        ORDER BY ticker, date DESC
        "#,
    )
    .bind(tickers)
    .fetch_all(pool)
    .await?;

    Ok(prices.into_iter().map(|p| (p.ticker.clone(), p)).collect())
}

/// Prices of the given tickers dated on or before `end`, oldest first.
pub async fn fetch_for_tickers_until(
    pool: &PgPool,
    tickers: &[String],
    end: NaiveDate,
) -> Result<Vec<PricePoint>, sqlx::Error> {
    if tickers.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, PricePoint>(
        r#"
        SELECT id, ticker, date, close_price, created_at
        FROM price_points
        WHERE ticker = ANY($1) AND date <= $2
        ORDER BY date ASC
        "#,
    )
    .bind(tickers)
    .bind(end)
    .fetch_all(pool)
    .await
}
