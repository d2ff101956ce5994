use chrono::NaiveDate;
use sqlx::PgExecutor;

use crate::models::{NewOperation, Operation};

const OPERATION_COLUMNS: &str =
    "id, ticker, name, asset_type, side, op_date, price, quantity, created_at";

pub async fn insert<'e, E>(executor: E, input: &NewOperation) -> Result<Operation, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Operation>(&format!(
        "INSERT INTO operations (ticker, name, asset_type, side, op_date, price, quantity)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {}",
        OPERATION_COLUMNS
    ))
    .bind(&input.ticker)
    .bind(&input.name)
    .bind(input.asset_type.as_str())
    .bind(input.side.as_str())
    .bind(input.date)
    .bind(&input.price)
    .bind(&input.quantity)
    .fetch_one(executor)
    .await
}

/// Full log in replay order: by date, then insertion sequence.
pub async fn fetch_all<'e, E>(executor: E) -> Result<Vec<Operation>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Operation>(&format!(
        "SELECT {} FROM operations ORDER BY op_date ASC, id ASC",
        OPERATION_COLUMNS
    ))
    .fetch_all(executor)
    .await
}

/// Operations of the given tickers dated on or before `end`.
pub async fn fetch_for_tickers_until<'e, E>(
    executor: E,
    tickers: &[String],
    end: NaiveDate,
) -> Result<Vec<Operation>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    if tickers.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, Operation>(&format!(
        "SELECT {} FROM operations
         WHERE ticker = ANY($1) AND op_date <= $2
         ORDER BY op_date ASC, id ASC",
        OPERATION_COLUMNS
    ))
    .bind(tickers)
    .bind(end)
    .fetch_all(executor)
    .await
}

pub async fn fetch_distinct_tickers<'e, E>(executor: E) -> Result<Vec<String>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, String>("SELECT DISTINCT ticker FROM operations ORDER BY ticker")
        .fetch_all(executor)
        .await
}

/// Earliest operation date, optionally restricted to some tickers.
pub async fn fetch_earliest_date<'e, E>(
    executor: E,
    tickers: &[String],
) -> Result<Option<NaiveDate>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, Option<NaiveDate>>(
        "SELECT MIN(op_date) FROM operations
         WHERE cardinality($1::text[]) = 0 OR ticker = ANY($1)",
    )
    .bind(tickers)
    .fetch_one(executor)
    .await
}
