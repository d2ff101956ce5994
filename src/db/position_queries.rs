use bigdecimal::BigDecimal;
use sqlx::{PgConnection, PgExecutor};

use crate::models::Position;

pub async fn fetch_all<'e, E>(executor: E) -> Result<Vec<Position>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Position>(
        "SELECT ticker, name, asset_type, quantity, average_cost
         FROM positions
         ORDER BY ticker ASC",
    )
    .fetch_all(executor)
    .await
}

/// Materialized quantity for a ticker, zero when there is no position row.
pub async fn fetch_quantity<'e, E>(executor: E, ticker: &str) -> Result<BigDecimal, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let quantity = sqlx::query_scalar::<_, BigDecimal>(
        "SELECT quantity FROM positions WHERE ticker = $1",
    )
    .bind(ticker)
    .fetch_optional(executor)
    .await?;
    Ok(quantity.unwrap_or_else(|| BigDecimal::from(0)))
}

/// Delete-all-then-insert. Callers run this inside the write transaction.
pub async fn replace_all(conn: &mut PgConnection, positions: &[Position]) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM positions").execute(&mut *conn).await?;

    for p in positions {
        sqlx::query(
            "INSERT INTO positions (ticker, name, asset_type, average_cost, quantity)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&p.ticker)
        .bind(&p.name)
        .bind(p.asset_type.as_str())
        .bind(&p.average_cost)
        .bind(&p.quantity)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}
