use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use tracing::{error, info};

use crate::db;
use crate::errors::AppError;
use crate::models::{Position, PositionView, PricePoint, RecomputeSummary};
use crate::services::operation_service::lock_writes;
use crate::services::position_aggregator;
use crate::utils::percent_change;

/// Replays the whole operation log and replaces the position table with the result.
/// Runs on the caller's connection so it shares the write transaction.
pub(crate) async fn recompute_in(conn: &mut PgConnection) -> Result<RecomputeSummary, sqlx::Error> {
    let operations = db::operation_queries::fetch_all(&mut *conn).await?;
    let positions: Vec<Position> = position_aggregator::aggregate(&operations)
        .into_values()
        .collect();
    db::position_queries::replace_all(conn, &positions).await?;

    Ok(RecomputeSummary {
        positions: positions.len(),
        operations: operations.len(),
        recomputed_at: Utc::now(),
    })
}

pub async fn recompute(pool: &PgPool) -> Result<RecomputeSummary, AppError> {
    let mut tx = pool.begin().await?;
    lock_writes(&mut tx).await?;
    let summary = recompute_in(&mut tx).await.map_err(|e| {
        error!("Failed to recompute positions: {}", e);
        AppError::Db(e)
    })?;
    tx.commit().await?;

    info!(
        "Recomputed {} positions from {} operations",
        summary.positions, summary.operations
    );
    Ok(summary)
}

pub fn view(position: Position, latest: Option<&PricePoint>) -> PositionView {
    let invested = &position.average_cost * &position.quantity;
    let current_price = latest.map(|p| p.close_price.clone());
    let current_value = current_price.as_ref().map(|price| price * &position.quantity);
    let pnl_abs = current_value.as_ref().map(|value| value - &invested);
    let pnl_pct = match &current_price {
        Some(price) if position.average_cost > BigDecimal::from(0) => {
            Some(percent_change(price, &position.average_cost))
        }
        _ => None,
    };

    PositionView {
        invested,
        current_price,
        price_date: latest.map(|p| p.date),
        current_value,
        pnl_abs,
        pnl_pct,
        position,
    }
}

pub async fn list(pool: &PgPool) -> Result<Vec<PositionView>, AppError> {
    let positions = db::position_queries::fetch_all(pool).await?;
    let tickers: Vec<String> = positions.iter().map(|p| p.ticker.clone()).collect();
    let latest: HashMap<String, PricePoint> =
        db::price_queries::fetch_latest_batch(pool, &tickers).await?;

    Ok(positions
        .into_iter()
        .map(|p| {
            let price = latest.get(&p.ticker);
            view(p, price)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssetType;
    use chrono::NaiveDate;
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn position(qty: &str, avg: &str) -> Position {
        Position {
            ticker: "IWDA".into(),
            name: "MSCI World".into(),
            asset_type: AssetType::Fund,
            quantity: dec(qty),
            average_cost: dec(avg),
        }
    }

    fn close(price: &str) -> PricePoint {
        PricePoint {
            id: Uuid::new_v4(),
            ticker: "IWDA".into(),
            date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            close_price: dec(price),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_view_with_price() {
        let v = view(position("15", "110"), Some(&close("121")));
        assert_eq!(v.invested, dec("1650"));
        assert_eq!(v.current_value, Some(dec("1815")));
        assert_eq!(v.pnl_abs, Some(dec("165")));
        assert_eq!(v.pnl_pct, Some(dec("10")));
        assert_eq!(v.price_date, NaiveDate::from_ymd_opt(2024, 5, 2));
    }

    #[test]
    fn test_view_without_price_leaves_market_fields_empty() {
        let v = view(position("2", "50"), None);
        assert_eq!(v.invested, dec("100"));
        assert!(v.current_price.is_none());
        assert!(v.current_value.is_none());
        assert!(v.pnl_abs.is_none());
        assert!(v.pnl_pct.is_none());
    }

    #[test]
    fn test_view_zero_cost_has_no_percentage() {
        let v = view(position("2", "0"), Some(&close("10")));
        assert_eq!(v.pnl_abs, Some(dec("20")));
        assert!(v.pnl_pct.is_none());
    }
}
