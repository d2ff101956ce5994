use std::collections::HashMap;

use bigdecimal::BigDecimal;
use sqlx::PgPool;

use crate::db;
use crate::errors::AppError;
use crate::models::{PortfolioMetrics, Position, PricePoint};
use crate::utils::percent_change;

/// Totals over the current positions. A position without any recorded price
/// counts towards the investment but adds nothing to the market value.
pub fn summarize(positions: &[Position], latest: &HashMap<String, PricePoint>) -> PortfolioMetrics {
    let mut total_investment = BigDecimal::from(0);
    let mut total_value = BigDecimal::from(0);

    for p in positions {
        total_investment = &total_investment + &p.average_cost * &p.quantity;
        if let Some(price) = latest.get(&p.ticker) {
            total_value = &total_value + &price.close_price * &p.quantity;
        }
    }

    let gain_loss = &total_value - &total_investment;
    let gain_loss_pct = percent_change(&total_value, &total_investment);

    PortfolioMetrics {
        total_investment,
        total_value,
        gain_loss,
        gain_loss_pct,
    }
}

pub async fn get_metrics(pool: &PgPool) -> Result<PortfolioMetrics, AppError> {
    let positions = db::position_queries::fetch_all(pool).await?;
    let tickers: Vec<String> = positions.iter().map(|p| p.ticker.clone()).collect();
    let latest = db::price_queries::fetch_latest_batch(pool, &tickers).await?;
    Ok(summarize(&positions, &latest))
}
