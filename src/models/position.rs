use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

use super::operation::AssetType;

// Current holding of a ticker, derived from the operation log. Never edited directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticker: String,
    pub name: String,
    pub asset_type: AssetType,
    pub quantity: BigDecimal,
    pub average_cost: BigDecimal,
}

impl<'r> FromRow<'r, PgRow> for Position {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let asset_type: String = row.try_get("asset_type")?;
        Ok(Self {
            ticker: row.try_get("ticker")?,
            name: row.try_get("name")?,
            asset_type: asset_type.parse().map_err(|e| sqlx::Error::ColumnDecode {
                index: "asset_type".to_string(),
                source: Box::new(e),
            })?,
            quantity: row.try_get("quantity")?,
            average_cost: row.try_get("average_cost")?,
        })
    }
}

/// A position enriched with its latest known price and unrealized P&L.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionView {
    #[serde(flatten)]
    pub position: Position,
    pub invested: BigDecimal,
    pub current_price: Option<BigDecimal>,
    pub price_date: Option<chrono::NaiveDate>,
    pub current_value: Option<BigDecimal>,
    pub pnl_abs: Option<BigDecimal>,
    pub pnl_pct: Option<BigDecimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecomputeSummary {
    pub positions: usize,
    pub operations: usize,
    pub recomputed_at: DateTime<Utc>,
}
