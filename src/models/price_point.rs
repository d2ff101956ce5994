use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// Represents the closing price of a ticker on a given day.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PricePoint {
    pub id: Uuid,
    pub ticker: String,
    pub date: NaiveDate,
    pub close_price: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePricePoint {
    pub ticker: Option<String>,
    pub date: Option<String>,
    #[serde(alias = "closing_price")]
    pub close_price: Option<BigDecimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPriceResult {
    pub ticker: String,
    pub date: NaiveDate,
    pub inserted: bool,
}
