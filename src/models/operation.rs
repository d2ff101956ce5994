use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for Side {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            _ => Err(UnknownVariant { kind: "side", value: s.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Stock,
    Fund,
    Crypto,
    Forex,
    Other,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Stock => "stock",
            AssetType::Fund => "fund",
            AssetType::Crypto => "crypto",
            AssetType::Forex => "forex",
            AssetType::Other => "other",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stock" => Ok(AssetType::Stock),
            "fund" => Ok(AssetType::Fund),
            "crypto" => Ok(AssetType::Crypto),
            "forex" => Ok(AssetType::Forex),
            "other" => Ok(AssetType::Other),
            _ => Err(UnknownVariant { kind: "asset type", value: s.to_string() }),
        }
    }
}

// A single buy or sell as recorded in the append-only operation log.
// `id` is the insertion sequence and breaks ties between operations on the same date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub id: i64,
    pub ticker: String,
    pub name: String,
    pub asset_type: AssetType,
    pub side: Side,
    pub date: NaiveDate,
    pub price: BigDecimal,
    pub quantity: BigDecimal,
    pub created_at: DateTime<Utc>,
}

impl Operation {
    /// Quantity with the sign of the side: positive for buys, negative for sells.
    pub fn signed_quantity(&self) -> BigDecimal {
        match self.side {
            Side::Buy => self.quantity.clone(),
            Side::Sell => -self.quantity.clone(),
        }
    }
}

fn decode_column<T>(row: &PgRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = UnknownVariant>,
{
    let raw: String = row.try_get(column)?;
    raw.parse::<T>().map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

impl<'r> FromRow<'r, PgRow> for Operation {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            ticker: row.try_get("ticker")?,
            name: row.try_get("name")?,
            asset_type: decode_column(row, "asset_type")?,
            side: decode_column(row, "side")?,
            date: row.try_get("op_date")?,
            price: row.try_get("price")?,
            quantity: row.try_get("quantity")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Raw request body for recording an operation. Every field is optional so that
/// missing values surface as validation errors instead of extractor rejections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateOperation {
    pub name: Option<String>,
    pub ticker: Option<String>,
    pub asset_type: Option<String>,
    pub side: Option<String>,
    #[serde(alias = "op_date")]
    pub date: Option<String>,
    pub price: Option<BigDecimal>,
    pub quantity: Option<BigDecimal>,
}

/// An operation that passed validation and is ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOperation {
    pub ticker: String,
    pub name: String,
    pub asset_type: AssetType,
    pub side: Side,
    pub date: NaiveDate,
    pub price: BigDecimal,
    pub quantity: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchImportResult {
    pub inserted: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}
