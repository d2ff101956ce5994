use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_POINTS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: BigDecimal,
}

/// Calendar granularity of a valuation series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl Grouping {
    /// Unknown or empty names fall back to `Day`.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("week") => Grouping::Week,
            Some("month") => Grouping::Month,
            Some("year") => Grouping::Year,
            _ => Grouping::Day,
        }
    }
}

/// Query string accepted by the history endpoints, exactly as received.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub tickers: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub group: Option<String>,
    #[serde(rename = "maxPoints", alias = "max_points")]
    pub max_points: Option<String>,
}

/// Resolved series request. `None` dates are filled in from the data and the clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesParams {
    pub tickers: Vec<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub group: Grouping,
    pub max_points: usize,
}

impl Default for SeriesParams {
    fn default() -> Self {
        Self {
            tickers: Vec::new(),
            start: None,
            end: None,
            group: Grouping::Day,
            max_points: DEFAULT_MAX_POINTS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMeta {
    pub points: usize,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub group: Grouping,
    pub tickers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub series: Vec<SeriesPoint>,
    pub meta: HistoryMeta,
}
