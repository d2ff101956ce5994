use chrono_tz::Tz;
use sqlx::PgPool;
use tracing::{debug, error};

use crate::db;
use crate::errors::AppError;
use crate::models::{
    Grouping, HistoryMeta, HistoryQuery, HistoryResponse, SeriesParams, DEFAULT_MAX_POINTS,
};
use crate::services::valuation_series::{self, DateRange, MAX_RANGE_DAYS};
use crate::utils::{parse_optional_date, today_in};

/// Turns the raw query string into series parameters.
///
/// Dates must be `YYYY-MM-DD`; an unknown `group` falls back to daily and a
/// missing, zero or unparsable `maxPoints` falls back to the default.
pub fn parse_query(query: HistoryQuery) -> Result<SeriesParams, AppError> {
    let tickers: Vec<String> = query
        .tickers
        .as_deref()
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect();

    let start = parse_optional_date("start", query.start.as_deref())?;
    let end = parse_optional_date("end", query.end.as_deref())?;

    let max_points = query
        .max_points
        .as_deref()
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_MAX_POINTS);

    Ok(SeriesParams {
        tickers,
        start,
        end,
        group: Grouping::parse_lenient(query.group.as_deref()),
        max_points,
    })
}

fn empty_response(params: &SeriesParams, universe: Vec<String>) -> HistoryResponse {
    HistoryResponse {
        series: Vec::new(),
        meta: HistoryMeta {
            points: 0,
            start: None,
            end: None,
            group: params.group,
            tickers: universe,
        },
    }
}

/// Valuation series for the requested tickers, or for every ticker that appears
/// in the operation log when none are given.
pub async fn get_series(pool: &PgPool, tz: Tz, params: SeriesParams) -> Result<HistoryResponse, AppError> {
    let universe = if params.tickers.is_empty() {
        db::operation_queries::fetch_distinct_tickers(pool).await?
    } else {
        let mut tickers = params.tickers.clone();
        tickers.sort();
        tickers.dedup();
        tickers
    };
    if universe.is_empty() {
        return Ok(empty_response(&params, universe));
    }

    let earliest = match params.start {
        Some(_) => None,
        None => db::operation_queries::fetch_earliest_date(pool, &universe).await?,
    };
    let range = DateRange::resolve(params.start, params.end, earliest, today_in(tz));
    if range.start > range.end {
        return Ok(empty_response(&params, universe));
    }
    if range.len_days() > MAX_RANGE_DAYS {
        return Err(AppError::Validation(format!(
            "date range {}..={} spans {} days, at most {} are allowed",
            range.start,
            range.end,
            range.len_days(),
            MAX_RANGE_DAYS
        )));
    }

    let (operations, prices) = tokio::try_join!(
        db::operation_queries::fetch_for_tickers_until(pool, &universe, range.end),
        db::price_queries::fetch_for_tickers_until(pool, &universe, range.end),
    )
    .map_err(|e| {
        error!("Failed to load history inputs for {:?}: {}", universe, e);
        AppError::Db(e)
    })?;

    debug!(
        "Building {:?} series over {}..={} from {} operations and {} prices",
        params.group,
        range.start,
        range.end,
        operations.len(),
        prices.len()
    );

    let series = valuation_series::build_series(
        &universe,
        &operations,
        &prices,
        range,
        params.group,
        params.max_points,
    );

    Ok(HistoryResponse {
        meta: HistoryMeta {
            points: series.len(),
            start: series.first().map(|p| p.date),
            end: series.last().map(|p| p.date),
            group: params.group,
            tickers: universe,
        },
        series,
    })
}

pub async fn get_asset_series(
    pool: &PgPool,
    tz: Tz,
    ticker: &str,
    mut params: SeriesParams,
) -> Result<HistoryResponse, AppError> {
    let ticker = ticker.trim();
    if ticker.is_empty() {
        return Err(AppError::Validation("ticker is required".into()));
    }
    params.tickers = vec![ticker.to_string()];
    get_series(pool, tz, params).await
}
