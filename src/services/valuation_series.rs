use std::collections::{BTreeSet, HashMap};

use bigdecimal::BigDecimal;
use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{Grouping, Operation, PricePoint, SeriesPoint};

/// Longest grid a series request may cover, roughly a century of days.
pub const MAX_RANGE_DAYS: i64 = 36_600;

/// Inclusive calendar range. Empty when `start > end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Fills missing bounds: `end` defaults to `today`, `start` to the earliest
    /// operation in scope, or to `end` when there is none.
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        earliest_operation: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Self {
        let end = end.unwrap_or(today);
        let start = start.or(earliest_operation).unwrap_or(end);
        Self { start, end }
    }

    /// Number of calendar days covered, zero when empty.
    pub fn len_days(&self) -> i64 {
        ((self.end - self.start).num_days() + 1).max(0)
    }

    pub fn days(&self) -> Vec<NaiveDate> {
        if self.start > self.end {
            return Vec::new();
        }
        self.start
            .iter_days()
            .take_while(|d| *d <= self.end)
            .collect()
    }
}

/// Values each grid date with the latest observation at or before it, zero before the first.
/// `observations` must be sorted by date; a later entry on the same date wins.
fn forward_fill(observations: &[(NaiveDate, BigDecimal)], grid: &[NaiveDate]) -> Vec<BigDecimal> {
    let mut out = Vec::with_capacity(grid.len());
    let mut last = BigDecimal::from(0);
    let mut next = 0;
    for day in grid {
        while next < observations.len() && observations[next].0 <= *day {
            last = observations[next].1.clone();
            next += 1;
        }
        out.push(last.clone());
    }
    out
}

/// Running signed quantity of one ticker on every grid date.
pub fn cumulative_quantities(operations: &[&Operation], grid: &[NaiveDate]) -> Vec<BigDecimal> {
    let mut ordered: Vec<&Operation> = operations.to_vec();
    ordered.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));

    let mut cumulative = BigDecimal::from(0);
    let observations: Vec<(NaiveDate, BigDecimal)> = ordered
        .into_iter()
        .map(|op| {
            cumulative = &cumulative + op.signed_quantity();
            (op.date, cumulative.clone())
        })
        .collect();

    forward_fill(&observations, grid)
}

/// Most recent closing price of one ticker on every grid date.
pub fn forward_prices(prices: &[&PricePoint], grid: &[NaiveDate]) -> Vec<BigDecimal> {
    let mut observations: Vec<(NaiveDate, BigDecimal)> = prices
        .iter()
        .map(|p| (p.date, p.close_price.clone()))
        .collect();
    observations.sort_by(|a, b| a.0.cmp(&b.0));
    forward_fill(&observations, grid)
}

/// First day of the bucket containing `date`. Weeks start on Monday.
pub fn bucket_start(date: NaiveDate, group: Grouping) -> NaiveDate {
    match group {
        Grouping::Day => date,
        Grouping::Week => date - Duration::days(date.weekday().num_days_from_monday() as i64),
        Grouping::Month => date.with_day(1).unwrap_or(date),
        Grouping::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
    }
}

/// Collapses an ascending daily series into one point per bucket, dated at the
/// bucket start and carrying the value of the last day that fell in it.
pub fn regroup_last(daily: Vec<SeriesPoint>, group: Grouping) -> Vec<SeriesPoint> {
    if group == Grouping::Day {
        return daily;
    }
    let mut out: Vec<SeriesPoint> = Vec::new();
    for point in daily {
        let key = bucket_start(point.date, group);
        match out.last_mut() {
            Some(current) if current.date == key => current.value = point.value,
            _ => out.push(SeriesPoint { date: key, value: point.value }),
        }
    }
    out
}

/// Keeps every `ceil(n / max_points)`-th point. The final point is always kept,
/// taking the place of the last sampled one if the budget is already used up.
pub fn downsample(series: Vec<SeriesPoint>, max_points: usize) -> Vec<SeriesPoint> {
    let max_points = max_points.max(1);
    if series.len() <= max_points {
        return series;
    }
    let step = series.len().div_ceil(max_points);
    let last = series[series.len() - 1].clone();

    let mut out: Vec<SeriesPoint> = series.into_iter().step_by(step).collect();
    if out.last().map(|p| p.date) != Some(last.date) {
        if out.len() >= max_points {
            out.pop();
        }
        out.push(last);
    }
    out
}

/// Market value over time of the tickers in `universe`.
///
/// Quantities come from the signed running sum of operations and prices are
/// forward-filled; a ticker contributes zero until it has both. Operations or
/// prices for tickers outside the universe are ignored.
pub fn build_series(
    universe: &[String],
    operations: &[Operation],
    prices: &[PricePoint],
    range: DateRange,
    group: Grouping,
    max_points: usize,
) -> Vec<SeriesPoint> {
    let grid = range.days();
    if grid.is_empty() || universe.is_empty() {
        return Vec::new();
    }

    let universe: BTreeSet<&str> = universe.iter().map(String::as_str).collect();

    let mut ops_by_ticker: HashMap<&str, Vec<&Operation>> = HashMap::new();
    for op in operations.iter().filter(|o| universe.contains(o.ticker.as_str())) {
        ops_by_ticker.entry(op.ticker.as_str()).or_default().push(op);
    }
    let mut prices_by_ticker: HashMap<&str, Vec<&PricePoint>> = HashMap::new();
    for p in prices.iter().filter(|p| universe.contains(p.ticker.as_str())) {
        prices_by_ticker.entry(p.ticker.as_str()).or_default().push(p);
    }

    let mut totals = vec![BigDecimal::from(0); grid.len()];
    for ticker in &universe {
        let (Some(ops), Some(ticker_prices)) =
            (ops_by_ticker.get(ticker), prices_by_ticker.get(ticker))
        else {
            // no quantity or no price means zero on every day
            continue;
        };
        let quantities = cumulative_quantities(ops, &grid);
        let closes = forward_prices(ticker_prices, &grid);
        for (i, total) in totals.iter_mut().enumerate() {
            *total = &*total + &quantities[i] * &closes[i];
        }
    }

    let daily: Vec<SeriesPoint> = grid
        .into_iter()
        .zip(totals)
        .map(|(date, value)| SeriesPoint { date, value })
        .collect();

    downsample(regroup_last(daily, group), max_points)
}
