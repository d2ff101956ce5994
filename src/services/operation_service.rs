use std::collections::HashMap;

use bigdecimal::BigDecimal;
use sqlx::{PgConnection, PgPool};
use tracing::{error, info, warn};

use crate::db;
use crate::errors::AppError;
use crate::models::{AssetType, BatchImportResult, CreateOperation, NewOperation, Operation, Side};
use crate::services::position_service;
use crate::utils::{parse_amount, parse_iso_date};

/// Advisory lock key shared by every transaction that writes operations or positions.
pub const WRITE_LOCK_KEY: i64 = 0x1f0_11a0;

/// Serializes writers for the rest of the transaction. Released on commit or rollback.
pub(crate) async fn lock_writes(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(WRITE_LOCK_KEY)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

fn required(field: &str, value: Option<String>) -> Result<String, AppError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!("{} is required", field))),
    }
}

pub fn validate(input: CreateOperation) -> Result<NewOperation, AppError> {
    let ticker = required("ticker", input.ticker)?;
    let name = required("name", input.name)?;
    let asset_type = required("asset_type", input.asset_type)?
        .parse::<AssetType>()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let side = required("side", input.side)?
        .parse::<Side>()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let date = parse_iso_date("date", &required("date", input.date)?)?;

    let price = parse_amount("price", input.price)?;
    let quantity = parse_amount("quantity", input.quantity)?;

    Ok(NewOperation { ticker, name, asset_type, side, date, price, quantity })
}

/// Rejects a sell larger than what is currently held. Buys always pass.
pub fn check_holdings(op: &NewOperation, available: &BigDecimal) -> Result<(), AppError> {
    if op.side == Side::Sell && op.quantity > *available {
        return Err(AppError::InsufficientHoldings {
            ticker: op.ticker.clone(),
            requested: op.quantity.clone(),
            available: available.clone(),
        });
    }
    Ok(())
}

async fn insert_with_backfill(conn: &mut PgConnection, op: &NewOperation) -> Result<Operation, sqlx::Error> {
    let inserted = db::operation_queries::insert(&mut *conn, op).await?;
    // the trade price stands in as that day's close when nothing better is known
    db::price_queries::insert_if_missing(&mut *conn, &op.ticker, op.date, &op.price).await?;
    Ok(inserted)
}

/// Records one operation and refreshes the position snapshot in the same transaction.
pub async fn record(pool: &PgPool, input: CreateOperation) -> Result<Operation, AppError> {
    let op = validate(input)?;

    let mut tx = pool.begin().await?;
    lock_writes(&mut tx).await?;

    if op.side == Side::Sell {
        let available = db::position_queries::fetch_quantity(&mut *tx, &op.ticker).await?;
        if let Err(e) = check_holdings(&op, &available) {
            warn!("Rejected sell of {} {}: {}", op.quantity, op.ticker, e);
            return Err(e);
        }
    }

    let inserted = insert_with_backfill(&mut tx, &op).await.map_err(|e| {
        error!("Failed to insert operation for {}: {}", op.ticker, e);
        AppError::Db(e)
    })?;
    let summary = position_service::recompute_in(&mut tx).await?;
    tx.commit().await?;

    info!(
        "Recorded {} of {} {} on {} (positions now {})",
        inserted.side, inserted.quantity, inserted.ticker, inserted.date, summary.positions
    );
    Ok(inserted)
}

/// Records a batch of operations. Rows that fail validation or the holdings check
/// are skipped and reported; the rest are inserted in one transaction, so a
/// database failure rolls back the whole batch.
pub async fn import_batch(pool: &PgPool, rows: Vec<CreateOperation>) -> Result<BatchImportResult, AppError> {
    let mut tx = pool.begin().await?;
    lock_writes(&mut tx).await?;

    let mut holdings: HashMap<String, BigDecimal> = HashMap::new();
    let mut inserted = 0;
    let mut errors = Vec::new();

    for (i, row) in rows.into_iter().enumerate() {
        let line = i + 1;
        let op = match validate(row) {
            Ok(op) => op,
            Err(e) => {
                errors.push(format!("Row {}: {}", line, e));
                continue;
            }
        };

        if !holdings.contains_key(&op.ticker) {
            let held = db::position_queries::fetch_quantity(&mut *tx, &op.ticker).await?;
            holdings.insert(op.ticker.clone(), held);
        }
        let held = holdings.entry(op.ticker.clone()).or_insert_with(|| BigDecimal::from(0));
        if let Err(e) = check_holdings(&op, held) {
            errors.push(format!("Row {}: {}", line, e));
            continue;
        }

        insert_with_backfill(&mut tx, &op).await.map_err(|e| {
            error!("Batch import failed at row {}: {}", line, e);
            AppError::Db(e)
        })?;
        *held = match op.side {
            Side::Buy => &*held + &op.quantity,
            Side::Sell => &*held - &op.quantity,
        };
        inserted += 1;
    }

    if inserted > 0 {
        position_service::recompute_in(&mut tx).await?;
    }
    tx.commit().await?;

    info!("Batch import: {} inserted, {} skipped", inserted, errors.len());
    Ok(BatchImportResult { inserted, skipped: errors.len(), errors })
}

pub async fn list(pool: &PgPool) -> Result<Vec<Operation>, AppError> {
    db::operation_queries::fetch_all(pool).await.map_err(|e| {
        error!("Failed to fetch operations: {}", e);
        AppError::Db(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn valid_input() -> CreateOperation {
        CreateOperation {
            name: Some(" Acme Corp ".into()),
            ticker: Some(" ACME ".into()),
            asset_type: Some("Stock".into()),
            side: Some("SELL".into()),
            date: Some("2024-01-10".into()),
            price: Some(dec("12.5")),
            quantity: Some(dec("20")),
        }
    }

    #[test]
    fn test_validate_trims_and_normalizes() {
        let op = validate(valid_input()).unwrap();
        assert_eq!(op.ticker, "ACME");
        assert_eq!(op.name, "Acme Corp");
        assert_eq!(op.asset_type, AssetType::Stock);
        assert_eq!(op.side, Side::Sell);
        assert_eq!(op.date, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let mut input = valid_input();
        input.ticker = Some("   ".into());
        assert!(matches!(validate(input), Err(AppError::Validation(_))));

        let mut input = valid_input();
        input.price = None;
        assert!(matches!(validate(input), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_non_positive_amounts() {
        let mut input = valid_input();
        input.quantity = Some(dec("0"));
        assert!(matches!(validate(input), Err(AppError::Validation(_))));

        let mut input = valid_input();
        input.price = Some(dec("-1"));
        assert!(matches!(validate(input), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_amounts_the_log_cannot_store() {
        let mut input = valid_input();
        input.quantity = Some(dec("0.000000001"));
        assert!(matches!(validate(input), Err(AppError::Validation(_))));

        let mut input = valid_input();
        input.quantity = Some(dec("1.123456789"));
        assert!(matches!(validate(input), Err(AppError::Validation(_))));

        let mut input = valid_input();
        input.price = Some(dec("100000000000"));
        assert!(matches!(validate(input), Err(AppError::Validation(_))));

        let mut input = valid_input();
        input.quantity = Some(dec("1.12345678"));
        assert_eq!(validate(input).unwrap().quantity, dec("1.12345678"));
    }

    #[test]
    fn test_validate_rejects_unknown_side_and_bad_dates() {
        let mut input = valid_input();
        input.side = Some("short".into());
        assert!(matches!(validate(input), Err(AppError::Validation(_))));

        let mut input = valid_input();
        input.asset_type = Some("bond".into());
        assert!(matches!(validate(input), Err(AppError::Validation(_))));

        let mut input = valid_input();
        input.date = Some("10/01/2024".into());
        assert!(matches!(validate(input), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_oversell_is_a_business_rule_error() {
        let op = validate(valid_input()).unwrap();
        match check_holdings(&op, &dec("15")) {
            Err(AppError::InsufficientHoldings { ticker, requested, available }) => {
                assert_eq!(ticker, "ACME");
                assert_eq!(requested, dec("20"));
                assert_eq!(available, dec("15"));
            }
            other => panic!("expected InsufficientHoldings, got {:?}", other),
        }
    }

    #[test]
    fn test_sell_of_exact_holdings_and_buys_pass() {
        let op = validate(valid_input()).unwrap();
        assert!(check_holdings(&op, &dec("20")).is_ok());

        let mut buy = valid_input();
        buy.side = Some("buy".into());
        let buy = validate(buy).unwrap();
        assert!(check_holdings(&buy, &dec("0")).is_ok());
    }
}
