use bigdecimal::BigDecimal;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

use crate::errors::AppError;

/// Strict `YYYY-MM-DD`. Anything else is a validation error, never coerced.
pub fn parse_iso_date(field: &str, raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("{} must be a date in YYYY-MM-DD format, got '{}'", field, raw)))
}

/// Parses an optional date field; absent or blank means "not given".
pub fn parse_optional_date(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_iso_date(field, value).map(Some),
    }
}

/// Fractional digits kept by the `NUMERIC(18, 8)` amount columns.
pub const AMOUNT_SCALE: i64 = 8;
/// Integer digits available in the same columns.
pub const AMOUNT_INTEGER_DIGITS: u32 = 10;

/// A required strictly positive amount that the database stores exactly.
pub fn parse_amount(field: &str, value: Option<BigDecimal>) -> Result<BigDecimal, AppError> {
    let value = value.ok_or_else(|| AppError::Validation(format!("{} is required", field)))?;
    if value <= BigDecimal::from(0) {
        return Err(AppError::Validation(format!("{} must be > 0", field)));
    }
    let (_, scale) = value.normalized().as_bigint_and_exponent();
    if scale > AMOUNT_SCALE {
        return Err(AppError::Validation(format!(
            "{} allows at most {} decimal places, got {}",
            field, AMOUNT_SCALE, value
        )));
    }
    if value >= BigDecimal::from(10i64.pow(AMOUNT_INTEGER_DIGITS)) {
        return Err(AppError::Validation(format!(
            "{} must be below 1e{}, got {}",
            field, AMOUNT_INTEGER_DIGITS, value
        )));
    }
    Ok(value)
}

pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// `(current - base) / base * 100`, or zero when `base` is not positive.
pub fn percent_change(current: &BigDecimal, base: &BigDecimal) -> BigDecimal {
    let zero = BigDecimal::from(0);
    if *base <= zero {
        return zero;
    }
    (current - base) / base * BigDecimal::from(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_parse_iso_date_accepts_calendar_dates() {
        assert_eq!(
            parse_iso_date("start", "2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn test_parse_iso_date_rejects_malformed_input() {
        for raw in ["2024-13-01", "2023-02-29", "01/02/2024", "yesterday", "2024-1-1x"] {
            assert!(matches!(parse_iso_date("start", raw), Err(AppError::Validation(_))), "{}", raw);
        }
    }

    #[test]
    fn test_parse_optional_date_blank_is_none() {
        assert_eq!(parse_optional_date("end", None).unwrap(), None);
        assert_eq!(parse_optional_date("end", Some("  ")).unwrap(), None);
    }

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_amount_accepts_column_range() {
        for raw in ["0.00000001", "1.12345678", "1.500000000", "9999999999.99999999"] {
            assert_eq!(parse_amount("quantity", Some(dec(raw))).unwrap(), dec(raw), "{}", raw);
        }
    }

    #[test]
    fn test_parse_amount_rejects_excess_precision() {
        for raw in ["0.000000001", "1.123456789"] {
            assert!(
                matches!(parse_amount("quantity", Some(dec(raw))), Err(AppError::Validation(_))),
                "{}",
                raw
            );
        }
    }

    #[test]
    fn test_parse_amount_rejects_overflow() {
        for raw in ["10000000000", "100000000000", "1e12"] {
            assert!(
                matches!(parse_amount("price", Some(dec(raw))), Err(AppError::Validation(_))),
                "{}",
                raw
            );
        }
    }

    #[test]
    fn test_parse_amount_requires_positive_value() {
        assert!(matches!(parse_amount("price", None), Err(AppError::Validation(_))));
        assert!(matches!(parse_amount("price", Some(dec("0"))), Err(AppError::Validation(_))));
        assert!(matches!(parse_amount("price", Some(dec("-2"))), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_percent_change_guards_non_positive_base() {
        let hundred = BigDecimal::from(100);
        assert_eq!(percent_change(&hundred, &BigDecimal::from(0)), BigDecimal::from(0));
        assert_eq!(percent_change(&hundred, &BigDecimal::from(-5)), BigDecimal::from(0));
        assert_eq!(percent_change(&BigDecimal::from(110), &hundred), BigDecimal::from(10));
        assert_eq!(
            percent_change(&BigDecimal::from(75), &hundred),
            BigDecimal::from_str("-25").unwrap()
        );
    }
}
