//! Column codecs for SQLite storage.
//!
//! SQLite has no native decimal or date types, so amounts are stored as their
//! canonical decimal string, calendar dates as `YYYY-MM-DD` and instants as
//! RFC 3339 in UTC. Reading a malformed column is an error rather than a
//! silent zero: a ledger total built from a defaulted amount would be wrong.

use std::str::FromStr;

use billbook_core::errors::{DatabaseError, Error, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn format_decimal(value: &Decimal) -> String {
    value.normalize().to_string()
}

pub fn parse_decimal(raw: &str, column: &str) -> Result<Decimal> {
    Decimal::from_str(raw.trim()).map_err(|e| corrupt(column, raw, e))
}

pub fn format_date(value: NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

pub fn parse_date(raw: &str, column: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|e| corrupt(column, raw, e))
}

pub fn format_datetime_utc(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn parse_datetime_utc(raw: &str, column: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| corrupt(column, raw, e))
}

/// Counters and days are `INTEGER` columns with CHECK constraints, so a
/// negative value means the row was written outside this crate.
pub fn to_u32(value: i32, column: &str) -> Result<u32> {
    u32::try_from(value).map_err(|e| corrupt(column, &value.to_string(), e))
}

pub fn to_i32(value: u32, column: &str) -> Result<i32> {
    i32::try_from(value).map_err(|_| {
        Error::invalid_input(format!("{} out of range: {}", column, value))
    })
}

fn corrupt(column: &str, raw: &str, err: impl std::fmt::Display) -> Error {
    Error::Database(DatabaseError::Internal(format!(
        "invalid value '{}' in column {}: {}",
        raw, column, err
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decimal_keeps_cents() {
        assert_eq!(format_decimal(&dec!(150.50)), "150.5");
        assert_eq!(parse_decimal("150.5", "amount").unwrap(), dec!(150.50));
        assert_eq!(parse_decimal(" 0 ", "amount").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_malformed_decimal_is_an_error() {
        let err = parse_decimal("abc", "amount").unwrap_err();
        assert!(matches!(err, Error::Database(DatabaseError::Internal(_))));
    }

    #[test]
    fn test_date_format() {
        let date = NaiveDate::from_ymd_opt(2025, 2, 28).unwrap();
        assert_eq!(format_date(date), "2025-02-28");
        assert_eq!(parse_date("2025-02-28", "due_date").unwrap(), date);
        assert!(parse_date("2025-02-30", "due_date").is_err());
    }

    #[test]
    fn test_datetime_is_stored_in_utc() {
        let instant = Utc.with_ymd_and_hms(2025, 6, 15, 12, 30, 0).unwrap();
        let raw = format_datetime_utc(&instant);
        assert_eq!(raw, "2025-06-15T12:30:00Z");
        assert_eq!(parse_datetime_utc(&raw, "paid_at").unwrap(), instant);
        assert_eq!(
            parse_datetime_utc("2025-06-15T14:30:00+02:00", "paid_at").unwrap(),
            instant
        );
    }

    #[test]
    fn test_negative_counter_is_rejected() {
        assert_eq!(to_u32(3, "paid_installments").unwrap(), 3);
        assert!(to_u32(-1, "paid_installments").is_err());
    }
}
