use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Upper bound accepted for ledger years.
pub const MAX_LEDGER_YEAR: i32 = 9999;

/// A calendar month of a specific year, the key of a ledger period.
///
/// Ordering is chronological (year first, then month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Validates and builds a year/month pair.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::invalid_input(format!(
                "month must be between 1 and 12, got {}",
                month
            )));
        }
        if !(1..=MAX_LEDGER_YEAR).contains(&year) {
            return Err(Error::invalid_input(format!(
                "year must be between 1 and {}, got {}",
                MAX_LEDGER_YEAR, year
            )));
        }
        Ok(Self { year, month })
    }

    /// Parses textual month and year values, as received from a request.
    pub fn parse(month: &str, year: &str) -> Result<Self> {
        let month: u32 = month.trim().parse()?;
        let year: i32 = year.trim().parse()?;
        Self::new(year, month)
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        // Constructed through `new`, so day 1 always exists.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.day_clamped(31)
    }

    pub fn days_in_month(&self) -> u32 {
        days_in_month(self.year, self.month)
    }

    /// Returns `day` of this month, clamped to the month's length.
    /// A due day of 31 lands on Feb 28 (29 in leap years).
    pub fn day_clamped(&self, day: u32) -> NaiveDate {
        let day = day.clamp(1, self.days_in_month());
        NaiveDate::from_ymd_opt(self.year, self.month, day).unwrap_or(NaiveDate::MIN)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::of(date) == *self
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = Error;

    /// Parses `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| Error::invalid_input(format!("expected YYYY-MM, got '{}'", s)))?;
        Self::parse(month, year)
    }
}

/// Number of days in the given month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(31)
}

/// Calendar-month difference from `from`'s month to `to`.
///
/// Day of month is ignored: 2025-01-31 to 2025-02 is one month.
pub fn months_between(from: NaiveDate, to: YearMonth) -> i32 {
    (to.year - from.year()) * 12 + (to.month as i32 - from.month() as i32)
}

/// Start-of-day instant of a date, in UTC.
pub fn start_of_day_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::default()).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_year_month_rejects_out_of_range_month() {
        assert!(YearMonth::new(2025, 0).is_err());
        assert!(YearMonth::new(2025, 13).is_err());
        assert!(YearMonth::new(0, 5).is_err());
        assert!(YearMonth::new(2025, 12).is_ok());
    }

    #[test]
    fn test_year_month_parse_rejects_non_integers() {
        assert!(YearMonth::parse("march", "2025").is_err());
        assert!(YearMonth::parse("3", "20x5").is_err());
        assert!(YearMonth::parse("3.5", "2025").is_err());
        assert_eq!(
            YearMonth::parse(" 3 ", "2025").unwrap(),
            YearMonth::new(2025, 3).unwrap()
        );
    }

    #[test]
    fn test_year_month_from_str() {
        let ym: YearMonth = "2024-02".parse().unwrap();
        assert_eq!(ym, YearMonth::new(2024, 2).unwrap());
        assert_eq!(ym.to_string(), "2024-02");
        assert!("2024/02".parse::<YearMonth>().is_err());
        assert!("2024-13".parse::<YearMonth>().is_err());
    }

    #[test]
    fn test_day_clamped_handles_short_months() {
        let feb_2025 = YearMonth::new(2025, 2).unwrap();
        let feb_2024 = YearMonth::new(2024, 2).unwrap();
        let apr_2025 = YearMonth::new(2025, 4).unwrap();
        assert_eq!(feb_2025.day_clamped(31), date(2025, 2, 28));
        assert_eq!(feb_2024.day_clamped(31), date(2024, 2, 29));
        assert_eq!(apr_2025.day_clamped(31), date(2025, 4, 30));
        assert_eq!(apr_2025.day_clamped(15), date(2025, 4, 15));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2025, 1), 31);
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2025, 12), 31);
    }

    #[test]
    fn test_months_between_ignores_day_of_month() {
        let jan = YearMonth::new(2025, 1).unwrap();
        let mar = YearMonth::new(2025, 3).unwrap();
        let next_feb = YearMonth::new(2026, 2).unwrap();
        assert_eq!(months_between(date(2025, 1, 31), jan), 0);
        assert_eq!(months_between(date(2025, 1, 31), mar), 2);
        assert_eq!(months_between(date(2025, 1, 10), next_feb), 13);
        assert_eq!(months_between(date(2025, 3, 1), jan), -2);
    }

    #[test]
    fn test_year_month_ordering_and_next() {
        let dec = YearMonth::new(2024, 12).unwrap();
        let jan = dec.next();
        assert_eq!(jan, YearMonth::new(2025, 1).unwrap());
        assert!(dec < jan);
        assert!(YearMonth::new(2024, 11).unwrap() < dec);
    }
}
