//! Ledger domain models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::obligations::{ObligationKind, ObligationRef};
use crate::utils::YearMonth;

/// Payment status of a ledger item.
///
/// `Pending -> Paid` (pay), `Paid -> Pending` (unpay), `Pending -> Overdue`
/// (sweep, time driven only) and `Overdue -> Paid` (pay).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    Pending,
    Paid,
    Overdue,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "PENDING",
            ItemStatus::Paid => "PAID",
            ItemStatus::Overdue => "OVERDUE",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PENDING" => Ok(ItemStatus::Pending),
            "PAID" => Ok(ItemStatus::Paid),
            "OVERDUE" => Ok(ItemStatus::Overdue),
            other => Err(Error::invalid_input(format!(
                "unknown item status '{}'",
                other
            ))),
        }
    }
}

/// One concrete due payment inside a period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerItem {
    pub id: String,
    pub period_id: String,
    pub obligation_kind: ObligationKind,
    pub obligation_id: String,
    /// Display name, `"Name (k/N)"` for installment items.
    pub name: String,
    /// 1-indexed installment, absent for fixed bills.
    pub installment_number: Option<u32>,
    pub due_date: NaiveDate,
    pub amount: Decimal,
    pub status: ItemStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub category_name: String,
}

impl LedgerItem {
    /// Item ids are derived from the period and the obligation; a period
    /// holds at most one item per obligation.
    pub fn derive_id(period_id: &str, obligation: &ObligationRef) -> String {
        format!("{}:{}:{}", period_id, obligation.kind, obligation.id)
    }

    pub fn obligation_ref(&self) -> ObligationRef {
        ObligationRef::new(self.obligation_kind, self.obligation_id.clone())
    }

    pub fn is_paid(&self) -> bool {
        self.status == ItemStatus::Paid
    }
}

/// Period-level totals, always derived from the item set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTotals {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub total_paid: Decimal,
    pub total_pending: Decimal,
    pub total_overdue: Decimal,
    pub balance: Decimal,
}

/// The per-(user, month, year) ledger and its items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerPeriod {
    pub id: String,
    pub user_id: String,
    pub month: u32,
    pub year: i32,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub total_paid: Decimal,
    pub total_pending: Decimal,
    pub total_overdue: Decimal,
    pub balance: Decimal,
    /// Ordered by due date ascending.
    pub items: Vec<LedgerItem>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    /// Bumped by every commit; 0 for a period never stored. A commit built
    /// from a stale read fails instead of overwriting newer items.
    pub version: i64,
}

impl LedgerPeriod {
    /// A fresh, empty period.
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        period: YearMonth,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            month: period.month,
            year: period.year,
            total_income: Decimal::ZERO,
            total_expenses: Decimal::ZERO,
            total_paid: Decimal::ZERO,
            total_pending: Decimal::ZERO,
            total_overdue: Decimal::ZERO,
            balance: Decimal::ZERO,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn year_month(&self) -> YearMonth {
        YearMonth {
            year: self.year,
            month: self.month,
        }
    }

    pub fn totals(&self) -> LedgerTotals {
        LedgerTotals {
            total_income: self.total_income,
            total_expenses: self.total_expenses,
            total_paid: self.total_paid,
            total_pending: self.total_pending,
            total_overdue: self.total_overdue,
            balance: self.balance,
        }
    }

    pub fn apply_totals(&mut self, totals: LedgerTotals) {
        self.total_income = totals.total_income;
        self.total_expenses = totals.total_expenses;
        self.total_paid = totals.total_paid;
        self.total_pending = totals.total_pending;
        self.total_overdue = totals.total_overdue;
        self.balance = totals.balance;
    }

    pub fn item(&self, item_id: &str) -> Option<&LedgerItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn item_mut(&mut self, item_id: &str) -> Option<&mut LedgerItem> {
        self.items.iter_mut().find(|item| item.id == item_id)
    }
}

/// Items of one category within a period, with per-status sums.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category: String,
    pub total: Decimal,
    pub paid: Decimal,
    pub pending: Decimal,
    pub overdue: Decimal,
    pub items: Vec<LedgerItem>,
}

/// Precondition checked by the store inside the commit transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemGuard {
    pub item_id: String,
    pub expected_status: ItemStatus,
}

/// New value of an obligation's paid-installment counter. The store only
/// writes it while the counter still holds `previous`.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterUpdate {
    pub obligation: ObligationRef,
    pub previous: u32,
    pub paid_installments: u32,
}

/// Everything one generate/update/pay/unpay call persists.
///
/// Stores apply a change set atomically: guard check, period version check,
/// item replacement and counter writes either all happen or none do.
#[derive(Debug, Clone)]
pub struct PeriodChangeSet {
    /// Full new state of the period, items included.
    pub period: LedgerPeriod,
    pub guard: Option<ItemGuard>,
    pub counter_updates: Vec<CounterUpdate>,
}

impl PeriodChangeSet {
    pub fn rebuild(period: LedgerPeriod) -> Self {
        Self {
            period,
            guard: None,
            counter_updates: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ItemStatus::Overdue).unwrap(),
            "\"OVERDUE\""
        );
        assert_eq!("PAID".parse::<ItemStatus>().unwrap(), ItemStatus::Paid);
        assert!("paid".parse::<ItemStatus>().is_err());
    }

    #[test]
    fn test_derive_id_is_stable() {
        let reference = ObligationRef::new(ObligationKind::Variable, "v1");
        assert_eq!(LedgerItem::derive_id("p1", &reference), "p1:VARIABLE:v1");
        assert_eq!(
            LedgerItem::derive_id("p1", &reference),
            LedgerItem::derive_id("p1", &reference.clone())
        );
    }

    #[test]
    fn test_period_serializes_camel_case() {
        let now = chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let period = LedgerPeriod::new("p1", "u1", YearMonth::new(2025, 1).unwrap(), now);
        let json = serde_json::to_value(&period).unwrap();
        assert!(json.get("totalOverdue").is_some());
        assert!(json.get("userId").is_some());
        assert_eq!(json["items"].as_array().unwrap().len(), 0);
    }
}
