//! Database models for ledger periods and items.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use billbook_core::ledger::{ItemStatus, LedgerItem, LedgerPeriod};
use billbook_core::obligations::ObligationKind;
use billbook_core::Result;

use crate::utils::{
    format_date, format_datetime_utc, format_decimal, parse_date, parse_datetime_utc,
    parse_decimal, to_i32, to_u32,
};

/// Database model for ledger periods. Totals are decimal strings.
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::ledger_periods)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LedgerPeriodDB {
    pub id: String,
    pub user_id: String,
    pub month: i32,
    pub year: i32,
    pub total_income: String,
    pub total_expenses: String,
    pub total_paid: String,
    pub total_pending: String,
    pub total_overdue: String,
    pub balance: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub version: i64,
}

/// Database model for ledger items.
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    Associations,
    Selectable,
    PartialEq,
    Debug,
    Clone,
)]
#[diesel(belongs_to(LedgerPeriodDB, foreign_key = period_id))]
#[diesel(table_name = crate::schema::ledger_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LedgerItemDB {
    pub id: String,
    pub period_id: String,
    pub obligation_kind: String,
    pub obligation_id: String,
    pub name: String,
    pub installment_number: Option<i32>,
    pub due_date: String,
    pub amount: String,
    pub status: String,
    pub paid_at: Option<String>,
    pub category_name: String,
}

impl LedgerPeriodDB {
    pub fn from_domain(period: &LedgerPeriod) -> Result<Self> {
        Ok(Self {
            id: period.id.clone(),
            user_id: period.user_id.clone(),
            month: to_i32(period.month, "month")?,
            year: period.year,
            total_income: format_decimal(&period.total_income),
            total_expenses: format_decimal(&period.total_expenses),
            total_paid: format_decimal(&period.total_paid),
            total_pending: format_decimal(&period.total_pending),
            total_overdue: format_decimal(&period.total_overdue),
            balance: format_decimal(&period.balance),
            created_at: period.created_at,
            updated_at: period.updated_at,
            version: period.version,
        })
    }

    /// Rebuilds the domain period from its row and its item rows.
    pub fn into_domain(self, items: Vec<LedgerItemDB>) -> Result<LedgerPeriod> {
        Ok(LedgerPeriod {
            month: to_u32(self.month, "ledger_periods.month")?,
            year: self.year,
            total_income: parse_decimal(&self.total_income, "ledger_periods.total_income")?,
            total_expenses: parse_decimal(&self.total_expenses, "ledger_periods.total_expenses")?,
            total_paid: parse_decimal(&self.total_paid, "ledger_periods.total_paid")?,
            total_pending: parse_decimal(&self.total_pending, "ledger_periods.total_pending")?,
            total_overdue: parse_decimal(&self.total_overdue, "ledger_periods.total_overdue")?,
            balance: parse_decimal(&self.balance, "ledger_periods.balance")?,
            items: items
                .into_iter()
                .map(LedgerItem::try_from)
                .collect::<Result<Vec<_>>>()?,
            id: self.id,
            user_id: self.user_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            version: self.version,
        })
    }
}

impl LedgerItemDB {
    pub fn from_domain(item: &LedgerItem) -> Result<Self> {
        Ok(Self {
            id: item.id.clone(),
            period_id: item.period_id.clone(),
            obligation_kind: item.obligation_kind.as_str().to_string(),
            obligation_id: item.obligation_id.clone(),
            name: item.name.clone(),
            installment_number: item
                .installment_number
                .map(|n| to_i32(n, "installment_number"))
                .transpose()?,
            due_date: format_date(item.due_date),
            amount: format_decimal(&item.amount),
            status: item.status.as_str().to_string(),
            paid_at: item.paid_at.as_ref().map(format_datetime_utc),
            category_name: item.category_name.clone(),
        })
    }
}

impl TryFrom<LedgerItemDB> for LedgerItem {
    type Error = billbook_core::Error;

    fn try_from(db: LedgerItemDB) -> Result<Self> {
        Ok(Self {
            obligation_kind: db.obligation_kind.parse::<ObligationKind>()?,
            installment_number: db
                .installment_number
                .map(|n| to_u32(n, "ledger_items.installment_number"))
                .transpose()?,
            due_date: parse_date(&db.due_date, "ledger_items.due_date")?,
            amount: parse_decimal(&db.amount, "ledger_items.amount")?,
            status: db.status.parse::<ItemStatus>()?,
            paid_at: db
                .paid_at
                .as_deref()
                .map(|raw| parse_datetime_utc(raw, "ledger_items.paid_at"))
                .transpose()?,
            id: db.id,
            period_id: db.period_id,
            obligation_id: db.obligation_id,
            name: db.name,
            category_name: db.category_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal_macros::dec;

    #[test]
    fn test_paid_item_row_keeps_every_field() {
        let item = LedgerItem {
            id: "p1:CREDIT:c1".to_string(),
            period_id: "p1".to_string(),
            obligation_kind: ObligationKind::Credit,
            obligation_id: "c1".to_string(),
            name: "Laptop (2/10)".to_string(),
            installment_number: Some(2),
            due_date: NaiveDate::from_ymd_opt(2025, 2, 28).unwrap(),
            amount: dec!(129.90),
            status: ItemStatus::Paid,
            paid_at: Some(Utc.with_ymd_and_hms(2025, 2, 20, 9, 15, 0).unwrap()),
            category_name: "Electronics".to_string(),
        };

        let row = LedgerItemDB::from_domain(&item).unwrap();
        assert_eq!(row.obligation_kind, "CREDIT");
        assert_eq!(row.status, "PAID");
        assert_eq!(row.due_date, "2025-02-28");
        assert_eq!(row.paid_at.as_deref(), Some("2025-02-20T09:15:00Z"));

        assert_eq!(LedgerItem::try_from(row).unwrap(), item);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let row = LedgerItemDB {
            id: "i".to_string(),
            period_id: "p".to_string(),
            obligation_kind: "FIXED".to_string(),
            obligation_id: "f".to_string(),
            name: "Rent".to_string(),
            installment_number: None,
            due_date: "2025-01-05".to_string(),
            amount: "10".to_string(),
            status: "LATE".to_string(),
            paid_at: None,
            category_name: "Home".to_string(),
        };
        assert!(LedgerItem::try_from(row).is_err());
    }
}
