//! Period totals derived from the item set and the month's income.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::ledger_model::{CategorySummary, ItemStatus, LedgerItem, LedgerTotals};
use crate::income::IncomeEntry;
use crate::utils::YearMonth;

/// Recomputes every total from scratch.
///
/// Income counts only when dated inside `period` and on or before `today`.
/// `balance = total_income - total_paid`.
pub fn aggregate(
    items: &[LedgerItem],
    income: &[IncomeEntry],
    period: YearMonth,
    today: NaiveDate,
) -> LedgerTotals {
    let total_income: Decimal = income
        .iter()
        .filter(|entry| period.contains(entry.entry_date) && entry.is_received_by(today))
        .map(|entry| entry.amount)
        .sum();

    let mut totals = LedgerTotals {
        total_income,
        ..LedgerTotals::default()
    };
    for item in items {
        totals.total_expenses += item.amount;
        match item.status {
            ItemStatus::Paid => totals.total_paid += item.amount,
            ItemStatus::Pending => totals.total_pending += item.amount,
            ItemStatus::Overdue => totals.total_overdue += item.amount,
        }
    }
    totals.balance = totals.total_income - totals.total_paid;
    totals
}

/// Groups items by category name, keeping first-appearance order.
pub fn group_by_category(items: &[LedgerItem]) -> Vec<CategorySummary> {
    let mut groups: Vec<CategorySummary> = Vec::new();
    for item in items {
        let index = match groups.iter().position(|g| g.category == item.category_name) {
            Some(index) => index,
            None => {
                groups.push(CategorySummary {
                    category: item.category_name.clone(),
                    total: Decimal::ZERO,
                    paid: Decimal::ZERO,
                    pending: Decimal::ZERO,
                    overdue: Decimal::ZERO,
                    items: Vec::new(),
                });
                groups.len() - 1
            }
        };
        let group = &mut groups[index];
        group.total += item.amount;
        match item.status {
            ItemStatus::Paid => group.paid += item.amount,
            ItemStatus::Pending => group.pending += item.amount,
            ItemStatus::Overdue => group.overdue += item.amount,
        }
        group.items.push(item.clone());
    }
    groups
}
