use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::{LedgerItem, LedgerTotals};

/// Period totals plus the money still available to spend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    pub month: u32,
    pub year: i32,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub total_paid: Decimal,
    pub total_pending: Decimal,
    pub total_overdue: Decimal,
    pub balance: Decimal,
    pub available_money: Decimal,
}

impl FinancialSummary {
    pub fn from_totals(month: u32, year: i32, totals: LedgerTotals) -> Self {
        Self {
            month,
            year,
            total_income: totals.total_income,
            total_expenses: totals.total_expenses,
            total_paid: totals.total_paid,
            total_pending: totals.total_pending,
            total_overdue: totals.total_overdue,
            balance: totals.balance,
            available_money: totals.balance,
        }
    }
}

/// Spending of one category and its share of the month's expenses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryExpense {
    pub category: String,
    pub total: Decimal,
    pub paid: Decimal,
    pub pending: Decimal,
    pub overdue: Decimal,
    /// Percentage of the period's total expenses, 2 decimal places.
    pub percentage: Decimal,
}

/// Credit limit usage of one card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreditCardSummary {
    pub id: String,
    pub name: String,
    pub due_day: u32,
    pub total_limit: Decimal,
    /// Sum of the remaining installments of every purchase on the card.
    pub used_limit: Decimal,
    pub available_limit: Decimal,
    pub usage_percentage: Decimal,
    /// Purchases with installments left to pay.
    pub active_purchases: usize,
}

/// Totals of one generated month, as listed in a yearly comparison.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyComparison {
    pub month: u32,
    pub year: i32,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub balance: Decimal,
    pub total_paid: Decimal,
    pub total_pending: Decimal,
    pub total_overdue: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub month: u32,
    pub year: i32,
    pub financial_summary: FinancialSummary,
    pub credit_cards_summary: Vec<CreditCardSummary>,
    pub expenses_by_category: Vec<CategoryExpense>,
    pub upcoming_bills: Vec<LedgerItem>,
    pub overdue_bills: Vec<LedgerItem>,
}
