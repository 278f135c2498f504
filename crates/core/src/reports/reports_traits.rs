use super::reports_model::{
    CategoryExpense, CreditCardSummary, Dashboard, FinancialSummary, MonthlyComparison,
};
use crate::errors::Result;
use crate::ledger::LedgerItem;

/// Read-only reports over generated ledger periods.
pub trait ReportServiceTrait: Send + Sync {
    /// Totals of the period; income only when the month was never generated.
    fn financial_summary(&self, user_id: &str, month: u32, year: i32)
        -> Result<FinancialSummary>;

    fn expenses_by_category(
        &self,
        user_id: &str,
        month: u32,
        year: i32,
    ) -> Result<Vec<CategoryExpense>>;

    /// Unpaid items of the current month due within the next `days` days.
    fn upcoming_bills(&self, user_id: &str, days: u32) -> Result<Vec<LedgerItem>>;

    /// Overdue items of the current month.
    fn overdue_bills(&self, user_id: &str) -> Result<Vec<LedgerItem>>;

    fn credit_cards_summary(&self, user_id: &str) -> Result<Vec<CreditCardSummary>>;

    /// Generated periods of `year`, ascending by month.
    fn yearly_comparison(&self, user_id: &str, year: i32) -> Result<Vec<MonthlyComparison>>;

    /// Every report for the current month.
    fn dashboard(&self, user_id: &str) -> Result<Dashboard>;
}
