use std::sync::Arc;

use chrono::{Days, NaiveDate};
use log::debug;
use rust_decimal::{Decimal, RoundingStrategy};

use super::reports_model::{
    CategoryExpense, CreditCardSummary, Dashboard, FinancialSummary, MonthlyComparison,
};
use super::reports_traits::ReportServiceTrait;
use crate::errors::Result;
use crate::income::IncomeEntryRepositoryTrait;
use crate::ledger::aggregate::{aggregate, group_by_category};
use crate::ledger::{ItemStatus, LedgerItem, LedgerPeriod, LedgerRepositoryTrait};
use crate::obligations::{CreditCardRepositoryTrait, CreditPurchaseRepositoryTrait};
use crate::utils::{Clock, YearMonth};

/// Window used by the dashboard's upcoming bills.
pub const DASHBOARD_UPCOMING_DAYS: u32 = 7;

/// Reports built from stored periods. Never generates or mutates a period.
pub struct ReportService {
    ledger: Arc<dyn LedgerRepositoryTrait>,
    credit_cards: Arc<dyn CreditCardRepositoryTrait>,
    credit_purchases: Arc<dyn CreditPurchaseRepositoryTrait>,
    income_entries: Arc<dyn IncomeEntryRepositoryTrait>,
    clock: Arc<dyn Clock>,
}

impl ReportService {
    pub fn new(
        ledger: Arc<dyn LedgerRepositoryTrait>,
        credit_cards: Arc<dyn CreditCardRepositoryTrait>,
        credit_purchases: Arc<dyn CreditPurchaseRepositoryTrait>,
        income_entries: Arc<dyn IncomeEntryRepositoryTrait>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            credit_cards,
            credit_purchases,
            income_entries,
            clock,
        }
    }

    fn current_period(&self, user_id: &str) -> Result<Option<LedgerPeriod>> {
        let current = YearMonth::of(self.clock.today());
        self.ledger.get_period(user_id, current)
    }

    fn current_items<F>(&self, user_id: &str, keep: F) -> Result<Vec<LedgerItem>>
    where
        F: Fn(&LedgerItem) -> bool,
    {
        let mut items: Vec<LedgerItem> = self
            .current_period(user_id)?
            .map(|period| period.items)
            .unwrap_or_default()
            .into_iter()
            .filter(|item| keep(item))
            .collect();
        items.sort_by_key(|item| item.due_date);
        Ok(items)
    }
}

/// `part / whole * 100`, rounded half away from zero to 2 places; 0 when `whole` is 0.
pub fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    (part / whole * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

impl ReportServiceTrait for ReportService {
    fn financial_summary(
        &self,
        user_id: &str,
        month: u32,
        year: i32,
    ) -> Result<FinancialSummary> {
        let target = YearMonth::new(year, month)?;
        let totals = match self.ledger.get_period(user_id, target)? {
            Some(period) => period.totals(),
            None => {
                debug!("No ledger period {} for user {}, reporting income only", target, user_id);
                let income = self.income_entries.list_by_user_and_month(user_id, target)?;
                aggregate(&[], &income, target, self.clock.today())
            }
        };
        Ok(FinancialSummary::from_totals(month, year, totals))
    }

    fn expenses_by_category(
        &self,
        user_id: &str,
        month: u32,
        year: i32,
    ) -> Result<Vec<CategoryExpense>> {
        let target = YearMonth::new(year, month)?;
        let Some(period) = self.ledger.get_period(user_id, target)? else {
            return Ok(Vec::new());
        };
        Ok(group_by_category(&period.items)
            .into_iter()
            .map(|group| CategoryExpense {
                percentage: percentage(group.total, period.total_expenses),
                category: group.category,
                total: group.total,
                paid: group.paid,
                pending: group.pending,
                overdue: group.overdue,
            })
            .collect())
    }

    fn upcoming_bills(&self, user_id: &str, days: u32) -> Result<Vec<LedgerItem>> {
        let today = self.clock.today();
        // Windows running past the calendar's end cover everything ahead.
        let until = today
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX);
        self.current_items(user_id, |item| {
            item.status != ItemStatus::Paid && item.due_date >= today && item.due_date <= until
        })
    }

    fn overdue_bills(&self, user_id: &str) -> Result<Vec<LedgerItem>> {
        self.current_items(user_id, |item| item.status == ItemStatus::Overdue)
    }

    fn credit_cards_summary(&self, user_id: &str) -> Result<Vec<CreditCardSummary>> {
        let cards = self.credit_cards.list_by_user(user_id)?;
        let purchases = self.credit_purchases.list_by_user(user_id)?;

        Ok(cards
            .into_iter()
            .map(|card| {
                let on_card: Vec<_> = purchases.iter().filter(|p| p.card_id == card.id).collect();
                let used_limit: Decimal = on_card
                    .iter()
                    .map(|p| {
                        let remaining = p.total_installments.saturating_sub(p.paid_installments);
                        p.amount_per_installment * Decimal::from(remaining)
                    })
                    .sum();
                let active_purchases = on_card
                    .iter()
                    .filter(|p| p.paid_installments < p.total_installments)
                    .count();
                CreditCardSummary {
                    available_limit: card.total_limit - used_limit,
                    usage_percentage: percentage(used_limit, card.total_limit),
                    id: card.id,
                    name: card.name,
                    due_day: card.due_day,
                    total_limit: card.total_limit,
                    used_limit,
                    active_purchases,
                }
            })
            .collect())
    }

    fn yearly_comparison(&self, user_id: &str, year: i32) -> Result<Vec<MonthlyComparison>> {
        YearMonth::new(year, 1)?;
        let mut periods: Vec<LedgerPeriod> = self
            .ledger
            .list_periods(user_id)?
            .into_iter()
            .filter(|period| period.year == year)
            .collect();
        periods.sort_by_key(|period| period.month);
        Ok(periods
            .into_iter()
            .map(|period| MonthlyComparison {
                month: period.month,
                year: period.year,
                total_income: period.total_income,
                total_expenses: period.total_expenses,
                balance: period.balance,
                total_paid: period.total_paid,
                total_pending: period.total_pending,
                total_overdue: period.total_overdue,
            })
            .collect())
    }

    fn dashboard(&self, user_id: &str) -> Result<Dashboard> {
        let current = YearMonth::of(self.clock.today());
        Ok(Dashboard {
            month: current.month,
            year: current.year,
            financial_summary: self.financial_summary(user_id, current.month, current.year)?,
            credit_cards_summary: self.credit_cards_summary(user_id)?,
            expenses_by_category: self.expenses_by_category(
                user_id,
                current.month,
                current.year,
            )?,
            upcoming_bills: self.upcoming_bills(user_id, DASHBOARD_UPCOMING_DAYS)?,
            overdue_bills: self.overdue_bills(user_id)?,
        })
    }
}
