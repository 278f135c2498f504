//! Ledger repository and service traits.
//!
//! These traits define the contract for ledger persistence and the ledger
//! engine without any database-specific types.

use async_trait::async_trait;

use super::ledger_model::{CategorySummary, LedgerItem, LedgerPeriod, PeriodChangeSet};
use crate::errors::Result;
use crate::obligations::ObligationRef;
use crate::utils::YearMonth;

/// Trait defining the contract for ledger period persistence.
#[async_trait]
pub trait LedgerRepositoryTrait: Send + Sync {
    /// Loads the user's period for `period` with its items ordered by due date.
    fn get_period(&self, user_id: &str, period: YearMonth) -> Result<Option<LedgerPeriod>>;

    /// Lists every period of the user, newest first.
    fn list_periods(&self, user_id: &str) -> Result<Vec<LedgerPeriod>>;

    /// Finds the period owning `item_id`, restricted to periods of `user_id`.
    fn find_item_period(&self, user_id: &str, item_id: &str) -> Result<Option<LedgerPeriod>>;

    /// Lists the Paid items of one obligation across all periods.
    fn list_paid_items(&self, obligation: &ObligationRef) -> Result<Vec<LedgerItem>>;

    /// Atomically applies a change set and returns the persisted period.
    ///
    /// Fails with `InvalidState` when the guard's expected status no longer
    /// matches, and `NotFound` when the guarded item is gone. Nothing is
    /// written in either case.
    async fn commit(&self, changes: PeriodChangeSet) -> Result<LedgerPeriod>;
}

/// Trait defining the contract for the ledger engine.
#[async_trait]
pub trait LedgerServiceTrait: Send + Sync {
    /// Creates the period if needed and rebuilds its items.
    async fn generate(&self, user_id: &str, month: u32, year: i32) -> Result<LedgerPeriod>;

    /// Rebuilds the items of an existing period.
    async fn update(&self, user_id: &str, month: u32, year: i32) -> Result<LedgerPeriod>;

    fn get_by_month(&self, user_id: &str, month: u32, year: i32) -> Result<Option<LedgerPeriod>>;

    fn list_all(&self, user_id: &str) -> Result<Vec<LedgerPeriod>>;

    /// Groups the period's items by category, in first-appearance order.
    fn get_by_category(
        &self,
        user_id: &str,
        month: u32,
        year: i32,
    ) -> Result<Vec<CategorySummary>>;

    /// Marks an item Paid, advances its obligation counter and rebuilds the period.
    async fn pay_item(&self, user_id: &str, item_id: &str) -> Result<LedgerPeriod>;

    /// Reverts a Paid item, rescans its obligation counter and rebuilds the period.
    async fn unpay_item(&self, user_id: &str, item_id: &str) -> Result<LedgerPeriod>;
}
