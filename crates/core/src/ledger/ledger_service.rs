use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::{debug, info};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::aggregate::group_by_category;
use super::ledger_model::{CategorySummary, ItemGuard, LedgerPeriod, PeriodChangeSet};
use super::ledger_traits::{LedgerRepositoryTrait, LedgerServiceTrait};
use super::pipeline::rebuild_period;
use super::reconciliation::{apply_pay, apply_unpay, mark_paid, mark_unpaid};
use crate::errors::{Error, Result};
use crate::income::IncomeEntryRepositoryTrait;
use crate::obligations::{
    CreditPurchaseRepositoryTrait, FixedBillRepositoryTrait, Obligation, ObligationRef,
    VariableBillRepositoryTrait,
};
use crate::utils::{Clock, YearMonth};

/// Ledger engine: generation, regeneration and pay/unpay reconciliation.
///
/// Mutating calls of one user run one at a time within a service; each
/// persists through a single atomic `commit`. Across services sharing a
/// store, the period version and counter preconditions in the change set
/// turn a lost update into `InvalidState`.
pub struct LedgerService {
    fixed_bills: Arc<dyn FixedBillRepositoryTrait>,
    variable_bills: Arc<dyn VariableBillRepositoryTrait>,
    credit_purchases: Arc<dyn CreditPurchaseRepositoryTrait>,
    income_entries: Arc<dyn IncomeEntryRepositoryTrait>,
    ledger: Arc<dyn LedgerRepositoryTrait>,
    clock: Arc<dyn Clock>,
    user_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl LedgerService {
    pub fn new(
        fixed_bills: Arc<dyn FixedBillRepositoryTrait>,
        variable_bills: Arc<dyn VariableBillRepositoryTrait>,
        credit_purchases: Arc<dyn CreditPurchaseRepositoryTrait>,
        income_entries: Arc<dyn IncomeEntryRepositoryTrait>,
        ledger: Arc<dyn LedgerRepositoryTrait>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            fixed_bills,
            variable_bills,
            credit_purchases,
            income_entries,
            ledger,
            clock,
            user_locks: DashMap::new(),
        }
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.user_locks
            .entry(user_id.to_string())
            .or_default()
            .clone()
    }

    /// Every obligation of the user, with current counters.
    fn load_obligations(&self, user_id: &str) -> Result<Vec<Obligation>> {
        let mut obligations: Vec<Obligation> = Vec::new();
        obligations.extend(
            self.fixed_bills
                .list_by_user(user_id)?
                .into_iter()
                .map(Obligation::from),
        );
        obligations.extend(
            self.variable_bills
                .list_by_user(user_id)?
                .into_iter()
                .map(Obligation::from),
        );
        obligations.extend(
            self.credit_purchases
                .list_by_user(user_id)?
                .into_iter()
                .map(Obligation::from),
        );
        Ok(obligations)
    }

    fn find_obligation<'a>(
        obligations: &'a mut [Obligation],
        reference: &ObligationRef,
    ) -> Result<&'a mut Obligation> {
        obligations
            .iter_mut()
            .find(|obligation| obligation.reference() == *reference)
            .ok_or_else(|| Error::not_found(format!("obligation {}", reference)))
    }

    fn rebuild(
        &self,
        period: LedgerPeriod,
        obligations: &[Obligation],
        now: DateTime<Utc>,
    ) -> Result<LedgerPeriod> {
        let income = self
            .income_entries
            .list_by_user_and_month(&period.user_id, period.year_month())?;
        Ok(rebuild_period(period, obligations, &income, now))
    }

    async fn regenerate(&self, period: LedgerPeriod) -> Result<LedgerPeriod> {
        let obligations = self.load_obligations(&period.user_id)?;
        let rebuilt = self.rebuild(period, &obligations, self.clock.now())?;
        self.ledger.commit(PeriodChangeSet::rebuild(rebuilt)).await
    }
}

#[async_trait]
impl LedgerServiceTrait for LedgerService {
    async fn generate(&self, user_id: &str, month: u32, year: i32) -> Result<LedgerPeriod> {
        let target = YearMonth::new(year, month)?;
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let period = match self.ledger.get_period(user_id, target)? {
            Some(existing) => existing,
            None => {
                let id = Uuid::new_v4().to_string();
                info!("Creating ledger period {} for user {} ({})", id, user_id, target);
                LedgerPeriod::new(id, user_id, target, self.clock.now().naive_utc())
            }
        };
        self.regenerate(period).await
    }

    async fn update(&self, user_id: &str, month: u32, year: i32) -> Result<LedgerPeriod> {
        let target = YearMonth::new(year, month)?;
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let period = self.ledger.get_period(user_id, target)?.ok_or_else(|| {
            Error::not_found(format!("ledger period {} for user {}", target, user_id))
        })?;
        debug!("Regenerating ledger period {} ({})", period.id, target);
        self.regenerate(period).await
    }

    fn get_by_month(&self, user_id: &str, month: u32, year: i32) -> Result<Option<LedgerPeriod>> {
        let target = YearMonth::new(year, month)?;
        self.ledger.get_period(user_id, target)
    }

    fn list_all(&self, user_id: &str) -> Result<Vec<LedgerPeriod>> {
        self.ledger.list_periods(user_id)
    }

    fn get_by_category(
        &self,
        user_id: &str,
        month: u32,
        year: i32,
    ) -> Result<Vec<CategorySummary>> {
        let target = YearMonth::new(year, month)?;
        let period = self.ledger.get_period(user_id, target)?.ok_or_else(|| {
            Error::not_found(format!("ledger period {} for user {}", target, user_id))
        })?;
        Ok(group_by_category(&period.items))
    }

    async fn pay_item(&self, user_id: &str, item_id: &str) -> Result<LedgerPeriod> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;
        let now = self.clock.now();

        let mut period = self
            .ledger
            .find_item_period(user_id, item_id)?
            .ok_or_else(|| Error::not_found(format!("ledger item '{}'", item_id)))?;
        let item = period
            .item_mut(item_id)
            .ok_or_else(|| Error::not_found(format!("ledger item '{}'", item_id)))?;
        let expected_status = item.status;
        mark_paid(item, now)?;
        let paid = item.clone();

        let mut obligations = self.load_obligations(user_id)?;
        let obligation = Self::find_obligation(&mut obligations, &paid.obligation_ref())?;
        let counter_updates: Vec<_> = apply_pay(obligation, &paid)?.into_iter().collect();

        info!(
            "Paying item {} of period {} (installment {:?})",
            paid.id, paid.period_id, paid.installment_number
        );
        let rebuilt = self.rebuild(period, &obligations, now)?;
        self.ledger
            .commit(PeriodChangeSet {
                period: rebuilt,
                guard: Some(ItemGuard {
                    item_id: item_id.to_string(),
                    expected_status,
                }),
                counter_updates,
            })
            .await
    }

    async fn unpay_item(&self, user_id: &str, item_id: &str) -> Result<LedgerPeriod> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;
        let now = self.clock.now();

        let mut period = self
            .ledger
            .find_item_period(user_id, item_id)?
            .ok_or_else(|| Error::not_found(format!("ledger item '{}'", item_id)))?;
        let item = period
            .item_mut(item_id)
            .ok_or_else(|| Error::not_found(format!("ledger item '{}'", item_id)))?;
        let expected_status = item.status;
        mark_unpaid(item)?;
        let reverted = item.clone();
        let reference = reverted.obligation_ref();

        let mut obligations = self.load_obligations(user_id)?;
        let obligation = Self::find_obligation(&mut obligations, &reference)?;
        let remaining_paid: Vec<_> = self
            .ledger
            .list_paid_items(&reference)?
            .into_iter()
            .filter(|paid| paid.id != reverted.id)
            .collect();
        let counter_updates: Vec<_> = apply_unpay(obligation, &remaining_paid)
            .into_iter()
            .collect();

        info!(
            "Reverting payment of item {} of period {} ({} paid items remain for {})",
            reverted.id,
            reverted.period_id,
            remaining_paid.len(),
            reference
        );
        let rebuilt = self.rebuild(period, &obligations, now)?;
        self.ledger
            .commit(PeriodChangeSet {
                period: rebuilt,
                guard: Some(ItemGuard {
                    item_id: item_id.to_string(),
                    expected_status,
                }),
                counter_updates,
            })
            .await
    }
}
