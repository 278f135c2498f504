//! Ledger module - monthly ledger generation and pay/unpay reconciliation.

pub mod aggregate;
mod ledger_model;
mod ledger_service;
mod ledger_traits;
pub mod overdue;
pub mod pipeline;
pub mod reconciliation;
pub mod schedule;


pub use ledger_model::{
    CategorySummary, CounterUpdate, ItemGuard, ItemStatus, LedgerItem, LedgerPeriod,
    LedgerTotals, PeriodChangeSet,
};
pub use ledger_service::LedgerService;
pub use ledger_traits::{LedgerRepositoryTrait, LedgerServiceTrait};
