//! SQLite storage implementation for ledger periods and items.

mod model;
mod repository;

pub use model::{LedgerItemDB, LedgerPeriodDB};
pub use repository::LedgerRepository;
