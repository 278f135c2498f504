//! SQLite storage implementation for obligations, cards and categories.

mod model;
mod repository;

pub use model::{CategoryDB, CreditCardDB, CreditPurchaseDB, FixedBillDB, VariableBillDB};
pub(crate) use repository::{swap_paid_installments, write_paid_installments};
pub use repository::{
    CategoryRepository, CreditCardRepository, CreditPurchaseRepository, FixedBillRepository,
    VariableBillRepository,
};
