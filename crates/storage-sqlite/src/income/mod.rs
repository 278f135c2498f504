//! SQLite storage implementation for income entries.

mod model;
mod repository;

pub use model::IncomeEntryDB;
pub use repository::IncomeEntryRepository;
