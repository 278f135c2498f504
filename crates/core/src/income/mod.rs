//! Income entries - one-time cash inflows credited to a month.

mod income_model;
mod income_traits;

pub use income_model::{IncomeEntry, NewIncomeEntry};
pub use income_traits::IncomeEntryRepositoryTrait;
