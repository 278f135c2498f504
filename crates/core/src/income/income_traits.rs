use async_trait::async_trait;

use super::income_model::{IncomeEntry, NewIncomeEntry};
use crate::errors::Result;
use crate::utils::YearMonth;

/// Trait for income entry repository operations
#[async_trait]
pub trait IncomeEntryRepositoryTrait: Send + Sync {
    /// Entries whose `entry_date` falls inside `period`, ordered by date.
    fn list_by_user_and_month(&self, user_id: &str, period: YearMonth) -> Result<Vec<IncomeEntry>>;

    async fn create(&self, new_entry: NewIncomeEntry) -> Result<IncomeEntry>;
}
