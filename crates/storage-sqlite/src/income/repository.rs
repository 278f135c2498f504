use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use billbook_core::income::{IncomeEntry, IncomeEntryRepositoryTrait, NewIncomeEntry};
use billbook_core::utils::YearMonth;
use billbook_core::Result;

use super::model::IncomeEntryDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::income_entries;
use crate::utils::format_date;

pub struct IncomeEntryRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl IncomeEntryRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        IncomeEntryRepository { pool, writer }
    }
}

#[async_trait]
impl IncomeEntryRepositoryTrait for IncomeEntryRepository {
    fn list_by_user_and_month(&self, user_id: &str, period: YearMonth) -> Result<Vec<IncomeEntry>> {
        let mut conn = get_connection(&self.pool)?;
        // ISO dates compare correctly as text.
        let rows = income_entries::table
            .filter(income_entries::user_id.eq(user_id))
            .filter(income_entries::entry_date.ge(format_date(period.first_day())))
            .filter(income_entries::entry_date.le(format_date(period.last_day())))
            .order((income_entries::entry_date.asc(), income_entries::id.asc()))
            .select(IncomeEntryDB::as_select())
            .load::<IncomeEntryDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(IncomeEntry::try_from).collect()
    }

    async fn create(&self, new_entry: NewIncomeEntry) -> Result<IncomeEntry> {
        new_entry.validate()?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<IncomeEntry> {
                let id = new_entry
                    .id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                let entry_db = IncomeEntryDB::from_new(new_entry, id);
                diesel::insert_into(income_entries::table)
                    .values(&entry_db)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                IncomeEntry::try_from(entry_db)
            })
            .await
    }
}
