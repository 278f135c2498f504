//! Database model for income entries.

use diesel::prelude::*;

use billbook_core::income::{IncomeEntry, NewIncomeEntry};
use billbook_core::Result;

use crate::utils::{format_date, format_decimal, parse_date, parse_decimal};

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::income_entries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct IncomeEntryDB {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub entry_date: String,
    pub amount: String,
}

impl IncomeEntryDB {
    pub fn from_new(new: NewIncomeEntry, id: String) -> Self {
        Self {
            id,
            user_id: new.user_id,
            name: new.name,
            entry_date: format_date(new.entry_date),
            amount: format_decimal(&new.amount),
        }
    }
}

impl TryFrom<IncomeEntryDB> for IncomeEntry {
    type Error = billbook_core::Error;

    fn try_from(db: IncomeEntryDB) -> Result<Self> {
        Ok(Self {
            entry_date: parse_date(&db.entry_date, "income_entries.entry_date")?,
            amount: parse_decimal(&db.amount, "income_entries.amount")?,
            id: db.id,
            user_id: db.user_id,
            name: db.name,
        })
    }
}
