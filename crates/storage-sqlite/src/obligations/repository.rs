use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use billbook_core::obligations::{
    Category, CategoryRepositoryTrait, CreditCard, CreditCardRepositoryTrait, CreditPurchase,
    CreditPurchaseRepositoryTrait, FixedBill, FixedBillRepositoryTrait, NewCategory,
    NewCreditCard, NewCreditPurchase, NewFixedBill, NewVariableBill, ObligationKind,
    ObligationRef, VariableBill, VariableBillRepositoryTrait,
};
use billbook_core::{Error, Result};

use super::model::{CategoryDB, CreditCardDB, CreditPurchaseDB, FixedBillDB, VariableBillDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::{categories, credit_cards, credit_purchases, fixed_bills, variable_bills};
use crate::utils::{to_i32, to_u32};

type SqlitePool = Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>;

fn new_id(requested: &Option<String>) -> String {
    requested
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Name of `category_id`, which must belong to `user_id`.
fn owned_category_name(
    conn: &mut SqliteConnection,
    user_id: &str,
    category_id: &str,
) -> Result<String> {
    categories::table
        .filter(categories::id.eq(category_id))
        .filter(categories::user_id.eq(user_id))
        .select(categories::name)
        .first::<String>(conn)
        .optional()
        .map_err(StorageError::from)?
        .ok_or_else(|| Error::not_found(format!("category {}", category_id)))
}

/// Overwrites the paid-installment counter of an installment obligation.
///
/// Shared by the obligation repositories and the ledger commit so both run
/// the same statement inside whatever writer job calls it.
pub(crate) fn write_paid_installments(
    conn: &mut SqliteConnection,
    obligation: &ObligationRef,
    paid: u32,
) -> Result<()> {
    let paid = to_i32(paid, "paid_installments")?;
    let updated = match obligation.kind {
        ObligationKind::Variable => diesel::update(variable_bills::table.find(&obligation.id))
            .set(variable_bills::paid_installments.eq(paid))
            .execute(conn),
        ObligationKind::Credit => diesel::update(credit_purchases::table.find(&obligation.id))
            .set(credit_purchases::paid_installments.eq(paid))
            .execute(conn),
        ObligationKind::Fixed => {
            return Err(Error::invalid_input(format!(
                "{} has no installment counter",
                obligation
            )))
        }
    }
    .map_err(StorageError::from)?;

    if updated == 0 {
        return Err(Error::not_found(format!("obligation {}", obligation)));
    }
    Ok(())
}

fn read_paid_installments(conn: &mut SqliteConnection, obligation: &ObligationRef) -> Result<u32> {
    let stored = match obligation.kind {
        ObligationKind::Variable => variable_bills::table
            .find(&obligation.id)
            .select(variable_bills::paid_installments)
            .first::<i32>(conn)
            .optional(),
        ObligationKind::Credit => credit_purchases::table
            .find(&obligation.id)
            .select(credit_purchases::paid_installments)
            .first::<i32>(conn)
            .optional(),
        ObligationKind::Fixed => {
            return Err(Error::invalid_input(format!(
                "{} has no installment counter",
                obligation
            )))
        }
    }
    .map_err(StorageError::from)?
    .ok_or_else(|| Error::not_found(format!("obligation {}", obligation)))?;
    to_u32(stored, "paid_installments")
}

/// Writes `paid` only while the counter still holds `previous`; a counter
/// moved by another commit fails `InvalidState`. Must run inside a writer job.
pub(crate) fn swap_paid_installments(
    conn: &mut SqliteConnection,
    obligation: &ObligationRef,
    previous: u32,
    paid: u32,
) -> Result<()> {
    let current = read_paid_installments(conn, obligation)?;
    if current != previous {
        return Err(Error::invalid_state(format!(
            "paid installments of {} changed from {} to {}",
            obligation, previous, current
        )));
    }
    write_paid_installments(conn, obligation, paid)
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

pub struct CategoryRepository {
    pool: SqlitePool,
    writer: WriteHandle,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool, writer: WriteHandle) -> Self {
        CategoryRepository { pool, writer }
    }
}

#[async_trait]
impl CategoryRepositoryTrait for CategoryRepository {
    fn list_by_user(&self, user_id: &str) -> Result<Vec<Category>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = categories::table
            .filter(categories::user_id.eq(user_id))
            .order(categories::name.asc())
            .select(CategoryDB::as_select())
            .load::<CategoryDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn create(&self, new_category: NewCategory) -> Result<Category> {
        new_category.validate()?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Category> {
                let id = new_id(&new_category.id);
                let category_db = CategoryDB::from_new(new_category, id);
                diesel::insert_into(categories::table)
                    .values(&category_db)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(Category::from(category_db))
            })
            .await
    }
}

// ---------------------------------------------------------------------------
// Credit cards
// ---------------------------------------------------------------------------

pub struct CreditCardRepository {
    pool: SqlitePool,
    writer: WriteHandle,
}

impl CreditCardRepository {
    pub fn new(pool: SqlitePool, writer: WriteHandle) -> Self {
        CreditCardRepository { pool, writer }
    }
}

#[async_trait]
impl CreditCardRepositoryTrait for CreditCardRepository {
    fn list_by_user(&self, user_id: &str) -> Result<Vec<CreditCard>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = credit_cards::table
            .filter(credit_cards::user_id.eq(user_id))
            .order(credit_cards::name.asc())
            .select(CreditCardDB::as_select())
            .load::<CreditCardDB>(&mut conn)
            .into_core()?;
        rows.into_iter().map(CreditCard::try_from).collect()
    }

    async fn create(&self, new_card: NewCreditCard) -> Result<CreditCard> {
        new_card.validate()?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<CreditCard> {
                let id = new_id(&new_card.id);
                let card_db = CreditCardDB::from_new(new_card, id)?;
                diesel::insert_into(credit_cards::table)
                    .values(&card_db)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                CreditCard::try_from(card_db)
            })
            .await
    }
}

// ---------------------------------------------------------------------------
// Fixed bills
// ---------------------------------------------------------------------------

pub struct FixedBillRepository {
    pool: SqlitePool,
    writer: WriteHandle,
}

impl FixedBillRepository {
    pub fn new(pool: SqlitePool, writer: WriteHandle) -> Self {
        FixedBillRepository { pool, writer }
    }
}

#[async_trait]
impl FixedBillRepositoryTrait for FixedBillRepository {
    fn list_by_user(&self, user_id: &str) -> Result<Vec<FixedBill>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = fixed_bills::table
            .inner_join(categories::table)
            .filter(fixed_bills::user_id.eq(user_id))
            .order((fixed_bills::due_day.asc(), fixed_bills::name.asc()))
            .select((FixedBillDB::as_select(), categories::name))
            .load::<(FixedBillDB, String)>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter()
            .map(|(bill_db, category_name)| bill_db.into_domain(category_name))
            .collect()
    }

    async fn create(&self, new_bill: NewFixedBill) -> Result<FixedBill> {
        new_bill.validate()?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<FixedBill> {
                let category_name =
                    owned_category_name(conn, &new_bill.user_id, &new_bill.category_id)?;
                let id = new_id(&new_bill.id);
                let bill_db = FixedBillDB::from_new(new_bill, id)?;
                diesel::insert_into(fixed_bills::table)
                    .values(&bill_db)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                bill_db.into_domain(category_name)
            })
            .await
    }

    async fn delete(&self, user_id: &str, bill_id: &str) -> Result<usize> {
        let user_id = user_id.to_string();
        let bill_id = bill_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                Ok(diesel::delete(
                    fixed_bills::table
                        .filter(fixed_bills::id.eq(bill_id))
                        .filter(fixed_bills::user_id.eq(user_id)),
                )
                .execute(conn)
                .map_err(StorageError::from)?)
            })
            .await
    }
}

// ---------------------------------------------------------------------------
// Variable bills
// ---------------------------------------------------------------------------

pub struct VariableBillRepository {
    pool: SqlitePool,
    writer: WriteHandle,
}

impl VariableBillRepository {
    pub fn new(pool: SqlitePool, writer: WriteHandle) -> Self {
        VariableBillRepository { pool, writer }
    }
}

#[async_trait]
impl VariableBillRepositoryTrait for VariableBillRepository {
    fn list_by_user(&self, user_id: &str) -> Result<Vec<VariableBill>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = variable_bills::table
            .inner_join(categories::table)
            .filter(variable_bills::user_id.eq(user_id))
            .order((variable_bills::first_due_date.asc(), variable_bills::name.asc()))
            .select((VariableBillDB::as_select(), categories::name))
            .load::<(VariableBillDB, String)>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter()
            .map(|(bill_db, category_name)| bill_db.into_domain(category_name))
            .collect()
    }

    async fn create(&self, new_bill: NewVariableBill) -> Result<VariableBill> {
        new_bill.validate()?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<VariableBill> {
                let category_name =
                    owned_category_name(conn, &new_bill.user_id, &new_bill.category_id)?;
                let id = new_id(&new_bill.id);
                let bill_db = VariableBillDB::from_new(new_bill, id)?;
                diesel::insert_into(variable_bills::table)
                    .values(&bill_db)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                bill_db.into_domain(category_name)
            })
            .await
    }

    async fn delete(&self, user_id: &str, bill_id: &str) -> Result<usize> {
        let user_id = user_id.to_string();
        let bill_id = bill_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                Ok(diesel::delete(
                    variable_bills::table
                        .filter(variable_bills::id.eq(bill_id))
                        .filter(variable_bills::user_id.eq(user_id)),
                )
                .execute(conn)
                .map_err(StorageError::from)?)
            })
            .await
    }

    async fn set_paid_installments(&self, bill_id: &str, paid: u32) -> Result<()> {
        let obligation = ObligationRef::new(ObligationKind::Variable, bill_id);
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                write_paid_installments(conn, &obligation, paid)
            })
            .await
    }
}

// ---------------------------------------------------------------------------
// Credit purchases
// ---------------------------------------------------------------------------

pub struct CreditPurchaseRepository {
    pool: SqlitePool,
    writer: WriteHandle,
}

impl CreditPurchaseRepository {
    pub fn new(pool: SqlitePool, writer: WriteHandle) -> Self {
        CreditPurchaseRepository { pool, writer }
    }
}

#[async_trait]
impl CreditPurchaseRepositoryTrait for CreditPurchaseRepository {
    fn list_by_user(&self, user_id: &str) -> Result<Vec<CreditPurchase>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = credit_purchases::table
            .inner_join(credit_cards::table)
            .inner_join(categories::table)
            .filter(credit_cards::user_id.eq(user_id))
            .order((
                credit_purchases::purchase_date.asc(),
                credit_purchases::name.asc(),
            ))
            .select((
                CreditPurchaseDB::as_select(),
                credit_cards::due_day,
                categories::name,
            ))
            .load::<(CreditPurchaseDB, i32, String)>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter()
            .map(|(purchase_db, card_due_day, category_name)| {
                purchase_db.into_domain(card_due_day, category_name)
            })
            .collect()
    }

    async fn create(&self, new_purchase: NewCreditPurchase) -> Result<CreditPurchase> {
        new_purchase.validate()?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<CreditPurchase> {
                let card_due_day = credit_cards::table
                    .filter(credit_cards::id.eq(&new_purchase.card_id))
                    .filter(credit_cards::user_id.eq(&new_purchase.user_id))
                    .select(credit_cards::due_day)
                    .first::<i32>(conn)
                    .optional()
                    .map_err(StorageError::from)?
                    .ok_or_else(|| {
                        Error::not_found(format!("credit card {}", new_purchase.card_id))
                    })?;
                let category_name =
                    owned_category_name(conn, &new_purchase.user_id, &new_purchase.category_id)?;
                let id = new_id(&new_purchase.id);
                let purchase_db = CreditPurchaseDB::from_new(new_purchase, id)?;
                diesel::insert_into(credit_purchases::table)
                    .values(&purchase_db)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                purchase_db.into_domain(card_due_day, category_name)
            })
            .await
    }

    async fn delete(&self, user_id: &str, purchase_id: &str) -> Result<usize> {
        let user_id = user_id.to_string();
        let purchase_id = purchase_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                Ok(diesel::delete(
                    credit_purchases::table
                        .filter(credit_purchases::id.eq(purchase_id))
                        .filter(credit_purchases::user_id.eq(user_id)),
                )
                .execute(conn)
                .map_err(StorageError::from)?)
            })
            .await
    }

    async fn set_paid_installments(&self, purchase_id: &str, paid: u32) -> Result<()> {
        let obligation = ObligationRef::new(ObligationKind::Credit, purchase_id);
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                write_paid_installments(conn, &obligation, paid)
            })
            .await
    }
}
