use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use log::debug;
use std::sync::Arc;

use billbook_core::ledger::{
    ItemStatus, LedgerItem, LedgerPeriod, LedgerRepositoryTrait, PeriodChangeSet,
};
use billbook_core::obligations::ObligationRef;
use billbook_core::utils::YearMonth;
use billbook_core::{Error, Result};

use super::model::{LedgerItemDB, LedgerPeriodDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::obligations::swap_paid_installments;
use crate::schema::{ledger_items, ledger_periods};
use crate::utils::to_i32;

pub struct LedgerRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl LedgerRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        LedgerRepository { pool, writer }
    }

    fn load_items(
        conn: &mut SqliteConnection,
        period_db: &LedgerPeriodDB,
    ) -> Result<Vec<LedgerItemDB>> {
        Ok(LedgerItemDB::belonging_to(period_db)
            .order((ledger_items::due_date.asc(), ledger_items::id.asc()))
            .select(LedgerItemDB::as_select())
            .load::<LedgerItemDB>(conn)
            .map_err(StorageError::from)?)
    }

    fn with_items(conn: &mut SqliteConnection, period_db: LedgerPeriodDB) -> Result<LedgerPeriod> {
        let items = Self::load_items(conn, &period_db)?;
        period_db.into_domain(items)
    }
}

/// Inserts a period never stored before. Another commit may have created the
/// same month since it was read.
fn insert_period(conn: &mut SqliteConnection, period_db: &LedgerPeriodDB) -> Result<()> {
    let existing = ledger_periods::table
        .filter(
            ledger_periods::id.eq(&period_db.id).or(ledger_periods::user_id
                .eq(&period_db.user_id)
                .and(ledger_periods::month.eq(period_db.month))
                .and(ledger_periods::year.eq(period_db.year))),
        )
        .count()
        .get_result::<i64>(conn)
        .map_err(StorageError::from)?;
    if existing > 0 {
        return Err(Error::invalid_state(format!(
            "ledger period {}-{:02} of user {} was created concurrently",
            period_db.year, period_db.month, period_db.user_id
        )));
    }
    diesel::insert_into(ledger_periods::table)
        .values(period_db)
        .execute(conn)
        .map_err(StorageError::from)?;
    Ok(())
}

/// Overwrites a stored period only while it still has the version it was
/// read at.
fn update_period(
    conn: &mut SqliteConnection,
    period_db: &LedgerPeriodDB,
    read_version: i64,
) -> Result<()> {
    let updated = diesel::update(
        ledger_periods::table
            .filter(ledger_periods::id.eq(&period_db.id))
            .filter(ledger_periods::version.eq(read_version)),
    )
    .set(period_db)
    .execute(conn)
    .map_err(StorageError::from)?;
    if updated == 0 {
        return Err(Error::invalid_state(format!(
            "ledger period {} changed since version {}",
            period_db.id, read_version
        )));
    }
    Ok(())
}

/// Checks the guard and the period version, then replaces the period row, its
/// items and the counters. Runs inside the writer's transaction, so any error
/// rolls back every statement before it. Returns the stored version.
fn apply_change_set(conn: &mut SqliteConnection, changes: &PeriodChangeSet) -> Result<i64> {
    let period = &changes.period;

    if let Some(guard) = &changes.guard {
        let stored = ledger_items::table
            .filter(ledger_items::id.eq(&guard.item_id))
            .filter(ledger_items::period_id.eq(&period.id))
            .select(ledger_items::status)
            .first::<String>(conn)
            .optional()
            .map_err(StorageError::from)?
            .ok_or_else(|| Error::not_found(format!("ledger item {}", guard.item_id)))?;
        let stored: ItemStatus = stored.parse()?;
        if stored != guard.expected_status {
            return Err(Error::invalid_state(format!(
                "ledger item {} is {}, expected {}",
                guard.item_id, stored, guard.expected_status
            )));
        }
    }

    let mut period_db = LedgerPeriodDB::from_domain(period)?;
    period_db.version = period.version + 1;
    if period.version == 0 {
        insert_period(conn, &period_db)?;
    } else {
        update_period(conn, &period_db, period.version)?;
    }

    diesel::delete(ledger_items::table.filter(ledger_items::period_id.eq(&period.id)))
        .execute(conn)
        .map_err(StorageError::from)?;

    for item in &period.items {
        let item_db = LedgerItemDB::from_domain(item)?;
        diesel::insert_into(ledger_items::table)
            .values(&item_db)
            .execute(conn)
            .map_err(StorageError::from)?;
    }

    for update in &changes.counter_updates {
        swap_paid_installments(
            conn,
            &update.obligation,
            update.previous,
            update.paid_installments,
        )?;
    }
    Ok(period_db.version)
}

#[async_trait]
impl LedgerRepositoryTrait for LedgerRepository {
    fn get_period(&self, user_id: &str, period: YearMonth) -> Result<Option<LedgerPeriod>> {
        let mut conn = get_connection(&self.pool)?;
        let period_db = ledger_periods::table
            .filter(ledger_periods::user_id.eq(user_id))
            .filter(ledger_periods::month.eq(to_i32(period.month, "month")?))
            .filter(ledger_periods::year.eq(period.year))
            .select(LedgerPeriodDB::as_select())
            .first::<LedgerPeriodDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        period_db
            .map(|period_db| Self::with_items(&mut conn, period_db))
            .transpose()
    }

    fn list_periods(&self, user_id: &str) -> Result<Vec<LedgerPeriod>> {
        let mut conn = get_connection(&self.pool)?;
        let periods_db = ledger_periods::table
            .filter(ledger_periods::user_id.eq(user_id))
            .order((ledger_periods::year.desc(), ledger_periods::month.desc()))
            .select(LedgerPeriodDB::as_select())
            .load::<LedgerPeriodDB>(&mut conn)
            .map_err(StorageError::from)?;

        let items_db = LedgerItemDB::belonging_to(&periods_db)
            .order((ledger_items::due_date.asc(), ledger_items::id.asc()))
            .select(LedgerItemDB::as_select())
            .load::<LedgerItemDB>(&mut conn)
            .map_err(StorageError::from)?;

        items_db
            .grouped_by(&periods_db)
            .into_iter()
            .zip(periods_db)
            .map(|(items, period_db)| period_db.into_domain(items))
            .collect()
    }

    fn find_item_period(&self, user_id: &str, item_id: &str) -> Result<Option<LedgerPeriod>> {
        let mut conn = get_connection(&self.pool)?;
        let period_db = ledger_items::table
            .inner_join(ledger_periods::table)
            .filter(ledger_items::id.eq(item_id))
            .filter(ledger_periods::user_id.eq(user_id))
            .select(LedgerPeriodDB::as_select())
            .first::<LedgerPeriodDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        period_db
            .map(|period_db| Self::with_items(&mut conn, period_db))
            .transpose()
    }

    fn list_paid_items(&self, obligation: &ObligationRef) -> Result<Vec<LedgerItem>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = ledger_items::table
            .filter(ledger_items::obligation_kind.eq(obligation.kind.as_str()))
            .filter(ledger_items::obligation_id.eq(&obligation.id))
            .filter(ledger_items::status.eq(ItemStatus::Paid.as_str()))
            .order(ledger_items::installment_number.asc())
            .select(LedgerItemDB::as_select())
            .load::<LedgerItemDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(LedgerItem::try_from).collect()
    }

    async fn commit(&self, changes: PeriodChangeSet) -> Result<LedgerPeriod> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<LedgerPeriod> {
                let version = apply_change_set(conn, &changes)?;
                debug!(
                    "Committed period {} at version {} with {} items and {} counter updates",
                    changes.period.id,
                    version,
                    changes.period.items.len(),
                    changes.counter_updates.len()
                );
                let mut period = changes.period;
                period.version = version;
                Ok(period)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_database;
    use crate::income::IncomeEntryRepository;
    use crate::obligations::{
        CategoryRepository, CreditPurchaseRepository, FixedBillRepository, VariableBillRepository,
    };
    use billbook_core::ledger::{CounterUpdate, ItemGuard, LedgerService, LedgerServiceTrait};
    use billbook_core::obligations::{
        CategoryRepositoryTrait, FixedBillRepositoryTrait, NewCategory, NewFixedBill,
        NewVariableBill, ObligationKind, VariableBillRepositoryTrait,
    };
    use billbook_core::utils::FixedClock;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    struct Fixture {
        ledger: Arc<LedgerRepository>,
        variable: Arc<VariableBillRepository>,
        services: Vec<LedgerService>,
        _dir: tempfile::TempDir,
    }

    /// Rent due on the 31st and a three-installment sofa starting 2025-01-10,
    /// with two independent services sharing one database, clock at 2025-02-15.
    async fn fixture() -> Fixture {
        let (pool, writer, dir) = test_database();
        let categories = CategoryRepository::new(pool.clone(), writer.clone());
        let fixed = Arc::new(FixedBillRepository::new(pool.clone(), writer.clone()));
        let variable = Arc::new(VariableBillRepository::new(pool.clone(), writer.clone()));
        let purchases = Arc::new(CreditPurchaseRepository::new(pool.clone(), writer.clone()));
        let income = Arc::new(IncomeEntryRepository::new(pool.clone(), writer.clone()));
        let ledger = Arc::new(LedgerRepository::new(pool, writer));

        let home = categories
            .create(NewCategory {
                id: None,
                user_id: "u1".to_string(),
                name: "Home".to_string(),
            })
            .await
            .unwrap();
        fixed
            .create(NewFixedBill {
                id: Some("rent".to_string()),
                user_id: "u1".to_string(),
                name: "Rent".to_string(),
                due_day: 31,
                amount: dec!(1200),
                category_id: home.id.clone(),
            })
            .await
            .unwrap();
        variable
            .create(NewVariableBill {
                id: Some("sofa".to_string()),
                user_id: "u1".to_string(),
                name: "Sofa".to_string(),
                first_due_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
                amount_per_installment: dec!(150),
                total_installments: 3,
                paid_installments: 0,
                category_id: home.id,
            })
            .await
            .unwrap();

        let clock = Arc::new(FixedClock::at_noon(
            NaiveDate::from_ymd_opt(2025, 2, 15).unwrap(),
        ));
        let services = (0..2)
            .map(|_| {
                LedgerService::new(
                    fixed.clone(),
                    variable.clone(),
                    purchases.clone(),
                    income.clone(),
                    ledger.clone(),
                    clock.clone(),
                )
            })
            .collect();

        Fixture {
            ledger,
            variable,
            services,
            _dir: dir,
        }
    }

    fn february() -> YearMonth {
        YearMonth::new(2025, 2).unwrap()
    }

    #[tokio::test]
    async fn test_generated_period_round_trips_through_storage() {
        let fx = fixture().await;
        let generated = fx.services[0].generate("u1", 2, 2025).await.unwrap();

        let stored = fx.ledger.get_period("u1", february()).unwrap().unwrap();
        assert_eq!(stored, generated);
        assert_eq!(stored.items.len(), 2);
        assert_eq!(stored.items[0].name, "Sofa (1/3)");
        assert_eq!(stored.items[0].status, ItemStatus::Overdue);
        assert_eq!(
            stored.items[1].due_date,
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
        assert_eq!(stored.total_expenses, dec!(1350));
        assert_eq!(stored.total_overdue, dec!(150));

        let again = fx.services[1].generate("u1", 2, 2025).await.unwrap();
        assert_eq!(again.id, generated.id);
        assert_eq!(fx.ledger.list_periods("u1").unwrap().len(), 1);
        assert!(fx.ledger.list_periods("u2").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pay_and_unpay_persist_counter_and_item() {
        let fx = fixture().await;
        let period = fx.services[0].generate("u1", 2, 2025).await.unwrap();
        let sofa_item = period.items[0].id.clone();

        let paid = fx.services[0].pay_item("u1", &sofa_item).await.unwrap();
        assert_eq!(paid.item(&sofa_item).unwrap().status, ItemStatus::Paid);
        assert_eq!(paid.total_paid, dec!(150));
        assert_eq!(fx.variable.list_by_user("u1").unwrap()[0].paid_installments, 1);

        let found = fx.ledger.find_item_period("u1", &sofa_item).unwrap().unwrap();
        assert_eq!(found.id, period.id);
        assert!(fx.ledger.find_item_period("u2", &sofa_item).unwrap().is_none());
        let paid_items = fx
            .ledger
            .list_paid_items(&ObligationRef::new(
                ObligationKind::Variable,
                "sofa",
            ))
            .unwrap();
        assert_eq!(paid_items.len(), 1);
        assert!(paid_items[0].paid_at.is_some());

        let reverted = fx.services[1].unpay_item("u1", &sofa_item).await.unwrap();
        let item = reverted.item(&sofa_item).unwrap();
        assert_eq!(item.status, ItemStatus::Overdue);
        assert_eq!(item.paid_at, None);
        assert_eq!(fx.variable.list_by_user("u1").unwrap()[0].paid_installments, 0);
    }

    #[tokio::test]
    async fn test_concurrent_pays_on_separate_services_settle_once() {
        let fx = fixture().await;
        let period = fx.services[0].generate("u1", 2, 2025).await.unwrap();
        let sofa_item = period.items[0].id.clone();

        let (first, second) = tokio::join!(
            fx.services[0].pay_item("u1", &sofa_item),
            fx.services[1].pay_item("u1", &sofa_item)
        );
        let results = [first, second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(Error::InvalidState(_)))));
        assert_eq!(fx.variable.list_by_user("u1").unwrap()[0].paid_installments, 1);
    }

    #[tokio::test]
    async fn test_concurrent_pays_of_different_items_never_lose_an_update() {
        let fx = fixture().await;
        let period = fx.services[0].generate("u1", 2, 2025).await.unwrap();
        let sofa_item = period.items[0].id.clone();
        let rent_item = period.items[1].id.clone();

        let (sofa, rent) = tokio::join!(
            fx.services[0].pay_item("u1", &sofa_item),
            fx.services[1].pay_item("u1", &rent_item)
        );
        let results = [&sofa, &rent];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(Error::InvalidState(_)))));

        // Whatever won, the stored items agree with the counter.
        let stored = fx.ledger.get_period("u1", february()).unwrap().unwrap();
        let sofa_paid = stored.item(&sofa_item).unwrap().is_paid();
        let counter = fx.variable.list_by_user("u1").unwrap()[0].paid_installments;
        assert_eq!(counter, u32::from(sofa_paid));
        assert_eq!(stored.item(&rent_item).unwrap().is_paid(), rent.is_ok());

        // The loser succeeds once retried against the fresh period.
        if sofa.is_err() {
            fx.services[0].pay_item("u1", &sofa_item).await.unwrap();
        } else {
            fx.services[1].pay_item("u1", &rent_item).await.unwrap();
        }
        let stored = fx.ledger.get_period("u1", february()).unwrap().unwrap();
        assert!(stored.items.iter().all(LedgerItem::is_paid));
        assert_eq!(stored.total_paid, dec!(1350));
        assert_eq!(fx.variable.list_by_user("u1").unwrap()[0].paid_installments, 1);
    }

    #[tokio::test]
    async fn test_stale_installment_in_older_period_cannot_be_paid_again() {
        let fx = fixture().await;
        let january = fx.services[0].generate("u1", 1, 2025).await.unwrap();
        let february = fx.services[0].generate("u1", 2, 2025).await.unwrap();
        let jan_sofa = january.items[0].clone();
        let feb_sofa = february.items[0].clone();
        assert_eq!(jan_sofa.installment_number, Some(1));
        assert_eq!(feb_sofa.installment_number, Some(1));

        fx.services[0].pay_item("u1", &jan_sofa.id).await.unwrap();
        let err = fx.services[1].pay_item("u1", &feb_sofa.id).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(fx.variable.list_by_user("u1").unwrap()[0].paid_installments, 1);

        let refreshed = fx.services[1].update("u1", 2, 2025).await.unwrap();
        let sofa = refreshed.item(&feb_sofa.id).unwrap();
        assert_eq!(sofa.installment_number, Some(2));
        assert!(!sofa.is_paid());
        assert_eq!(refreshed.total_paid, dec!(0));
    }

    #[tokio::test]
    async fn test_commit_rejects_stale_period_version() {
        let fx = fixture().await;
        let first = fx.services[0].generate("u1", 2, 2025).await.unwrap();
        assert_eq!(first.version, 1);
        let second = fx.services[1].update("u1", 2, 2025).await.unwrap();
        assert_eq!(second.version, 2);

        let mut stale = first.clone();
        stale.items.clear();
        let err = fx
            .ledger
            .commit(PeriodChangeSet::rebuild(stale))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));

        let duplicate = LedgerPeriod::new("other-id", "u1", february(), first.created_at);
        let err = fx
            .ledger
            .commit(PeriodChangeSet::rebuild(duplicate))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));

        let stored = fx.ledger.get_period("u1", february()).unwrap().unwrap();
        assert_eq!(stored, second);
    }

    #[tokio::test]
    async fn test_commit_guard_rejects_without_writing() {
        let fx = fixture().await;
        let period = fx.services[0].generate("u1", 2, 2025).await.unwrap();
        let sofa_item = period.items[0].id.clone();

        let mut changed = period.clone();
        changed.items.clear();
        let stale = PeriodChangeSet {
            period: changed.clone(),
            guard: Some(ItemGuard {
                item_id: sofa_item.clone(),
                expected_status: ItemStatus::Paid,
            }),
            counter_updates: vec![CounterUpdate {
                obligation: ObligationRef::new(
                    ObligationKind::Variable,
                    "sofa",
                ),
                previous: 0,
                paid_installments: 1,
            }],
        };
        let err = fx.ledger.commit(stale.clone()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));

        let missing = PeriodChangeSet {
            guard: Some(ItemGuard {
                item_id: "no-such-item".to_string(),
                expected_status: ItemStatus::Pending,
            }),
            ..stale
        };
        let err = fx.ledger.commit(missing).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let stored = fx.ledger.get_period("u1", february()).unwrap().unwrap();
        assert_eq!(stored.items.len(), 2);
        assert_eq!(fx.variable.list_by_user("u1").unwrap()[0].paid_installments, 0);
    }

    #[tokio::test]
    async fn test_failed_counter_write_rolls_back_period() {
        let fx = fixture().await;
        let period = fx.services[0].generate("u1", 2, 2025).await.unwrap();

        let mut changed = period.clone();
        changed.items.clear();
        let err = fx
            .ledger
            .commit(PeriodChangeSet {
                period: changed,
                guard: None,
                counter_updates: vec![CounterUpdate {
                    obligation: ObligationRef::new(
                        ObligationKind::Credit,
                        "deleted-purchase",
                    ),
                    previous: 0,
                    paid_installments: 1,
                }],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let stored = fx.ledger.get_period("u1", february()).unwrap().unwrap();
        assert_eq!(stored.items, period.items);
    }
}
