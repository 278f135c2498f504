use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use billbook_core::{
    income::IncomeEntryRepositoryTrait,
    ledger::{LedgerService, LedgerServiceTrait},
    obligations::{
        CategoryRepositoryTrait, CreditCardRepositoryTrait, CreditPurchaseRepositoryTrait,
        FixedBillRepositoryTrait, VariableBillRepositoryTrait,
    },
    reports::{ReportService, ReportServiceTrait},
    utils::{Clock, SystemClock},
};
use billbook_storage_sqlite::{
    db,
    income::IncomeEntryRepository,
    ledger::LedgerRepository,
    obligations::{
        CategoryRepository, CreditCardRepository, CreditPurchaseRepository, FixedBillRepository,
        VariableBillRepository,
    },
};

use crate::config::{Config, LogFormat};

pub struct AppState {
    pub ledger_service: Arc<dyn LedgerServiceTrait>,
    pub report_service: Arc<dyn ReportServiceTrait>,
    pub category_repository: Arc<dyn CategoryRepositoryTrait>,
    pub credit_card_repository: Arc<dyn CreditCardRepositoryTrait>,
    pub fixed_bill_repository: Arc<dyn FixedBillRepositoryTrait>,
    pub variable_bill_repository: Arc<dyn VariableBillRepositoryTrait>,
    pub credit_purchase_repository: Arc<dyn CreditPurchaseRepositoryTrait>,
    pub income_entry_repository: Arc<dyn IncomeEntryRepositoryTrait>,
}

/// Logs go to stderr; stdout carries the command's JSON output.
pub fn init_tracing(log_format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match log_format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

/// Opens the database and wires repositories into services. Must run inside
/// the Tokio runtime because it spawns the writer actor.
pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let db_path = db::init(&config.data_dir)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = db::spawn_writer((*pool).clone());

    let category_repository = Arc::new(CategoryRepository::new(pool.clone(), writer.clone()));
    let credit_card_repository = Arc::new(CreditCardRepository::new(pool.clone(), writer.clone()));
    let fixed_bill_repository = Arc::new(FixedBillRepository::new(pool.clone(), writer.clone()));
    let variable_bill_repository =
        Arc::new(VariableBillRepository::new(pool.clone(), writer.clone()));
    let credit_purchase_repository =
        Arc::new(CreditPurchaseRepository::new(pool.clone(), writer.clone()));
    let income_entry_repository =
        Arc::new(IncomeEntryRepository::new(pool.clone(), writer.clone()));
    let ledger_repository = Arc::new(LedgerRepository::new(pool, writer));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let ledger_service = Arc::new(LedgerService::new(
        fixed_bill_repository.clone(),
        variable_bill_repository.clone(),
        credit_purchase_repository.clone(),
        income_entry_repository.clone(),
        ledger_repository.clone(),
        clock.clone(),
    ));
    let report_service = Arc::new(ReportService::new(
        ledger_repository,
        credit_card_repository.clone(),
        credit_purchase_repository.clone(),
        income_entry_repository.clone(),
        clock,
    ));

    Ok(AppState {
        ledger_service,
        report_service,
        category_repository,
        credit_card_repository,
        fixed_bill_repository,
        variable_bill_repository,
        credit_purchase_repository,
        income_entry_repository,
    })
}
