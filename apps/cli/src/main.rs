mod config;
mod main_lib;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;

use billbook_core::income::NewIncomeEntry;
use billbook_core::obligations::{
    NewCategory, NewCreditCard, NewCreditPurchase, NewFixedBill, NewVariableBill,
};
use billbook_core::reports::DASHBOARD_UPCOMING_DAYS;
use billbook_core::utils::YearMonth;

use config::Config;
use main_lib::{build_state, init_tracing, AppState};

#[derive(Parser, Debug)]
#[command(name = "billbook", version, about = "Monthly bill ledger")]
struct Cli {
    /// User to act as (overrides BILLBOOK_USER)
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the month's ledger if needed and rebuild its items
    Generate { period: YearMonth },
    /// Rebuild an existing month's ledger
    Update { period: YearMonth },
    /// Print one month's ledger
    Show { period: YearMonth },
    /// Print every ledger, newest first
    List,
    /// Print a month's items grouped by category
    ByCategory { period: YearMonth },
    /// Mark an item paid
    Pay { item_id: String },
    /// Revert a paid item
    Unpay { item_id: String },
    /// Income, expenses and balance of a month
    Summary { period: YearMonth },
    /// Expense share per category for a month
    Expenses { period: YearMonth },
    /// Unpaid items of the current month due within the next days
    Upcoming {
        #[arg(long, default_value_t = DASHBOARD_UPCOMING_DAYS)]
        days: u32,
    },
    /// Overdue items of the current month
    Overdue,
    /// Limit usage of every credit card
    Cards,
    /// Totals of every generated month of a year
    Yearly { year: i32 },
    /// Every report for the current month
    Dashboard,
    AddCategory {
        name: String,
    },
    AddCard {
        name: String,
        #[arg(long)]
        due_day: u32,
        #[arg(long)]
        limit: Decimal,
    },
    AddFixed {
        name: String,
        #[arg(long)]
        due_day: u32,
        #[arg(long)]
        amount: Decimal,
        #[arg(long)]
        category: String,
    },
    AddVariable {
        name: String,
        #[arg(long)]
        first_due_date: NaiveDate,
        #[arg(long)]
        amount: Decimal,
        #[arg(long)]
        installments: u32,
        #[arg(long, default_value_t = 0)]
        paid: u32,
        #[arg(long)]
        category: String,
    },
    AddPurchase {
        name: String,
        #[arg(long)]
        purchase_date: NaiveDate,
        #[arg(long)]
        amount: Decimal,
        #[arg(long)]
        installments: u32,
        #[arg(long, default_value_t = 0)]
        paid: u32,
        #[arg(long)]
        card: String,
        #[arg(long)]
        category: String,
    },
    AddIncome {
        name: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        amount: Decimal,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(state: &AppState, user_id: &str, command: Command) -> anyhow::Result<()> {
    let user = user_id.to_string();
    match command {
        Command::Generate { period } => print_json(
            &state
                .ledger_service
                .generate(user_id, period.month, period.year)
                .await?,
        ),
        Command::Update { period } => print_json(
            &state
                .ledger_service
                .update(user_id, period.month, period.year)
                .await?,
        ),
        Command::Show { period } => print_json(&state.ledger_service.get_by_month(
            user_id,
            period.month,
            period.year,
        )?),
        Command::List => print_json(&state.ledger_service.list_all(user_id)?),
        Command::ByCategory { period } => print_json(&state.ledger_service.get_by_category(
            user_id,
            period.month,
            period.year,
        )?),
        Command::Pay { item_id } => {
            print_json(&state.ledger_service.pay_item(user_id, &item_id).await?)
        }
        Command::Unpay { item_id } => {
            print_json(&state.ledger_service.unpay_item(user_id, &item_id).await?)
        }
        Command::Summary { period } => print_json(&state.report_service.financial_summary(
            user_id,
            period.month,
            period.year,
        )?),
        Command::Expenses { period } => print_json(&state.report_service.expenses_by_category(
            user_id,
            period.month,
            period.year,
        )?),
        Command::Upcoming { days } => {
            print_json(&state.report_service.upcoming_bills(user_id, days)?)
        }
        Command::Overdue => print_json(&state.report_service.overdue_bills(user_id)?),
        Command::Cards => print_json(&state.report_service.credit_cards_summary(user_id)?),
        Command::Yearly { year } => {
            print_json(&state.report_service.yearly_comparison(user_id, year)?)
        }
        Command::Dashboard => print_json(&state.report_service.dashboard(user_id)?),
        Command::AddCategory { name } => print_json(
            &state
                .category_repository
                .create(NewCategory {
                    id: None,
                    user_id: user,
                    name,
                })
                .await?,
        ),
        Command::AddCard {
            name,
            due_day,
            limit,
        } => print_json(
            &state
                .credit_card_repository
                .create(NewCreditCard {
                    id: None,
                    user_id: user,
                    name,
                    due_day,
                    total_limit: limit,
                })
                .await?,
        ),
        Command::AddFixed {
            name,
            due_day,
            amount,
            category,
        } => print_json(
            &state
                .fixed_bill_repository
                .create(NewFixedBill {
                    id: None,
                    user_id: user,
                    name,
                    due_day,
                    amount,
                    category_id: category,
                })
                .await?,
        ),
        Command::AddVariable {
            name,
            first_due_date,
            amount,
            installments,
            paid,
            category,
        } => print_json(
            &state
                .variable_bill_repository
                .create(NewVariableBill {
                    id: None,
                    user_id: user,
                    name,
                    first_due_date,
                    amount_per_installment: amount,
                    total_installments: installments,
                    paid_installments: paid,
                    category_id: category,
                })
                .await?,
        ),
        Command::AddPurchase {
            name,
            purchase_date,
            amount,
            installments,
            paid,
            card,
            category,
        } => print_json(
            &state
                .credit_purchase_repository
                .create(NewCreditPurchase {
                    id: None,
                    user_id: user,
                    name,
                    purchase_date,
                    amount_per_installment: amount,
                    total_installments: installments,
                    paid_installments: paid,
                    card_id: card,
                    category_id: category,
                })
                .await?,
        ),
        Command::AddIncome { name, date, amount } => print_json(
            &state
                .income_entry_repository
                .create(NewIncomeEntry {
                    id: None,
                    user_id: user,
                    name,
                    entry_date: date,
                    amount,
                })
                .await?,
        ),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env();
    init_tracing(config.log_format);

    let user_id = cli.user.unwrap_or_else(|| config.user_id.clone());
    let state = build_state(&config).await?;
    run(&state, &user_id, cli.command).await
}
