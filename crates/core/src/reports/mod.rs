//! Reports module - summaries, category breakdowns and card usage.

mod reports_model;
mod reports_service;
mod reports_traits;


pub use reports_model::{
    CategoryExpense, CreditCardSummary, Dashboard, FinancialSummary, MonthlyComparison,
};
pub use reports_service::{percentage, ReportService, DASHBOARD_UPCOMING_DAYS};
pub use reports_traits::ReportServiceTrait;
