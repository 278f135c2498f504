use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};

/// A one-time cash inflow. Not an obligation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IncomeEntry {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub entry_date: NaiveDate,
    pub amount: Decimal,
}

impl IncomeEntry {
    /// Whether the money has been received by `today`.
    pub fn is_received_by(&self, today: NaiveDate) -> bool {
        self.entry_date <= today
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIncomeEntry {
    pub id: Option<String>,
    pub user_id: String,
    pub name: String,
    pub entry_date: NaiveDate,
    pub amount: Decimal,
}

impl NewIncomeEntry {
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "userId".to_string(),
            )));
        }
        if self.name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "name".to_string(),
            )));
        }
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(Error::invalid_input("amount must not be negative"));
        }
        Ok(())
    }
}
