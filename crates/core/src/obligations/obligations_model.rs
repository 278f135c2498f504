//! Obligation domain models.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};

/// The recurring-obligation model an item was projected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObligationKind {
    /// Recurs every month, no counter.
    Fixed,
    /// Fixed number of monthly installments starting at a first due date.
    Variable,
    /// Card purchase split in installments, billed from the month after purchase.
    Credit,
}

impl ObligationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObligationKind::Fixed => "FIXED",
            ObligationKind::Variable => "VARIABLE",
            ObligationKind::Credit => "CREDIT",
        }
    }
}

impl fmt::Display for ObligationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObligationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "FIXED" => Ok(ObligationKind::Fixed),
            "VARIABLE" => Ok(ObligationKind::Variable),
            "CREDIT" => Ok(ObligationKind::Credit),
            other => Err(Error::invalid_input(format!(
                "unknown obligation kind '{}'",
                other
            ))),
        }
    }
}

/// Back-reference from a ledger item to the obligation it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObligationRef {
    pub kind: ObligationKind,
    pub id: String,
}

impl ObligationRef {
    pub fn new(kind: ObligationKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for ObligationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Domain model representing an expense category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub user_id: String,
    pub name: String,
}

/// Input model for creating a new category
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub id: Option<String>,
    pub user_id: String,
    pub name: String,
}

impl NewCategory {
    pub fn validate(&self) -> Result<()> {
        require_text(&self.user_id, "userId")?;
        require_text(&self.name, "name")
    }
}

/// Domain model representing a credit card
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreditCard {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub due_day: u32,
    pub total_limit: Decimal,
}

/// Input model for creating a new credit card
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCreditCard {
    pub id: Option<String>,
    pub user_id: String,
    pub name: String,
    pub due_day: u32,
    pub total_limit: Decimal,
}

impl NewCreditCard {
    pub fn validate(&self) -> Result<()> {
        require_text(&self.user_id, "userId")?;
        require_text(&self.name, "name")?;
        validate_due_day(self.due_day)?;
        require_non_negative(self.total_limit, "totalLimit")
    }
}

/// A bill that is due every month on the same day, indefinitely.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FixedBill {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub due_day: u32,
    pub amount: Decimal,
    pub category_id: String,
    pub category_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFixedBill {
    pub id: Option<String>,
    pub user_id: String,
    pub name: String,
    pub due_day: u32,
    pub amount: Decimal,
    pub category_id: String,
}

impl NewFixedBill {
    pub fn validate(&self) -> Result<()> {
        require_text(&self.user_id, "userId")?;
        require_text(&self.name, "name")?;
        require_text(&self.category_id, "categoryId")?;
        validate_due_day(self.due_day)?;
        require_non_negative(self.amount, "amount")
    }
}

/// A bill paid in a fixed number of monthly installments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VariableBill {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub first_due_date: NaiveDate,
    pub amount_per_installment: Decimal,
    pub total_installments: u32,
    pub paid_installments: u32,
    pub category_id: String,
    pub category_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVariableBill {
    pub id: Option<String>,
    pub user_id: String,
    pub name: String,
    pub first_due_date: NaiveDate,
    pub amount_per_installment: Decimal,
    pub total_installments: u32,
    #[serde(default)]
    pub paid_installments: u32,
    pub category_id: String,
}

impl NewVariableBill {
    pub fn validate(&self) -> Result<()> {
        require_text(&self.user_id, "userId")?;
        require_text(&self.name, "name")?;
        require_text(&self.category_id, "categoryId")?;
        require_non_negative(self.amount_per_installment, "amountPerInstallment")?;
        validate_installments(self.total_installments, self.paid_installments)
    }
}

/// A purchase on a credit card, split in installments billed on the card's due day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreditPurchase {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub purchase_date: NaiveDate,
    pub amount_per_installment: Decimal,
    pub total_installments: u32,
    pub paid_installments: u32,
    pub card_id: String,
    /// Due day of the card the purchase was made with.
    pub card_due_day: u32,
    pub category_id: String,
    pub category_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCreditPurchase {
    pub id: Option<String>,
    pub user_id: String,
    pub name: String,
    pub purchase_date: NaiveDate,
    pub amount_per_installment: Decimal,
    pub total_installments: u32,
    #[serde(default)]
    pub paid_installments: u32,
    pub card_id: String,
    pub category_id: String,
}

impl NewCreditPurchase {
    pub fn validate(&self) -> Result<()> {
        require_text(&self.user_id, "userId")?;
        require_text(&self.name, "name")?;
        require_text(&self.card_id, "cardId")?;
        require_text(&self.category_id, "categoryId")?;
        require_non_negative(self.amount_per_installment, "amountPerInstallment")?;
        validate_installments(self.total_installments, self.paid_installments)
    }
}

/// Any source of due payments the schedule generator projects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Obligation {
    Fixed(FixedBill),
    Variable(VariableBill),
    Credit(CreditPurchase),
}

impl Obligation {
    pub fn kind(&self) -> ObligationKind {
        match self {
            Obligation::Fixed(_) => ObligationKind::Fixed,
            Obligation::Variable(_) => ObligationKind::Variable,
            Obligation::Credit(_) => ObligationKind::Credit,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Obligation::Fixed(bill) => &bill.id,
            Obligation::Variable(bill) => &bill.id,
            Obligation::Credit(purchase) => &purchase.id,
        }
    }

    pub fn reference(&self) -> ObligationRef {
        ObligationRef::new(self.kind(), self.id())
    }

    pub fn name(&self) -> &str {
        match self {
            Obligation::Fixed(bill) => &bill.name,
            Obligation::Variable(bill) => &bill.name,
            Obligation::Credit(purchase) => &purchase.name,
        }
    }

    pub fn category_name(&self) -> &str {
        match self {
            Obligation::Fixed(bill) => &bill.category_name,
            Obligation::Variable(bill) => &bill.category_name,
            Obligation::Credit(purchase) => &purchase.category_name,
        }
    }

    /// `(paid, total)` for installment obligations; `None` for fixed bills.
    pub fn installments(&self) -> Option<(u32, u32)> {
        match self {
            Obligation::Fixed(_) => None,
            Obligation::Variable(bill) => Some((bill.paid_installments, bill.total_installments)),
            Obligation::Credit(purchase) => {
                Some((purchase.paid_installments, purchase.total_installments))
            }
        }
    }

    pub fn paid_installments(&self) -> Option<u32> {
        self.installments().map(|(paid, _)| paid)
    }

    /// Overwrites the paid counter, capped at the total. Returns `false` for
    /// obligations without a counter.
    pub fn set_paid_installments(&mut self, paid: u32) -> bool {
        match self {
            Obligation::Fixed(_) => false,
            Obligation::Variable(bill) => {
                bill.paid_installments = paid.min(bill.total_installments);
                true
            }
            Obligation::Credit(purchase) => {
                purchase.paid_installments = paid.min(purchase.total_installments);
                true
            }
        }
    }
}

impl From<FixedBill> for Obligation {
    fn from(bill: FixedBill) -> Self {
        Obligation::Fixed(bill)
    }
}

impl From<VariableBill> for Obligation {
    fn from(bill: VariableBill) -> Self {
        Obligation::Variable(bill)
    }
}

impl From<CreditPurchase> for Obligation {
    fn from(purchase: CreditPurchase) -> Self {
        Obligation::Credit(purchase)
    }
}

fn require_text(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(ValidationError::MissingField(
            field.to_string(),
        )));
    }
    Ok(())
}

fn require_non_negative(value: Decimal, field: &str) -> Result<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(Error::invalid_input(format!(
            "{} must not be negative",
            field
        )));
    }
    Ok(())
}

fn validate_due_day(day: u32) -> Result<()> {
    if !(1..=31).contains(&day) {
        return Err(Error::invalid_input(format!(
            "dueDay must be between 1 and 31, got {}",
            day
        )));
    }
    Ok(())
}

fn validate_installments(total: u32, paid: u32) -> Result<()> {
    if total == 0 {
        return Err(Error::invalid_input(
            "totalInstallments must be at least 1",
        ));
    }
    if paid > total {
        return Err(Error::invalid_input(format!(
            "paidInstallments ({}) exceeds totalInstallments ({})",
            paid, total
        )));
    }
    Ok(())
}
