//! Obligation repository traits.
//!
//! One repository per obligation kind. The ledger engine only reads from
//! them, apart from the paid-installment counter of installment obligations.

use async_trait::async_trait;

use super::obligations_model::{
    Category, CreditCard, CreditPurchase, FixedBill, NewCategory, NewCreditCard,
    NewCreditPurchase, NewFixedBill, NewVariableBill, VariableBill,
};
use crate::errors::Result;

/// Trait for category repository operations
#[async_trait]
pub trait CategoryRepositoryTrait: Send + Sync {
    fn list_by_user(&self, user_id: &str) -> Result<Vec<Category>>;
    async fn create(&self, new_category: NewCategory) -> Result<Category>;
}

/// Trait for credit card repository operations
#[async_trait]
pub trait CreditCardRepositoryTrait: Send + Sync {
    fn list_by_user(&self, user_id: &str) -> Result<Vec<CreditCard>>;
    async fn create(&self, new_card: NewCreditCard) -> Result<CreditCard>;
}

/// Trait for fixed bill repository operations
#[async_trait]
pub trait FixedBillRepositoryTrait: Send + Sync {
    /// Lists the user's fixed bills with their category names resolved.
    fn list_by_user(&self, user_id: &str) -> Result<Vec<FixedBill>>;
    async fn create(&self, new_bill: NewFixedBill) -> Result<FixedBill>;
    async fn delete(&self, user_id: &str, bill_id: &str) -> Result<usize>;
}

/// Trait for variable (installment) bill repository operations
#[async_trait]
pub trait VariableBillRepositoryTrait: Send + Sync {
    fn list_by_user(&self, user_id: &str) -> Result<Vec<VariableBill>>;
    async fn create(&self, new_bill: NewVariableBill) -> Result<VariableBill>;
    async fn delete(&self, user_id: &str, bill_id: &str) -> Result<usize>;

    /// Overwrites the paid-installment counter.
    async fn set_paid_installments(&self, bill_id: &str, paid: u32) -> Result<()>;
}

/// Trait for credit purchase repository operations
#[async_trait]
pub trait CreditPurchaseRepositoryTrait: Send + Sync {
    /// Lists purchases made on the user's cards, joined with the card due day.
    fn list_by_user(&self, user_id: &str) -> Result<Vec<CreditPurchase>>;
    async fn create(&self, new_purchase: NewCreditPurchase) -> Result<CreditPurchase>;
    async fn delete(&self, user_id: &str, purchase_id: &str) -> Result<usize>;

    /// Overwrites the paid-installment counter.
    async fn set_paid_installments(&self, purchase_id: &str, paid: u32) -> Result<()>;
}
