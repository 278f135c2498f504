//! Obligations module - fixed bills, installment bills, card purchases and
//! the cards and categories they reference.

mod obligations_model;
mod obligations_traits;

pub use obligations_model::{
    Category, CreditCard, CreditPurchase, FixedBill, NewCategory, NewCreditCard,
    NewCreditPurchase, NewFixedBill, NewVariableBill, Obligation, ObligationKind, ObligationRef,
    VariableBill,
};
pub use obligations_traits::{
    CategoryRepositoryTrait, CreditCardRepositoryTrait, CreditPurchaseRepositoryTrait,
    FixedBillRepositoryTrait, VariableBillRepositoryTrait,
};
