//! Database models for obligations and the cards and categories they reference.

use diesel::prelude::*;

use billbook_core::obligations::{
    Category, CreditCard, CreditPurchase, FixedBill, NewCategory, NewCreditCard,
    NewCreditPurchase, NewFixedBill, NewVariableBill, VariableBill,
};
use billbook_core::Result;

use crate::utils::{format_date, format_decimal, parse_date, parse_decimal, to_i32, to_u32};

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::categories)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CategoryDB {
    pub id: String,
    pub user_id: String,
    pub name: String,
}

impl CategoryDB {
    pub fn from_new(new: NewCategory, id: String) -> Self {
        Self {
            id,
            user_id: new.user_id,
            name: new.name,
        }
    }
}

impl From<CategoryDB> for Category {
    fn from(db: CategoryDB) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            name: db.name,
        }
    }
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::credit_cards)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CreditCardDB {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub due_day: i32,
    pub total_limit: String,
}

impl CreditCardDB {
    pub fn from_new(new: NewCreditCard, id: String) -> Result<Self> {
        Ok(Self {
            id,
            user_id: new.user_id,
            name: new.name,
            due_day: to_i32(new.due_day, "due_day")?,
            total_limit: format_decimal(&new.total_limit),
        })
    }
}

impl TryFrom<CreditCardDB> for CreditCard {
    type Error = billbook_core::Error;

    fn try_from(db: CreditCardDB) -> Result<Self> {
        Ok(Self {
            due_day: to_u32(db.due_day, "credit_cards.due_day")?,
            total_limit: parse_decimal(&db.total_limit, "credit_cards.total_limit")?,
            id: db.id,
            user_id: db.user_id,
            name: db.name,
        })
    }
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::fixed_bills)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FixedBillDB {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub due_day: i32,
    pub amount: String,
    pub category_id: String,
}

impl FixedBillDB {
    pub fn from_new(new: NewFixedBill, id: String) -> Result<Self> {
        Ok(Self {
            id,
            user_id: new.user_id,
            name: new.name,
            due_day: to_i32(new.due_day, "due_day")?,
            amount: format_decimal(&new.amount),
            category_id: new.category_id,
        })
    }

    pub fn into_domain(self, category_name: String) -> Result<FixedBill> {
        Ok(FixedBill {
            due_day: to_u32(self.due_day, "fixed_bills.due_day")?,
            amount: parse_decimal(&self.amount, "fixed_bills.amount")?,
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            category_id: self.category_id,
            category_name,
        })
    }
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::variable_bills)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct VariableBillDB {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub first_due_date: String,
    pub amount_per_installment: String,
    pub total_installments: i32,
    pub paid_installments: i32,
    pub category_id: String,
}

impl VariableBillDB {
    pub fn from_new(new: NewVariableBill, id: String) -> Result<Self> {
        Ok(Self {
            id,
            user_id: new.user_id,
            name: new.name,
            first_due_date: format_date(new.first_due_date),
            amount_per_installment: format_decimal(&new.amount_per_installment),
            total_installments: to_i32(new.total_installments, "total_installments")?,
            paid_installments: to_i32(new.paid_installments, "paid_installments")?,
            category_id: new.category_id,
        })
    }

    pub fn into_domain(self, category_name: String) -> Result<VariableBill> {
        Ok(VariableBill {
            first_due_date: parse_date(&self.first_due_date, "variable_bills.first_due_date")?,
            amount_per_installment: parse_decimal(
                &self.amount_per_installment,
                "variable_bills.amount_per_installment",
            )?,
            total_installments: to_u32(
                self.total_installments,
                "variable_bills.total_installments",
            )?,
            paid_installments: to_u32(self.paid_installments, "variable_bills.paid_installments")?,
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            category_id: self.category_id,
            category_name,
        })
    }
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::credit_purchases)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CreditPurchaseDB {
    pub id: String,
    pub user_id: String,
    pub card_id: String,
    pub name: String,
    pub purchase_date: String,
    pub amount_per_installment: String,
    pub total_installments: i32,
    pub paid_installments: i32,
    pub category_id: String,
}

impl CreditPurchaseDB {
    pub fn from_new(new: NewCreditPurchase, id: String) -> Result<Self> {
        Ok(Self {
            id,
            user_id: new.user_id,
            card_id: new.card_id,
            name: new.name,
            purchase_date: format_date(new.purchase_date),
            amount_per_installment: format_decimal(&new.amount_per_installment),
            total_installments: to_i32(new.total_installments, "total_installments")?,
            paid_installments: to_i32(new.paid_installments, "paid_installments")?,
            category_id: new.category_id,
        })
    }

    pub fn into_domain(self, card_due_day: i32, category_name: String) -> Result<CreditPurchase> {
        Ok(CreditPurchase {
            purchase_date: parse_date(&self.purchase_date, "credit_purchases.purchase_date")?,
            amount_per_installment: parse_decimal(
                &self.amount_per_installment,
                "credit_purchases.amount_per_installment",
            )?,
            total_installments: to_u32(
                self.total_installments,
                "credit_purchases.total_installments",
            )?,
            paid_installments: to_u32(
                self.paid_installments,
                "credit_purchases.paid_installments",
            )?,
            card_due_day: to_u32(card_due_day, "credit_cards.due_day")?,
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            card_id: self.card_id,
            category_id: self.category_id,
            category_name,
        })
    }
}
