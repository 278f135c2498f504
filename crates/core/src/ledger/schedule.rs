//! Projection of obligations into the due items of one month.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use super::ledger_model::{ItemStatus, LedgerItem};
use crate::obligations::{CreditPurchase, Obligation, VariableBill};
use crate::utils::time_utils::months_between;
use crate::utils::YearMonth;

/// Projects `obligations` into Pending items for `target`, ordered by due
/// date (ties broken by item id).
pub fn project(period_id: &str, obligations: &[Obligation], target: YearMonth) -> Vec<LedgerItem> {
    let mut items: Vec<LedgerItem> = obligations
        .iter()
        .filter_map(|obligation| project_one(period_id, obligation, target))
        .collect();
    sort_items(&mut items);
    items
}

/// Projects a single obligation, `None` when nothing is due for `target`.
pub fn project_one(
    period_id: &str,
    obligation: &Obligation,
    target: YearMonth,
) -> Option<LedgerItem> {
    match obligation {
        Obligation::Fixed(_) => Some(item_for(period_id, obligation, target, None)),
        Obligation::Variable(bill) => variable_item(period_id, obligation, bill, target),
        Obligation::Credit(purchase) => credit_item(period_id, obligation, purchase, target),
    }
}

/// Orders items by due date, then id.
pub fn sort_items(items: &mut [LedgerItem]) {
    items.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.id.cmp(&b.id)));
}

/// Installment due in `target`, or `None`.
///
/// `scheduled` is the installment the calendar says is due. The item shown is
/// always the first unpaid one (`paid + 1`), so an unpaid installment keeps
/// resurfacing in later months until it is settled, and nothing is shown once
/// the counter has caught up with or passed the schedule.
pub fn next_installment(scheduled: i32, paid: u32, total: u32) -> Option<u32> {
    if scheduled < 1 || paid >= total {
        return None;
    }
    let next = paid + 1;
    if i64::from(next) > i64::from(scheduled) {
        return None;
    }
    Some(next)
}

/// Display name of an installment item, `"Name (k/N)"`.
pub fn installment_name(name: &str, number: u32, total: u32) -> String {
    format!("{} ({}/{})", name, number, total)
}

/// Builds the item of `obligation` for `target` carrying `installment_number`.
///
/// Due date, amount, name and category always come from the obligation's
/// current definition.
pub fn item_for(
    period_id: &str,
    obligation: &Obligation,
    target: YearMonth,
    installment_number: Option<u32>,
) -> LedgerItem {
    let (name, due_day, amount) = match obligation {
        Obligation::Fixed(bill) => (bill.name.clone(), bill.due_day, bill.amount),
        Obligation::Variable(bill) => (
            display_name(&bill.name, installment_number, bill.total_installments),
            bill.first_due_date.day(),
            bill.amount_per_installment,
        ),
        Obligation::Credit(purchase) => (
            display_name(&purchase.name, installment_number, purchase.total_installments),
            purchase.card_due_day,
            purchase.amount_per_installment,
        ),
    };
    build_item(
        period_id,
        obligation,
        name,
        installment_number,
        target.day_clamped(due_day),
        amount,
    )
}

fn display_name(name: &str, number: Option<u32>, total: u32) -> String {
    match number {
        Some(number) => installment_name(name, number, total),
        None => name.to_string(),
    }
}

fn variable_item(
    period_id: &str,
    obligation: &Obligation,
    bill: &VariableBill,
    target: YearMonth,
) -> Option<LedgerItem> {
    let scheduled = months_between(bill.first_due_date, target) + 1;
    let number = next_installment(scheduled, bill.paid_installments, bill.total_installments)?;
    Some(item_for(period_id, obligation, target, Some(number)))
}

fn credit_item(
    period_id: &str,
    obligation: &Obligation,
    purchase: &CreditPurchase,
    target: YearMonth,
) -> Option<LedgerItem> {
    // The purchase month itself never bills.
    let scheduled = months_between(purchase.purchase_date, target);
    let number = next_installment(
        scheduled,
        purchase.paid_installments,
        purchase.total_installments,
    )?;
    Some(item_for(period_id, obligation, target, Some(number)))
}

fn build_item(
    period_id: &str,
    obligation: &Obligation,
    name: String,
    installment_number: Option<u32>,
    due_date: NaiveDate,
    amount: Decimal,
) -> LedgerItem {
    let reference = obligation.reference();
    LedgerItem {
        id: LedgerItem::derive_id(period_id, &reference),
        period_id: period_id.to_string(),
        obligation_kind: reference.kind,
        obligation_id: reference.id,
        name,
        installment_number,
        due_date,
        amount,
        status: ItemStatus::Pending,
        paid_at: None,
        category_name: obligation.category_name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obligations::FixedBill;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ym(y: i32, m: u32) -> YearMonth {
        YearMonth::new(y, m).unwrap()
    }

    fn fixed(due_day: u32) -> Obligation {
        Obligation::Fixed(FixedBill {
            id: "f1".to_string(),
            user_id: "u1".to_string(),
            name: "Rent".to_string(),
            due_day,
            amount: dec!(1200),
            category_id: "c1".to_string(),
            category_name: "Home".to_string(),
        })
    }

    fn variable(first_due: NaiveDate, total: u32, paid: u32) -> Obligation {
        Obligation::Variable(VariableBill {
            id: "v1".to_string(),
            user_id: "u1".to_string(),
            name: "Sofa".to_string(),
            first_due_date: first_due,
            amount_per_installment: dec!(150),
            total_installments: total,
            paid_installments: paid,
            category_id: "c1".to_string(),
            category_name: "Home".to_string(),
        })
    }

    fn credit(purchase_date: NaiveDate, card_due_day: u32, total: u32, paid: u32) -> Obligation {
        Obligation::Credit(CreditPurchase {
            id: "p1".to_string(),
            user_id: "u1".to_string(),
            name: "Laptop".to_string(),
            purchase_date,
            amount_per_installment: dec!(400),
            total_installments: total,
            paid_installments: paid,
            card_id: "card1".to_string(),
            card_due_day,
            category_id: "c2".to_string(),
            category_name: "Tech".to_string(),
        })
    }

    #[test]
    fn test_fixed_bill_clamps_to_month_length() {
        let item = project_one("p", &fixed(31), ym(2025, 2)).unwrap();
        assert_eq!(item.due_date, date(2025, 2, 28));
        let item = project_one("p", &fixed(31), ym(2024, 2)).unwrap();
        assert_eq!(item.due_date, date(2024, 2, 29));
        assert_eq!(item.installment_number, None);
        assert_eq!(item.name, "Rent");
        assert_eq!(item.status, ItemStatus::Pending);
    }

    #[test]
    fn test_variable_bill_catches_up_unpaid_installment() {
        let bill = variable(date(2025, 1, 10), 3, 0);
        let jan = project_one("p", &bill, ym(2025, 1)).unwrap();
        assert_eq!(jan.installment_number, Some(1));
        assert_eq!(jan.due_date, date(2025, 1, 10));
        assert_eq!(jan.name, "Sofa (1/3)");

        let mar = project_one("p", &bill, ym(2025, 3)).unwrap();
        assert_eq!(mar.installment_number, Some(1));
        assert_eq!(mar.due_date, date(2025, 3, 10));
    }

    #[test]
    fn test_variable_bill_before_first_due_month_is_skipped() {
        let bill = variable(date(2025, 1, 10), 3, 0);
        assert!(project_one("p", &bill, ym(2024, 12)).is_none());
    }

    #[test]
    fn test_variable_bill_suppressed_once_paid_ahead_or_done() {
        let ahead = variable(date(2025, 1, 10), 3, 2);
        assert!(project_one("p", &ahead, ym(2025, 2)).is_none());
        let third = project_one("p", &ahead, ym(2025, 3)).unwrap();
        assert_eq!(third.installment_number, Some(3));

        let done = variable(date(2025, 1, 10), 3, 3);
        assert!(project_one("p", &done, ym(2025, 6)).is_none());
    }

    #[test]
    fn test_variable_bill_uses_clamped_first_due_day() {
        let bill = variable(date(2025, 1, 31), 6, 1);
        let feb = project_one("p", &bill, ym(2025, 2)).unwrap();
        assert_eq!(feb.due_date, date(2025, 2, 28));
        assert_eq!(feb.installment_number, Some(2));
    }

    #[test]
    fn test_credit_purchase_skips_purchase_month() {
        let purchase = credit(date(2025, 1, 15), 5, 2, 0);
        assert!(project_one("p", &purchase, ym(2025, 1)).is_none());

        let feb = project_one("p", &purchase, ym(2025, 2)).unwrap();
        assert_eq!(feb.installment_number, Some(1));
        assert_eq!(feb.due_date, date(2025, 2, 5));
        assert_eq!(feb.category_name, "Tech");
        assert_eq!(feb.name, "Laptop (1/2)");
    }

    #[test]
    fn test_credit_purchase_stops_after_last_installment() {
        let purchase = credit(date(2025, 1, 15), 5, 2, 2);
        assert!(project_one("p", &purchase, ym(2025, 3)).is_none());
        assert!(project_one("p", &purchase, ym(2025, 4)).is_none());
    }

    #[test]
    fn test_project_orders_by_due_date() {
        let obligations = vec![
            fixed(20),
            variable(date(2025, 1, 10), 3, 0),
            credit(date(2024, 12, 1), 5, 2, 0),
        ];
        let items = project("p", &obligations, ym(2025, 1));
        let days: Vec<u32> = items.iter().map(|i| i.due_date.day()).collect();
        assert_eq!(days, vec![5, 10, 20]);
        assert_eq!(items[0].id, "p:CREDIT:p1");
    }

    #[test]
    fn test_next_installment_rules() {
        assert_eq!(next_installment(0, 0, 3), None);
        assert_eq!(next_installment(-4, 0, 3), None);
        assert_eq!(next_installment(1, 0, 3), Some(1));
        assert_eq!(next_installment(5, 0, 3), Some(1));
        assert_eq!(next_installment(5, 2, 3), Some(3));
        assert_eq!(next_installment(2, 2, 3), None);
        assert_eq!(next_installment(9, 3, 3), None);
    }
}
