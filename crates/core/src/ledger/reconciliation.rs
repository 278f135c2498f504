//! Pay/unpay transitions and the paid-installment counter rules.

use chrono::{DateTime, Utc};

use super::ledger_model::{CounterUpdate, ItemStatus, LedgerItem};
use crate::errors::{Error, Result};
use crate::obligations::Obligation;

/// `Pending -> Paid` or `Overdue -> Paid`.
pub fn mark_paid(item: &mut LedgerItem, now: DateTime<Utc>) -> Result<()> {
    if item.status == ItemStatus::Paid {
        return Err(Error::invalid_state(format!(
            "item '{}' is already paid",
            item.id
        )));
    }
    item.status = ItemStatus::Paid;
    item.paid_at = Some(now);
    Ok(())
}

/// `Paid -> Pending`. A later sweep may turn it Overdue again.
pub fn mark_unpaid(item: &mut LedgerItem) -> Result<()> {
    if item.status != ItemStatus::Paid {
        return Err(Error::invalid_state(format!(
            "item '{}' is not paid (status {})",
            item.id, item.status
        )));
    }
    item.status = ItemStatus::Pending;
    item.paid_at = None;
    Ok(())
}

/// Counter after paying installment `number`. Never decreases.
pub fn advanced_counter(current: u32, number: u32) -> u32 {
    current.max(number)
}

/// An installment at or below the counter is already settled. Such an item
/// can linger in a period generated before the counter moved.
pub fn ensure_unsettled(obligation: &Obligation, item: &LedgerItem) -> Result<()> {
    let counter = obligation.paid_installments();
    if let (Some(counter), Some(number)) = (counter, item.installment_number) {
        if number <= counter {
            return Err(Error::invalid_state(format!(
                "installment {} of {} is already settled (counter {})",
                number,
                obligation.reference(),
                counter
            )));
        }
    }
    Ok(())
}

/// Counter recomputed from the installments still Paid.
pub fn rescanned_counter<'a, I>(paid_items: I) -> u32
where
    I: IntoIterator<Item = &'a LedgerItem>,
{
    paid_items
        .into_iter()
        .filter(|item| item.is_paid())
        .filter_map(|item| item.installment_number)
        .max()
        .unwrap_or(0)
}

/// Applies a pay of `item` to its obligation's counter.
///
/// Returns the counter write to persist, `None` for fixed bills. Fails
/// `InvalidState` when the installment is already covered by the counter.
pub fn apply_pay(
    obligation: &mut Obligation,
    item: &LedgerItem,
) -> Result<Option<CounterUpdate>> {
    ensure_unsettled(obligation, item)?;
    let current = obligation.paid_installments();
    let (Some(current), Some(number)) = (current, item.installment_number) else {
        return Ok(None);
    };
    Ok(set_counter(obligation, advanced_counter(current, number)))
}

/// Applies an unpay to the obligation's counter given the Paid items that
/// remain across all periods (the reverted item excluded).
pub fn apply_unpay(
    obligation: &mut Obligation,
    remaining_paid: &[LedgerItem],
) -> Option<CounterUpdate> {
    obligation.paid_installments()?;
    set_counter(obligation, rescanned_counter(remaining_paid))
}

fn set_counter(obligation: &mut Obligation, paid: u32) -> Option<CounterUpdate> {
    let previous = obligation.paid_installments()?;
    if !obligation.set_paid_installments(paid) {
        return None;
    }
    Some(CounterUpdate {
        obligation: obligation.reference(),
        previous,
        paid_installments: obligation.paid_installments().unwrap_or(paid),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obligations::{ObligationKind, VariableBill};
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal_macros::dec;

    fn item(number: Option<u32>, status: ItemStatus) -> LedgerItem {
        LedgerItem {
            id: format!("p{}:VARIABLE:v1", number.unwrap_or(0)),
            period_id: "p".to_string(),
            obligation_kind: ObligationKind::Variable,
            obligation_id: "v1".to_string(),
            name: "Sofa".to_string(),
            installment_number: number,
            due_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            amount: dec!(150),
            status,
            paid_at: None,
            category_name: "Home".to_string(),
        }
    }

    fn bill(paid: u32) -> Obligation {
        Obligation::Variable(VariableBill {
            id: "v1".to_string(),
            user_id: "u1".to_string(),
            name: "Sofa".to_string(),
            first_due_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            amount_per_installment: dec!(150),
            total_installments: 5,
            paid_installments: paid,
            category_id: "c1".to_string(),
            category_name: "Home".to_string(),
        })
    }

    #[test]
    fn test_mark_paid_and_unpaid_transitions() {
        let now = Utc.with_ymd_and_hms(2025, 1, 12, 9, 0, 0).unwrap();
        let mut overdue = item(Some(1), ItemStatus::Overdue);
        mark_paid(&mut overdue, now).unwrap();
        assert_eq!(overdue.status, ItemStatus::Paid);
        assert_eq!(overdue.paid_at, Some(now));

        assert!(matches!(
            mark_paid(&mut overdue, now),
            Err(Error::InvalidState(_))
        ));

        mark_unpaid(&mut overdue).unwrap();
        assert_eq!(overdue.status, ItemStatus::Pending);
        assert_eq!(overdue.paid_at, None);
        assert!(matches!(
            mark_unpaid(&mut overdue),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_pay_ahead_advances_counter() {
        let mut obligation = bill(0);
        let update = apply_pay(&mut obligation, &item(Some(3), ItemStatus::Paid))
            .unwrap()
            .unwrap();
        assert_eq!(update.previous, 0);
        assert_eq!(update.paid_installments, 3);
        assert_eq!(obligation.paid_installments(), Some(3));
    }

    #[test]
    fn test_pay_of_settled_installment_is_rejected() {
        let mut obligation = bill(1);
        let err = apply_pay(&mut obligation, &item(Some(1), ItemStatus::Paid)).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(obligation.paid_installments(), Some(1));

        let mut obligation = bill(3);
        assert!(apply_pay(&mut obligation, &item(Some(2), ItemStatus::Paid)).is_err());
        assert_eq!(obligation.paid_installments(), Some(3));
    }

    #[test]
    fn test_unpay_rescans_to_next_highest() {
        let mut obligation = bill(4);
        let remaining = vec![item(Some(1), ItemStatus::Paid), item(Some(2), ItemStatus::Paid)];
        let update = apply_unpay(&mut obligation, &remaining).unwrap();
        assert_eq!(update.previous, 4);
        assert_eq!(update.paid_installments, 2);

        let update = apply_unpay(&mut obligation, &[]).unwrap();
        assert_eq!(update.paid_installments, 0);
    }

    #[test]
    fn test_rescan_ignores_unpaid_items() {
        let items = vec![item(Some(4), ItemStatus::Pending), item(Some(2), ItemStatus::Paid)];
        assert_eq!(rescanned_counter(&items), 2);
    }
}
