//! The rebuild pipeline shared by generate, update, pay and unpay.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use log::{debug, warn};

use super::aggregate::aggregate;
use super::ledger_model::{ItemStatus, LedgerItem, LedgerPeriod};
use super::overdue::sweep;
use super::schedule::{item_for, project, sort_items};
use crate::income::IncomeEntry;
use crate::obligations::{Obligation, ObligationRef};
use crate::utils::YearMonth;

/// Rebuilds `period`'s item set from the current obligation state.
///
/// `period.items` holds the item set being replaced. Its Paid items are carried
/// over while the obligation still exists and, for installment obligations,
/// the counter still covers the installment. Everything else is projected
/// again, swept and re-aggregated. Obligation counters must already reflect
/// any pay or unpay being applied.
pub fn rebuild_period(
    mut period: LedgerPeriod,
    obligations: &[Obligation],
    income: &[IncomeEntry],
    now: DateTime<Utc>,
) -> LedgerPeriod {
    let target = period.year_month();
    let previous = std::mem::take(&mut period.items);

    let mut items = carry_settled(&period.id, &previous, obligations, target);
    let settled: HashSet<ObligationRef> = items.iter().map(LedgerItem::obligation_ref).collect();

    let open: Vec<Obligation> = obligations
        .iter()
        .filter(|obligation| !settled.contains(&obligation.reference()))
        .cloned()
        .collect();
    items.extend(project(&period.id, &open, target));
    sort_items(&mut items);

    let flipped = sweep(&mut items, target, now);
    let totals = aggregate(&items, income, target, now.date_naive());
    debug!(
        "Rebuilt period {} ({}) with {} items, {} overdue",
        period.id,
        target,
        items.len(),
        flipped
    );

    period.items = items;
    period.apply_totals(totals);
    period.updated_at = now.naive_utc();
    period
}

fn carry_settled(
    period_id: &str,
    previous: &[LedgerItem],
    obligations: &[Obligation],
    target: YearMonth,
) -> Vec<LedgerItem> {
    let mut carried = Vec::new();
    for old in previous.iter().filter(|item| item.is_paid()) {
        let reference = old.obligation_ref();
        let Some(obligation) = obligations.iter().find(|o| o.reference() == reference) else {
            warn!(
                "Dropping paid item {}: obligation {} no longer exists",
                old.id, reference
            );
            continue;
        };
        if let (Some(counter), Some(number)) =
            (obligation.paid_installments(), old.installment_number)
        {
            if number > counter {
                warn!(
                    "Dropping paid item {}: installment {} exceeds counter {}",
                    old.id, number, counter
                );
                continue;
            }
        }
        let mut item = item_for(period_id, obligation, target, old.installment_number);
        item.status = ItemStatus::Paid;
        item.paid_at = old.paid_at;
        carried.push(item);
    }
    carried
}
