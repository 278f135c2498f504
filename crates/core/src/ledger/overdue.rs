//! Time-driven transition of stale Pending items to Overdue.

use chrono::{DateTime, Utc};

use super::ledger_model::{ItemStatus, LedgerItem};
use crate::utils::time_utils::start_of_day_utc;
use crate::utils::YearMonth;

/// Flips Pending items due before `now` to Overdue.
///
/// Periods after the month containing `now` are left untouched. Paid items
/// never change. Returns the number of items flipped.
pub fn sweep(items: &mut [LedgerItem], period: YearMonth, now: DateTime<Utc>) -> usize {
    if period > YearMonth::of(now.date_naive()) {
        return 0;
    }
    let mut flipped = 0;
    for item in items.iter_mut() {
        if item.status == ItemStatus::Pending && is_past_due(item, now) {
            item.status = ItemStatus::Overdue;
            flipped += 1;
        }
    }
    flipped
}

/// The item's due date (start of day, UTC) lies strictly before `now`.
pub fn is_past_due(item: &LedgerItem, now: DateTime<Utc>) -> bool {
    start_of_day_utc(item.due_date) < now
}
