//! Same-day, same-item upsert of a confirmed batch into the ledger.
//!
//! Every incoming item is stamped, then matched against the working set on
//! (lowercased item, date). A match accumulates into the existing row and
//! leaves its category, month and log time alone; anything else is appended.

use tracing::debug;

use crate::record::{ExpenseRecord, ExtractedItem, Stamp};

/// Merge `incoming` into `existing`, returning the full set to persist.
///
/// Existing rows keep their relative order and new rows are appended in
/// input order. Rows appended earlier in the batch are matchable by later
/// items of the same batch. An empty ledger takes the stamped batch as is.
pub fn merge(
    existing: Vec<ExpenseRecord>,
    incoming: &[ExtractedItem],
    stamp: &Stamp,
) -> Vec<ExpenseRecord> {
    if existing.is_empty() {
        return incoming.iter().map(|item| item.stamp(stamp)).collect();
    }

    let mut ledger = existing;

    for item in incoming {
        let record = item.stamp(stamp);
        let key = record.match_key();

        match ledger.iter_mut().find(|row| row.match_key() == key) {
            Some(row) => {
                debug!(item = %row.item, date = %row.date, add = record.amount, "accumulating");
                row.amount += record.amount;
            }
            None => {
                debug!(item = %record.item, date = %record.date, "appending");
                ledger.push(record);
            }
        }
    }

    ledger
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stamp_on(date: NaiveDate) -> Stamp {
        Stamp::new(date, NaiveTime::from_hms_opt(18, 30, 0).unwrap())
    }

    fn row(item: &str, category: &str, amount: f64, date: NaiveDate) -> ExpenseRecord {
        ExpenseRecord {
            item: item.to_string(),
            category: category.to_string(),
            amount,
            date,
            month: crate::record::month_of(date),
            log_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_empty_ledger_yields_stamped_batch() {
        let stamp = stamp_on(day(2024, 5, 1));
        let incoming = vec![
            ExtractedItem::new("Tea", "Food", 30.0),
            ExtractedItem::new("Bus", "Travel", 20.0),
        ];

        let out = merge(Vec::new(), &incoming, &stamp);

        let expected: Vec<_> = incoming.iter().map(|i| i.stamp(&stamp)).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_matching_item_accumulates() {
        let existing = vec![row("Tea", "Food", 50.0, day(2024, 5, 1))];
        let out = merge(
            existing.clone(),
            &[ExtractedItem::new("tea", "Drinks", 30.0)],
            &stamp_on(day(2024, 5, 1)),
        );

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].item, "Tea");
        assert_eq!(out[0].amount, 80.0);
        // Only the amount moves
        assert_eq!(out[0].category, existing[0].category);
        assert_eq!(out[0].month, existing[0].month);
        assert_eq!(out[0].log_time, existing[0].log_time);
    }

    #[test]
    fn test_unmatched_item_appends_one_row() {
        let existing = vec![row("Tea", "Food", 50.0, day(2024, 5, 1))];
        let out = merge(
            existing,
            &[ExtractedItem::new("Coffee", "Food", 40.0)],
            &stamp_on(day(2024, 5, 1)),
        );

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].item, "Tea");
        assert_eq!(out[0].amount, 50.0);
        assert_eq!(out[1].item, "Coffee");
        assert_eq!(out[1].amount, 40.0);
        assert_eq!(out[1].date, day(2024, 5, 1));
    }

    #[test]
    fn test_match_is_case_insensitive_and_date_exact() {
        let existing = vec![row("Ravi", "Labour", 5000.0, day(2024, 1, 1))];

        let same_day = merge(
            existing.clone(),
            &[ExtractedItem::new("ravi", "Labour", 100.0)],
            &stamp_on(day(2024, 1, 1)),
        );
        assert_eq!(same_day.len(), 1);
        assert_eq!(same_day[0].amount, 5100.0);

        let next_day = merge(
            existing,
            &[ExtractedItem::new("ravi", "Labour", 100.0)],
            &stamp_on(day(2024, 1, 2)),
        );
        assert_eq!(next_day.len(), 2);
        assert_eq!(next_day[0].amount, 5000.0);
        assert_eq!(next_day[1].item, "ravi");
    }

    #[test]
    fn test_other_rows_untouched() {
        let existing = vec![
            row("Rent", "Housing", 9000.0, day(2024, 5, 1)),
            row("Tea", "Food", 50.0, day(2024, 5, 1)),
            row("Tea", "Food", 20.0, day(2024, 4, 30)),
        ];
        let out = merge(
            existing.clone(),
            &[ExtractedItem::new("TEA", "Food", 5.0)],
            &stamp_on(day(2024, 5, 1)),
        );

        assert_eq!(out.len(), 3);
        assert_eq!(out[0], existing[0]);
        assert_eq!(out[1].amount, 55.0);
        assert_eq!(out[2], existing[2]);
    }

    #[test]
    fn test_new_rows_keep_input_order() {
        let existing = vec![row("Tea", "Food", 50.0, day(2024, 5, 1))];
        let out = merge(
            existing,
            &[
                ExtractedItem::new("Milk", "Food", 60.0),
                ExtractedItem::new("tea", "Food", 10.0),
                ExtractedItem::new("Auto", "Travel", 80.0),
            ],
            &stamp_on(day(2024, 5, 1)),
        );

        let items: Vec<_> = out.iter().map(|r| r.item.as_str()).collect();
        assert_eq!(items, ["Tea", "Milk", "Auto"]);
        assert_eq!(out[0].amount, 60.0);
    }

    #[test]
    fn test_duplicates_within_batch_accumulate() {
        let existing = vec![row("Rent", "Housing", 9000.0, day(2024, 5, 1))];
        let out = merge(
            existing,
            &[
                ExtractedItem::new("Milk", "Food", 30.0),
                ExtractedItem::new("milk", "Food", 25.0),
            ],
            &stamp_on(day(2024, 5, 1)),
        );

        assert_eq!(out.len(), 2);
        assert_eq!(out[1].item, "Milk");
        assert_eq!(out[1].amount, 55.0);
    }

    #[test]
    fn test_empty_ledger_keeps_batch_duplicates() {
        let out = merge(
            Vec::new(),
            &[
                ExtractedItem::new("Milk", "Food", 30.0),
                ExtractedItem::new("milk", "Food", 25.0),
            ],
            &stamp_on(day(2024, 5, 1)),
        );

        assert_eq!(out.len(), 2);
    }

    /// Resubmitting the same batch is additive: there is no de-duplication
    /// of accidental double submissions.
    #[test]
    fn test_double_submission_double_counts() {
        let stamp = stamp_on(day(2024, 5, 1));
        let batch = [ExtractedItem::new("Tea", "Food", 30.0)];

        let once = merge(Vec::new(), &batch, &stamp);
        let twice = merge(once, &batch, &stamp);

        assert_eq!(twice.len(), 1);
        assert_eq!(twice[0].amount, 60.0);
    }
}
