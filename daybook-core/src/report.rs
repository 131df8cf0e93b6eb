//! Daily view and monthly aggregates over the ledger.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::record::ExpenseRecord;

/// Aggregates for a single `YYYY-MM` month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReport {
    pub month: String,
    pub total: f64,
    pub entry_count: usize,
    /// Sum per category, largest first
    pub by_category: Vec<(String, f64)>,
    /// Sum per day, oldest first
    pub daily: Vec<(NaiveDate, f64)>,
}

impl MonthlyReport {
    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }
}

/// Rows logged for `date`.
pub fn entries_on(ledger: &[ExpenseRecord], date: NaiveDate) -> Vec<&ExpenseRecord> {
    ledger.iter().filter(|r| r.date == date).collect()
}

/// Build the report for `month`, filtering on the stored `Month` column.
pub fn monthly_report(ledger: &[ExpenseRecord], month: &str) -> MonthlyReport {
    let rows: Vec<&ExpenseRecord> = ledger.iter().filter(|r| r.month == month).collect();

    let mut categories: BTreeMap<&str, f64> = BTreeMap::new();
    let mut days: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for r in &rows {
        *categories.entry(r.category.as_str()).or_insert(0.0) += r.amount;
        *days.entry(r.date).or_insert(0.0) += r.amount;
    }

    let mut by_category: Vec<(String, f64)> = categories
        .into_iter()
        .map(|(c, v)| (c.to_string(), v))
        .collect();
    // BTreeMap gives name order; stable sort keeps it for equal amounts
    by_category.sort_by(|a, b| b.1.total_cmp(&a.1));

    MonthlyReport {
        month: month.to_string(),
        total: rows.iter().map(|r| r.amount).sum(),
        entry_count: rows.len(),
        by_category,
        daily: days.into_iter().collect(),
    }
}
