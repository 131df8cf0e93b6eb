//! Expense record types for the daybook ledger

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Column names used by every ledger backend, in persisted order.
pub const LEDGER_COLUMNS: [&str; 6] = ["Item", "Category", "Amount", "Date", "Month", "Log_Time"];

/// Category assigned when the extractor leaves it out.
pub const DEFAULT_CATEGORY: &str = "Others";

/// One logged expense line, as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpenseRecord {
    /// Free-text label; matched case-insensitively
    #[serde(rename = "Item")]
    pub item: String,
    #[serde(rename = "Category")]
    pub category: String,
    /// Non-negative, additive
    #[serde(rename = "Amount")]
    pub amount: f64,
    /// Day the record belongs to (YYYY-MM-DD)
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    /// YYYY-MM, derived from `date`
    #[serde(rename = "Month")]
    pub month: String,
    /// Wall-clock submission time, informational only
    #[serde(rename = "Log_Time")]
    pub log_time: NaiveTime,
}

/// A line item as returned by extraction, before it is stamped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedItem {
    #[serde(rename = "Item")]
    pub item: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Amount")]
    pub amount: f64,
}

impl ExtractedItem {
    pub fn new(item: impl Into<String>, category: impl Into<String>, amount: f64) -> Self {
        Self {
            item: item.into(),
            category: category.into(),
            amount,
        }
    }

    /// Turn this item into a ledger row belonging to `stamp`.
    pub fn stamp(&self, stamp: &Stamp) -> ExpenseRecord {
        ExpenseRecord {
            item: self.item.clone(),
            category: self.category.clone(),
            amount: self.amount,
            date: stamp.date,
            month: stamp.month.clone(),
            log_time: stamp.log_time,
        }
    }
}

/// Date, month and time applied to a confirmed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    pub date: NaiveDate,
    pub month: String,
    pub log_time: NaiveTime,
}

impl Stamp {
    /// Build a stamp for `date`/`log_time`, deriving the month.
    pub fn new(date: NaiveDate, log_time: NaiveTime) -> Self {
        Self {
            date,
            month: month_of(date),
            log_time,
        }
    }
}

impl ExpenseRecord {
    /// Key used to decide whether two rows describe the same expense.
    pub fn match_key(&self) -> (String, NaiveDate) {
        (self.item.to_lowercase(), self.date)
    }
}

/// Format a date as the ledger's `Month` value.
pub fn month_of(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Lenient amount parsing for values that arrive as text.
///
/// Accepts thousands separators, surrounding whitespace and a leading
/// currency symbol (`"₹5,000"`, `" 12.50 "`). Returns `None` for anything
/// that is not a finite number afterwards.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let chars: Vec<(usize, char)> = raw.char_indices().collect();
    let start = chars
        .iter()
        .enumerate()
        .find(|(i, (_, c))| {
            c.is_ascii_digit()
                || ((*c == '-' || *c == '.')
                    && chars.get(i + 1).is_some_and(|(_, n)| n.is_ascii_digit()))
        })
        .map(|(_, (pos, _))| *pos)?;
    let cleaned: String = raw[start..]
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamp_derives_month() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let time = NaiveTime::from_hms_opt(9, 15, 0).unwrap();
        let stamp = Stamp::new(date, time);
        assert_eq!(stamp.month, "2024-05");

        let rec = ExtractedItem::new("Tea", "Food", 50.0).stamp(&stamp);
        assert_eq!(rec.date, date);
        assert_eq!(rec.month, "2024-05");
        assert_eq!(rec.log_time, time);
    }

    #[test]
    fn test_match_key_lowercases_item() {
        let stamp = Stamp::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        );
        let a = ExtractedItem::new("Ravi", "Labour", 1.0).stamp(&stamp);
        let b = ExtractedItem::new("ravi", "Labour", 2.0).stamp(&stamp);
        assert_eq!(a.match_key(), b.match_key());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("5000"), Some(5000.0));
        assert_eq!(parse_amount(" 12.50 "), Some(12.5));
        assert_eq!(parse_amount("5,000"), Some(5000.0));
        assert_eq!(parse_amount("₹250"), Some(250.0));
        assert_eq!(parse_amount("Rs. 40"), Some(40.0));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("lots"), None);
        assert_eq!(parse_amount("NaN"), None);
    }

    #[test]
    fn test_record_json_uses_column_names() {
        let stamp = Stamp::new(
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            NaiveTime::from_hms_opt(8, 0, 5).unwrap(),
        );
        let rec = ExtractedItem::new("Tea", "Food", 50.0).stamp(&stamp);
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["Item"], "Tea");
        assert_eq!(v["Date"], "2024-05-01");
        assert_eq!(v["Month"], "2024-05");
        assert_eq!(v["Log_Time"], "08:00:05");
    }
}
