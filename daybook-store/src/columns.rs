//! Mapping between ledger rows and the persisted `Item, Category, Amount,
//! Date, Month, Log_Time` columns.
//!
//! Both backends read cells as text and locate columns by header name, so
//! hand-edited tables with reordered or extra columns still load.

use chrono::{NaiveDate, NaiveTime};
use daybook_core::{month_of, parse_amount, DaybookError, ExpenseRecord, Result, DEFAULT_CATEGORY};

/// Positions of the ledger columns within a header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    item: usize,
    category: Option<usize>,
    amount: usize,
    date: usize,
    month: Option<usize>,
    log_time: Option<usize>,
}

impl ColumnMap {
    /// Locate columns in `header`. Item, Amount and Date are required.
    pub fn from_header<S: AsRef<str>>(header: &[S]) -> Result<Self> {
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h.as_ref().trim().eq_ignore_ascii_case(name))
        };
        let required = |name: &str| {
            find(name).ok_or_else(|| {
                DaybookError::Persistence(format!("ledger header has no {name} column"))
            })
        };

        Ok(Self {
            item: required("Item")?,
            category: find("Category"),
            amount: required("Amount")?,
            date: required("Date")?,
            month: find("Month"),
            log_time: find("Log_Time"),
        })
    }
}

/// Decode one data row. `row_no` is 1-based and only used in messages.
pub fn decode_row<S: AsRef<str>>(map: &ColumnMap, cells: &[S], row_no: usize) -> Result<ExpenseRecord> {
    let cell = |i: usize| cells.get(i).map(|c| c.as_ref().trim()).unwrap_or("");
    let bad = |what: String| DaybookError::Persistence(format!("row {row_no}: {what}"));

    let raw_amount = cell(map.amount);
    let amount = parse_amount(raw_amount)
        .ok_or_else(|| bad(format!("amount {raw_amount:?} is not a number")))?;
    if amount < 0.0 {
        return Err(bad(format!("amount {raw_amount:?} is negative")));
    }

    let raw_date = cell(map.date);
    let date = parse_date(raw_date).ok_or_else(|| bad(format!("date {raw_date:?} is not YYYY-MM-DD")))?;

    let category = match map.category.map(cell) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => DEFAULT_CATEGORY.to_string(),
    };

    let month = match map.month.map(cell) {
        Some(m) if !m.is_empty() => m.to_string(),
        _ => month_of(date),
    };

    let log_time = match map.log_time.map(cell) {
        Some(t) if !t.is_empty() => {
            parse_time(t).ok_or_else(|| bad(format!("log time {t:?} is not HH:MM:SS")))?
        }
        _ => NaiveTime::MIN,
    };

    Ok(ExpenseRecord {
        item: cell(map.item).to_string(),
        category,
        amount,
        date,
        month,
        log_time,
    })
}

/// Encode a record in persisted column order.
pub fn encode_row(record: &ExpenseRecord) -> [String; 6] {
    [
        record.item.clone(),
        record.category.clone(),
        format_amount(record.amount),
        record.date.format("%Y-%m-%d").to_string(),
        record.month.clone(),
        record.log_time.format("%H:%M:%S").to_string(),
    ]
}

/// Whole amounts are written without a fractional part.
pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 && amount.abs() < 1e15 {
        format!("{amount:.0}")
    } else {
        amount.to_string()
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        // "2024-05-01 00:00:00" from spreadsheet tools that widened the cell
        .or_else(|| s.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use daybook_core::LEDGER_COLUMNS;

    fn header() -> Vec<&'static str> {
        LEDGER_COLUMNS.to_vec()
    }

    #[test]
    fn test_decode_standard_row() {
        let map = ColumnMap::from_header(&header()).unwrap();
        let rec = decode_row(&map, &["Tea", "Food", "50", "2024-05-01", "2024-05", "08:15:00"], 1).unwrap();
        assert_eq!(rec.item, "Tea");
        assert_eq!(rec.amount, 50.0);
        assert_eq!(rec.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(rec.log_time, NaiveTime::from_hms_opt(8, 15, 0).unwrap());
    }

    #[test]
    fn test_decode_reordered_and_sparse_columns() {
        let map = ColumnMap::from_header(&["date", "Amount", "Notes", "item"]).unwrap();
        let rec = decode_row(&map, &["2024-05-01 00:00:00", "1,200.50", "paid cash", "Cement"], 4).unwrap();
        assert_eq!(rec.item, "Cement");
        assert_eq!(rec.amount, 1200.5);
        assert_eq!(rec.category, DEFAULT_CATEGORY);
        assert_eq!(rec.month, "2024-05");
        assert_eq!(rec.log_time, NaiveTime::MIN);
    }

    #[test]
    fn test_missing_required_column() {
        let err = ColumnMap::from_header(&["Item", "Category", "Date"]).unwrap_err();
        assert!(err.to_string().contains("Amount"));
    }

    #[test]
    fn test_bad_cells_name_the_row() {
        let map = ColumnMap::from_header(&header()).unwrap();
        let err = decode_row(&map, &["Tea", "Food", "fifty", "2024-05-01", "", ""], 7).unwrap_err();
        assert!(matches!(err, DaybookError::Persistence(_)));
        assert!(err.to_string().contains("row 7"));

        let err = decode_row(&map, &["Tea", "Food", "50", "01/05/2024", "", ""], 2).unwrap_err();
        assert!(err.to_string().contains("row 2"));

        let err = decode_row(&map, &["Refund", "Others", "-5", "2024-05-01", "", ""], 3).unwrap_err();
        assert!(matches!(err, DaybookError::Persistence(_)));
        assert!(err.to_string().contains("row 3"));
        assert!(err.to_string().contains("negative"));
    }

    #[test]
    fn test_encode_row() {
        let map = ColumnMap::from_header(&header()).unwrap();
        let rec = decode_row(&map, &["Tea", "Food", "80", "2024-05-01", "2024-05", "08:15:00"], 1).unwrap();
        assert_eq!(encode_row(&rec), ["Tea", "Food", "80", "2024-05-01", "2024-05", "08:15:00"]);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(80.0), "80");
        assert_eq!(format_amount(12.5), "12.5");
        assert_eq!(format_amount(0.0), "0");
    }
}
