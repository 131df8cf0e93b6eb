//! Plain-text tables and bar charts for the terminal.

use daybook_core::{ExpenseRecord, ExtractedItem, MonthlyReport};
use daybook_store::format_amount;

const BAR_WIDTH: usize = 30;

/// Confirmation table for a freshly extracted batch.
pub fn items_table(items: &[ExtractedItem], currency: &str) -> String {
    let rows: Vec<[String; 3]> = items
        .iter()
        .map(|i| [i.item.clone(), i.category.clone(), money(currency, i.amount)])
        .collect();
    table(["Item", "Category", "Amount"], &rows)
}

/// Ledger rows, e.g. today's entries.
pub fn records_table(records: &[&ExpenseRecord], currency: &str) -> String {
    let rows: Vec<[String; 5]> = records
        .iter()
        .map(|r| {
            [
                r.item.clone(),
                r.category.clone(),
                money(currency, r.amount),
                r.date.format("%Y-%m-%d").to_string(),
                r.log_time.format("%H:%M:%S").to_string(),
            ]
        })
        .collect();
    table(["Item", "Category", "Amount", "Date", "Log_Time"], &rows)
}

/// Monthly total, spending by category and the daily trend.
pub fn monthly(report: &MonthlyReport, currency: &str) -> String {
    let mut s = String::new();
    s.push_str(&format!(
        "Total spent in {}: {} ({} entries)\n",
        report.month,
        money(currency, report.total),
        report.entry_count
    ));

    s.push_str("\nSpending by category\n");
    s.push_str(&bars(&report.by_category, currency));

    s.push_str("\nDaily trend\n");
    let days: Vec<(String, f64)> = report
        .daily
        .iter()
        .map(|(d, v)| (d.format("%Y-%m-%d").to_string(), *v))
        .collect();
    s.push_str(&bars(&days, currency));
    s
}

fn money(currency: &str, amount: f64) -> String {
    format!("{currency}{}", format_amount((amount * 100.0).round() / 100.0))
}

fn bars(series: &[(String, f64)], currency: &str) -> String {
    let max = series.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
    let label_w = series.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let bar_w = BAR_WIDTH;

    let mut s = String::new();
    for (label, value) in series {
        let len = if max > 0.0 {
            ((value / max) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        s.push_str(&format!(
            "  {label:<label_w$}  {:<bar_w$}  {}\n",
            "#".repeat(len.max(usize::from(*value > 0.0))),
            money(currency, *value)
        ));
    }
    s
}

fn table<const N: usize>(header: [&str; N], rows: &[[String; N]]) -> String {
    let mut widths: [usize; N] = header.map(|h| h.chars().count());
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths.iter())
            .map(|(c, w)| format!("{c:<w$}"))
            .collect();
        format!("  {}\n", padded.join("  ").trim_end())
    };

    let mut s = line(header.to_vec());
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    s.push_str(&line(rule.iter().map(String::as_str).collect()));
    for row in rows {
        s.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_items_table_aligns_columns() {
        let out = items_table(
            &[
                ExtractedItem::new("Ravi Plumbing", "Others", 5000.0),
                ExtractedItem::new("Tea", "Food", 12.5),
            ],
            "₹",
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "  Item           Category  Amount");
        assert_eq!(lines[1], "  -------------  --------  ------");
        assert_eq!(lines[2], "  Ravi Plumbing  Others    ₹5000");
        assert_eq!(lines[3], "  Tea            Food      ₹12.5");
    }

    #[test]
    fn test_monthly_bars_scale_to_largest() {
        let report = MonthlyReport {
            month: "2024-05".to_string(),
            total: 150.0,
            entry_count: 3,
            by_category: vec![("Food".to_string(), 100.0), ("Travel".to_string(), 50.0)],
            daily: vec![(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), 150.0)],
        };
        let out = monthly(&report, "$");
        assert!(out.starts_with("Total spent in 2024-05: $150 (3 entries)"));
        let food = out.lines().find(|l| l.trim_start().starts_with("Food")).unwrap();
        let travel = out.lines().find(|l| l.trim_start().starts_with("Travel")).unwrap();
        assert_eq!(food.matches('#').count(), BAR_WIDTH);
        assert_eq!(travel.matches('#').count(), BAR_WIDTH / 2);
    }
}
