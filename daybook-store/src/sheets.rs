//! Ledger kept in a Google Sheets worksheet (Sheets API v4, REST).
//!
//! The worksheet is treated as one table: first row is the header, the
//! rest are ledger rows. Writes upload the full table over the old one and
//! only then clear whatever is left below it, so a failed upload leaves the
//! stored ledger intact. Concurrent writers still clobber each other.

use daybook_core::{DaybookError, ExpenseRecord, LedgerStore, Result, LEDGER_COLUMNS};
use reqwest::{RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use tracing::{debug, info, warn};

use crate::columns::{decode_row, encode_row, ColumnMap};

pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";
pub const DEFAULT_WORKSHEET: &str = "Sheet1";

const AMOUNT_CELL: usize = 2;

#[derive(Debug, Clone)]
pub struct SheetsStore {
    spreadsheet_id: String,
    worksheet: String,
    token: String,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBody<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: Vec<Vec<Value>>,
}

impl SheetsStore {
    /// `token` is an OAuth access token with the spreadsheets scope.
    pub fn new(
        spreadsheet_id: impl Into<String>,
        worksheet: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            worksheet: worksheet.into(),
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// A1 range for the worksheet rows from `first_row` down.
    fn rows_from(&self, first_row: usize) -> String {
        format!("'{}'!A{first_row}:ZZ", self.worksheet.replace('\'', "''"))
    }

    /// URL of the values in `range`, with an optional `:verb` suffix.
    fn values_url(&self, range: &str, verb: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| DaybookError::Persistence(format!("bad sheets url {}: {e}", self.base_url)))?;
        let range = match verb {
            Some(v) => format!("{range}:{v}"),
            None => range.to_string(),
        };
        url.path_segments_mut()
            .map_err(|_| DaybookError::Persistence(format!("bad sheets url {}", self.base_url)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", range.as_str()]);
        Ok(url)
    }

    async fn send(&self, req: RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let resp = req
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| DaybookError::Persistence(format!("sheets {what}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            return Err(DaybookError::Persistence(format!("sheets {what}: {status} {txt}")));
        }
        Ok(resp)
    }

    async fn read_async(&self) -> Result<Vec<ExpenseRecord>> {
        let url = self.values_url(&self.worksheet, None)?;
        let query = [
            ("majorDimension", "ROWS"),
            // Amounts come back as numbers whatever the cell's display format
            ("valueRenderOption", "UNFORMATTED_VALUE"),
            ("dateTimeRenderOption", "FORMATTED_STRING"),
        ];
        let resp = self.send(self.client.get(url).query(&query), "read").await?;
        let range: ValueRange = resp
            .json()
            .await
            .map_err(|e| DaybookError::Persistence(format!("sheets read: {e}")))?;
        rows_to_records(&range.values)
    }

    async fn write_async(&self, records: &[ExpenseRecord]) -> Result<()> {
        let rows = records_to_rows(records);
        let written = rows.len();

        let url = self.values_url(&self.worksheet, None)?;
        let body = UpdateBody {
            range: &self.worksheet,
            major_dimension: "ROWS",
            values: rows,
        };
        self.send(
            self.client
                .put(url)
                .query(&[("valueInputOption", "RAW")])
                .json(&body),
            "update",
        )
        .await?;

        // The table is in place; leftovers below it are stale rows
        let tail = self.values_url(&self.rows_from(written + 1), Some("clear"))?;
        if let Err(e) = self
            .send(self.client.post(tail).json(&serde_json::json!({})), "clear")
            .await
        {
            warn!(sheet = %self.describe(), error = %e, "ledger written but rows below it were not cleared");
        }
        Ok(())
    }
}

impl LedgerStore for SheetsStore {
    fn read_all(&self) -> Result<Vec<ExpenseRecord>> {
        let rows = block_on(self.read_async())?;
        debug!(sheet = %self.describe(), rows = rows.len(), "ledger read");
        Ok(rows)
    }

    fn write_all(&self, records: &[ExpenseRecord]) -> Result<()> {
        block_on(self.write_async(records))?;
        info!(sheet = %self.describe(), rows = records.len(), "ledger written");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("sheets:{}/{}", self.spreadsheet_id, self.worksheet)
    }
}

/// Run a future to completion from synchronous code, inside or outside a
/// tokio runtime.
fn block_on<F: Future<Output = Result<T>>, T>(fut: F) -> Result<T> {
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        tokio::task::block_in_place(|| handle.block_on(fut))
    } else {
        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| DaybookError::Persistence(format!("create tokio runtime: {e}")))?;
        rt.block_on(fut)
    }
}

fn cell_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Decode a worksheet (header row first). An empty sheet is an empty ledger.
fn rows_to_records(values: &[Vec<Value>]) -> Result<Vec<ExpenseRecord>> {
    let Some((header, rows)) = values.split_first() else {
        return Ok(Vec::new());
    };
    let header: Vec<String> = header.iter().map(cell_text).collect();
    let map = ColumnMap::from_header(&header)?;

    rows.iter()
        .enumerate()
        .filter(|(_, row)| row.iter().any(|c| !cell_text(c).trim().is_empty()))
        .map(|(i, row)| {
            let cells: Vec<String> = row.iter().map(cell_text).collect();
            decode_row(&map, &cells, i + 2)
        })
        .collect()
}

/// Header plus one row per record. Amount goes out as a number so sheet
/// formulas and charts can use it.
fn records_to_rows(records: &[ExpenseRecord]) -> Vec<Vec<Value>> {
    let header: Vec<Value> = LEDGER_COLUMNS.iter().map(|c| Value::from(*c)).collect();
    std::iter::once(header)
        .chain(records.iter().map(|r| {
            let mut row: Vec<Value> = encode_row(r).into_iter().map(Value::String).collect();
            row[AMOUNT_CELL] = Value::from(r.amount);
            row
        }))
        .collect()
}
