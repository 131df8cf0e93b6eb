//! Ledger kept in a local CSV file.

use std::fs;
use std::path::{Path, PathBuf};

use daybook_core::{DaybookError, ExpenseRecord, LedgerStore, Result, LEDGER_COLUMNS};
use tracing::{debug, info};

use crate::columns::{decode_row, encode_row, ColumnMap};

/// File name used by `daybook export` when no path is given.
pub const DEFAULT_EXPORT_NAME: &str = "finance_history.csv";

/// CSV-backed ledger. A missing file is an empty ledger.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerStore for CsvStore {
    fn read_all(&self) -> Result<Vec<ExpenseRecord>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "ledger file absent, starting empty");
            return Ok(Vec::new());
        }
        read_csv(&self.path)
    }

    fn write_all(&self, records: &[ExpenseRecord]) -> Result<()> {
        write_csv(&self.path, records)?;
        info!(path = %self.path.display(), rows = records.len(), "ledger written");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Write the full history to `path` with the ledger's column names.
pub fn export_csv(records: &[ExpenseRecord], path: impl AsRef<Path>) -> Result<()> {
    write_csv(path.as_ref(), records)
}

fn persistence(path: &Path, e: impl std::fmt::Display) -> DaybookError {
    DaybookError::Persistence(format!("{}: {e}", path.display()))
}

fn read_csv(path: &Path) -> Result<Vec<ExpenseRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| persistence(path, e))?;

    let header = rdr.headers().map_err(|e| persistence(path, e))?.clone();
    if header.is_empty() {
        return Ok(Vec::new());
    }
    let map = ColumnMap::from_header(&header.iter().collect::<Vec<_>>())?;

    let mut out = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| persistence(path, e))?;
        // Skip blank trailing lines
        if record.iter().all(|c| c.is_empty()) {
            continue;
        }
        let cells: Vec<&str> = record.iter().collect();
        // Header is row 1
        out.push(decode_row(&map, &cells, i + 2)?);
    }

    debug!(path = %path.display(), rows = out.len(), "ledger read");
    Ok(out)
}

fn write_csv(path: &Path, records: &[ExpenseRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| persistence(parent, e))?;
    }

    let tmp = path.with_extension("csv.tmp");
    {
        let mut wtr = csv::Writer::from_path(&tmp).map_err(|e| persistence(&tmp, e))?;
        wtr.write_record(LEDGER_COLUMNS).map_err(|e| persistence(&tmp, e))?;
        for r in records {
            wtr.write_record(encode_row(r)).map_err(|e| persistence(&tmp, e))?;
        }
        wtr.flush().map_err(|e| persistence(&tmp, e))?;
    }
    fs::rename(&tmp, path).map_err(|e| persistence(path, e))?;
    Ok(())
}
