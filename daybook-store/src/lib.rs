//! daybook-store: ledger backends (CSV file, Google Sheets worksheet) and
//! CSV export of the full history.

pub mod columns;
pub mod csv_store;
pub mod sheets;

pub use columns::{decode_row, encode_row, format_amount, ColumnMap};
pub use csv_store::{export_csv, CsvStore, DEFAULT_EXPORT_NAME};
pub use sheets::SheetsStore;
