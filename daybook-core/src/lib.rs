//! daybook-core: expense records, the same-day upsert, reports and the
//! storage seam shared by every daybook frontend.

pub mod error;
pub mod merge;
pub mod record;
pub mod report;
pub mod session;
pub mod store;
pub mod time;

pub use error::{DaybookError, Result, Step};
pub use merge::merge;
pub use record::{
    month_of, parse_amount, ExpenseRecord, ExtractedItem, Stamp, DEFAULT_CATEGORY, LEDGER_COLUMNS,
};
pub use report::{entries_on, monthly_report, MonthlyReport};
pub use session::PendingBatch;
pub use store::{LedgerStore, MemoryStore};
pub use time::{parse_timezone, stamp_at, stamp_now};
