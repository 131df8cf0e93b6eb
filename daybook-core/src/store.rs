//! Storage seam for the ledger.

use std::cell::RefCell;

use crate::error::{DaybookError, Result};
use crate::record::ExpenseRecord;

/// A backend holding the whole ledger as one table.
///
/// Reads and writes are whole-table; concurrent writers clobber each other.
pub trait LedgerStore {
    fn read_all(&self) -> Result<Vec<ExpenseRecord>>;
    fn write_all(&self, records: &[ExpenseRecord]) -> Result<()>;
    /// Human-readable location, for messages.
    fn describe(&self) -> String;
}

/// In-memory ledger, used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RefCell<Vec<ExpenseRecord>>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new(rows: Vec<ExpenseRecord>) -> Self {
        Self {
            rows: RefCell::new(rows),
            read_only: false,
        }
    }

    /// A store whose writes always fail.
    pub fn read_only(rows: Vec<ExpenseRecord>) -> Self {
        Self {
            rows: RefCell::new(rows),
            read_only: true,
        }
    }

    pub fn snapshot(&self) -> Vec<ExpenseRecord> {
        self.rows.borrow().clone()
    }
}

impl LedgerStore for MemoryStore {
    fn read_all(&self) -> Result<Vec<ExpenseRecord>> {
        Ok(self.rows.borrow().clone())
    }

    fn write_all(&self, records: &[ExpenseRecord]) -> Result<()> {
        if self.read_only {
            return Err(DaybookError::Persistence("memory store is read-only".into()));
        }
        *self.rows.borrow_mut() = records.to_vec();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

impl<S: LedgerStore + ?Sized> LedgerStore for Box<S> {
    fn read_all(&self) -> Result<Vec<ExpenseRecord>> {
        (**self).read_all()
    }

    fn write_all(&self, records: &[ExpenseRecord]) -> Result<()> {
        (**self).write_all(records)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
