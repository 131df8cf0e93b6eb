//! Interaction handler: extraction, review and confirmation of one batch.

use anyhow::Result;
use daybook_core::{
    merge, DaybookError, ExpenseRecord, ExtractedItem, LedgerStore, MemoryStore, PendingBatch, Stamp,
};
use daybook_ingest::{build_prompt, parse_response};
use daybook_store::{CsvStore, SheetsStore};
use tracing::{info, warn};

use crate::auth::{AuthState, Credential};
use crate::config::{Backend, Config};
use crate::llm::{self, LlmConfig};

/// Something that answers an extraction prompt with raw text.
pub trait Extractor {
    fn complete(&self, prompt: &str) -> Result<String>;
}

/// Extractor backed by the configured LLM provider.
pub struct LlmExtractor {
    config: LlmConfig,
    auth: AuthState,
}

impl LlmExtractor {
    pub fn new(config: LlmConfig, auth: AuthState) -> Self {
        Self { config, auth }
    }
}

impl Extractor for LlmExtractor {
    fn complete(&self, prompt: &str) -> Result<String> {
        llm::complete(&self.config, &self.auth, prompt)
    }
}

/// Open the configured ledger backend.
pub fn open_store(cfg: &Config, auth: &AuthState) -> Result<Box<dyn LedgerStore>> {
    Ok(match cfg.backend()? {
        Backend::Csv(path) => Box::new(CsvStore::new(path)),
        Backend::Sheets {
            spreadsheet_id,
            worksheet,
        } => {
            let token = auth.resolve(Credential::Sheets)?;
            Box::new(SheetsStore::new(spreadsheet_id, worksheet, token))
        }
    })
}

/// Store used when `--dry-run` is given: reads come from the real ledger,
/// writes stay in memory.
pub fn dry_run_store(real: &dyn LedgerStore) -> daybook_core::Result<MemoryStore> {
    Ok(MemoryStore::new(real.read_all()?))
}

/// One user's interaction state: the extractor, the ledger and the batch
/// waiting for confirmation.
pub struct Daybook<E, S> {
    extractor: E,
    store: S,
    pending: PendingBatch,
}

impl<E: Extractor, S: LedgerStore> Daybook<E, S> {
    pub fn new(extractor: E, store: S) -> Self {
        Self {
            extractor,
            store,
            pending: PendingBatch::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn pending(&self) -> Option<&[ExtractedItem]> {
        self.pending.items()
    }

    /// Extract line items from `text` and hold them for confirmation.
    pub fn submit(&mut self, text: &str) -> daybook_core::Result<&[ExtractedItem]> {
        if text.trim().is_empty() {
            return Err(DaybookError::Validation("nothing to extract; describe your expenses".into()));
        }
        self.pending.begin();

        let raw = self
            .extractor
            .complete(&build_prompt(text))
            .map_err(|e| DaybookError::Extraction(format!("{e:#}")))?;
        let items = parse_response(&raw)?;
        info!(count = items.len(), "expenses extracted");

        self.pending.stage(items);
        Ok(self.pending.items().unwrap_or_default())
    }

    /// Merge the pending batch into the ledger and persist it.
    ///
    /// If the write fails the batch stays pending so saving can be retried.
    pub fn confirm(&mut self, stamp: &Stamp) -> daybook_core::Result<Vec<ExpenseRecord>> {
        let Some(batch) = self.pending.take() else {
            return Err(DaybookError::Validation("no extracted expenses to save".into()));
        };

        let saved = self
            .store
            .read_all()
            .map(|existing| merge(existing, &batch, stamp))
            .and_then(|updated| self.store.write_all(&updated).map(|()| updated));

        match saved {
            Ok(updated) => {
                info!(added = batch.len(), rows = updated.len(), store = %self.store.describe(), "batch saved");
                Ok(updated)
            }
            Err(e) => {
                warn!(error = %e, "save failed, keeping batch pending");
                self.pending.stage(batch);
                Err(e)
            }
        }
    }

    pub fn discard(&mut self) {
        self.pending.begin();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use daybook_core::Step;
    use std::cell::RefCell;

    struct Canned {
        reply: std::result::Result<String, String>,
        prompts: RefCell<Vec<String>>,
    }

    impl Canned {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                prompts: RefCell::new(Vec::new()),
            }
        }

        fn failing(msg: &str) -> Self {
            Self {
                reply: Err(msg.to_string()),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl Extractor for Canned {
        fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.borrow_mut().push(prompt.to_string());
            self.reply.clone().map_err(|e| anyhow::anyhow!(e))
        }
    }

    fn stamp() -> Stamp {
        Stamp::new(
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
        )
    }

    const TEA: &str = "```json\n[{\"Item\": \"tea\", \"Category\": \"Food\", \"Amount\": 30}]\n```";

    fn ledger_with_tea() -> Vec<ExpenseRecord> {
        vec![ExtractedItem::new("Tea", "Food", 50.0).stamp(&stamp())]
    }

    #[test]
    fn test_submit_then_confirm_accumulates() {
        let mut book = Daybook::new(Canned::ok(TEA), MemoryStore::new(ledger_with_tea()));

        let items = book.submit("30 for tea").unwrap();
        assert_eq!(items, [ExtractedItem::new("tea", "Food", 30.0)]);
        assert!(book.extractor.prompts.borrow()[0].contains("30 for tea"));

        let saved = book.confirm(&stamp()).unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].item, "Tea");
        assert_eq!(saved[0].amount, 80.0);
        assert_eq!(book.store().snapshot(), saved);
        assert!(book.pending().is_none());
    }

    #[test]
    fn test_blank_text_is_rejected_without_calling_service() {
        let mut book = Daybook::new(Canned::ok(TEA), MemoryStore::default());
        let err = book.submit("   ").unwrap_err();
        assert_eq!(err.step(), Step::Review);
        assert!(book.extractor.prompts.borrow().is_empty());
    }

    #[test]
    fn test_service_failure_is_extraction_failure_and_clears_slot() {
        let mut book = Daybook::new(Canned::ok(TEA), MemoryStore::default());
        book.submit("tea 30").unwrap();

        book.extractor = Canned::failing("connection reset");
        let err = book.submit("tea 40").unwrap_err();
        assert!(matches!(err, DaybookError::Extraction(ref m) if m.contains("connection reset")));
        assert!(book.pending().is_none());
    }

    #[test]
    fn test_unparseable_reply_is_extraction_failure() {
        let mut book = Daybook::new(Canned::ok("Sorry, I can't help."), MemoryStore::default());
        let err = book.submit("tea 30").unwrap_err();
        assert_eq!(err.step(), Step::Extract);
    }

    #[test]
    fn test_confirm_without_batch() {
        let mut book = Daybook::new(Canned::ok(TEA), MemoryStore::default());
        let err = book.confirm(&stamp()).unwrap_err();
        assert!(matches!(err, DaybookError::Validation(_)));
    }

    #[test]
    fn test_failed_save_keeps_batch_for_retry() {
        let mut book = Daybook::new(Canned::ok(TEA), MemoryStore::read_only(ledger_with_tea()));
        book.submit("tea 30").unwrap();

        let err = book.confirm(&stamp()).unwrap_err();
        assert_eq!(err.step(), Step::Save);
        assert_eq!(book.pending().unwrap().len(), 1);
        assert_eq!(book.store().snapshot(), ledger_with_tea());
    }

    #[test]
    fn test_discard_drops_batch() {
        let mut book = Daybook::new(Canned::ok(TEA), MemoryStore::default());
        book.submit("tea 30").unwrap();
        book.discard();
        assert!(book.pending().is_none());
        assert!(book.confirm(&stamp()).is_err());
    }

    #[test]
    fn test_dry_run_store_leaves_real_ledger_alone() {
        let real = MemoryStore::new(ledger_with_tea());
        let mut book = Daybook::new(Canned::ok(TEA), dry_run_store(&real).unwrap());
        book.submit("tea 30").unwrap();
        book.confirm(&stamp()).unwrap();

        assert_eq!(book.store().snapshot()[0].amount, 80.0);
        assert_eq!(real.snapshot()[0].amount, 50.0);
    }
}
