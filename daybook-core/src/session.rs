//! Pending batch held between extraction and confirmation.

use crate::record::ExtractedItem;

/// Extracted items awaiting confirmation for a single interaction.
///
/// Owned by whoever drives the interaction; cleared when a new extraction
/// starts and emptied when the batch is confirmed or discarded.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PendingBatch {
    items: Option<Vec<ExtractedItem>>,
}

impl PendingBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new extraction, dropping anything still pending.
    pub fn begin(&mut self) {
        self.items = None;
    }

    pub fn stage(&mut self, items: Vec<ExtractedItem>) {
        self.items = Some(items);
    }

    pub fn items(&self) -> Option<&[ExtractedItem]> {
        self.items.as_deref()
    }

    pub fn take(&mut self) -> Option<Vec<ExtractedItem>> {
        self.items.take()
    }

    pub fn is_empty(&self) -> bool {
        self.items.as_ref().is_none_or(|v| v.is_empty())
    }
}
