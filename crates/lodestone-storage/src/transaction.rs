//! Transaction token threaded through index operations.

use lodestone_common::page::PageId;
use parking_lot::Mutex;

/// Opaque per-operation token.
///
/// The storage core treats it as transparent; the page set exists so a
/// latch-crabbing index can record which pages it holds without changing
/// callers.
pub struct Transaction {
    id: u64,
    page_set: Mutex<Vec<PageId>>,
}

impl Transaction {
    /// Creates a transaction with the given id.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            page_set: Mutex::new(Vec::new()),
        }
    }

    /// Returns the transaction id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Records a page held by this transaction.
    pub fn add_to_page_set(&self, page_id: PageId) {
        self.page_set.lock().push(page_id);
    }

    /// Returns the recorded pages.
    pub fn page_set(&self) -> Vec<PageId> {
        self.page_set.lock().clone()
    }

    /// Clears the recorded pages.
    pub fn clear_page_set(&self) {
        self.page_set.lock().clear();
    }
}
