//! Receipt store seam with an in-memory implementation.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::models::receipt::{Receipt, ReceiptUpdate};

/// Persistence collaborator contract consumed by this core.
///
/// The core never issues schema-level operations; it reads receipts,
/// applies field updates, and claims the `invoice_received` flag through
/// an atomic compare-and-set so that at most one match wins per receipt.
pub trait ReceiptStore: Send + Sync {
    /// Fetch one receipt by id.
    fn get_receipt(&self, id: i64) -> Result<Option<Receipt>, StoreError>;

    /// Receipts still awaiting an invoice (`invoice_received = false`).
    fn get_pending_receipts(&self) -> Result<Vec<Receipt>, StoreError>;

    /// Persist field changes onto a receipt.
    fn update_receipt(&self, id: i64, update: &ReceiptUpdate) -> Result<(), StoreError>;

    /// Atomically flip `invoice_received` false to true.
    ///
    /// Returns true if this caller won the claim, false if the flag was
    /// already set. The check and the write happen under one lock (or
    /// one transaction in a database-backed implementation).
    fn claim_invoice_received(&self, id: i64) -> Result<bool, StoreError>;
}

impl<T: ReceiptStore + ?Sized> ReceiptStore for std::sync::Arc<T> {
    fn get_receipt(&self, id: i64) -> Result<Option<Receipt>, StoreError> {
        (**self).get_receipt(id)
    }

    fn get_pending_receipts(&self) -> Result<Vec<Receipt>, StoreError> {
        (**self).get_pending_receipts()
    }

    fn update_receipt(&self, id: i64, update: &ReceiptUpdate) -> Result<(), StoreError> {
        (**self).update_receipt(id, update)
    }

    fn claim_invoice_received(&self, id: i64) -> Result<bool, StoreError> {
        (**self).claim_invoice_received(id)
    }
}

/// In-memory [`ReceiptStore`], used by the worker binary and tests.
#[derive(Default)]
pub struct InMemoryStore {
    receipts: Mutex<HashMap<i64, Receipt>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a receipt.
    pub fn insert(&self, receipt: Receipt) -> Result<(), StoreError> {
        self.lock()?.insert(receipt.id, receipt);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<i64, Receipt>>, StoreError> {
        self.receipts
            .lock()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }
}

impl ReceiptStore for InMemoryStore {
    fn get_receipt(&self, id: i64) -> Result<Option<Receipt>, StoreError> {
        Ok(self.lock()?.get(&id).cloned())
    }

    fn get_pending_receipts(&self) -> Result<Vec<Receipt>, StoreError> {
        let mut pending: Vec<Receipt> = self
            .lock()?
            .values()
            .filter(|r| !r.invoice_received)
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.id);
        Ok(pending)
    }

    fn update_receipt(&self, id: i64, update: &ReceiptUpdate) -> Result<(), StoreError> {
        let mut receipts = self.lock()?;
        let receipt = receipts.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        receipt.apply(update);
        debug!(receipt_id = id, "receipt updated");
        Ok(())
    }

    fn claim_invoice_received(&self, id: i64) -> Result<bool, StoreError> {
        let mut receipts = self.lock()?;
        let receipt = receipts.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if receipt.invoice_received {
            return Ok(false);
        }
        receipt.invoice_received = true;
        receipt.updated_at = Utc::now();
        info!(receipt_id = id, "invoice_received claimed");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_excludes_claimed_receipts() {
        let store = InMemoryStore::new();
        store.insert(Receipt::new(1, "acme", 1)).unwrap();
        store.insert(Receipt::new(2, "acme", 1)).unwrap();

        assert!(store.claim_invoice_received(1).unwrap());

        let pending = store.get_pending_receipts().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, 2);
    }

    #[test]
    fn claim_wins_exactly_once() {
        let store = InMemoryStore::new();
        store.insert(Receipt::new(1, "acme", 1)).unwrap();

        assert!(store.claim_invoice_received(1).unwrap());
        assert!(!store.claim_invoice_received(1).unwrap());

        // the flag never reverts
        let receipt = store.get_receipt(1).unwrap().unwrap();
        assert!(receipt.invoice_received);
    }

    #[test]
    fn update_unknown_receipt_is_an_error() {
        let store = InMemoryStore::new();
        let err = store.update_receipt(42, &ReceiptUpdate::default()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(42)));
    }
}
