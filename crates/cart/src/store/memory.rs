//! In-memory store implementations.
//!
//! Used by tests and standalone runs. Both stores support one-shot failure
//! injection so the reconciliation abort paths can be exercised without a
//! network.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use greengrocer_core::{CartLine, UserId};

use super::{CartDocument, DocumentStore, LocalStore, StoreError};

/// In-memory [`DocumentStore`] keyed by user.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<UserId, CartDocument>>,
    fail_next_get: AtomicBool,
    fail_next_put: AtomicBool,
    fail_next_update: AtomicBool,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `get_cart` fail with [`StoreError::Unavailable`].
    pub fn fail_next_get(&self) {
        self.fail_next_get.store(true, Ordering::SeqCst);
    }

    /// Make the next `put_cart` fail with [`StoreError::Unavailable`].
    pub fn fail_next_put(&self) {
        self.fail_next_put.store(true, Ordering::SeqCst);
    }

    /// Make the next `update_lines` fail with [`StoreError::Unavailable`].
    pub fn fail_next_update(&self) {
        self.fail_next_update.store(true, Ordering::SeqCst);
    }

    /// Direct read of a stored document, bypassing failure injection.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn document(&self, user: &UserId) -> Option<CartDocument> {
        #[allow(clippy::unwrap_used)]
        self.documents.read().unwrap().get(user).cloned()
    }

    /// Seed a document directly, bypassing failure injection.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn seed(&self, user: UserId, document: CartDocument) {
        #[allow(clippy::unwrap_used)]
        self.documents.write().unwrap().insert(user, document);
    }

    fn take(flag: &AtomicBool) -> bool {
        flag.swap(false, Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_cart(&self, user: &UserId) -> Result<Option<CartDocument>, StoreError> {
        if Self::take(&self.fail_next_get) {
            return Err(StoreError::Unavailable("injected read failure".to_owned()));
        }
        let documents = self
            .documents
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_owned()))?;
        Ok(documents.get(user).cloned())
    }

    async fn put_cart(&self, user: &UserId, document: &CartDocument) -> Result<(), StoreError> {
        if Self::take(&self.fail_next_put) {
            return Err(StoreError::Unavailable("injected write failure".to_owned()));
        }
        let mut documents = self
            .documents
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_owned()))?;
        documents.insert(user.clone(), document.clone());
        Ok(())
    }

    async fn update_lines(&self, user: &UserId, lines: &[CartLine]) -> Result<(), StoreError> {
        if Self::take(&self.fail_next_update) {
            return Err(StoreError::Unavailable("injected write failure".to_owned()));
        }
        let mut documents = self
            .documents
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_owned()))?;
        let document = documents.get_mut(user).ok_or(StoreError::NotFound)?;
        document.lines = lines.to_vec();
        document.updated_at = chrono::Utc::now();
        Ok(())
    }
}

/// In-memory [`LocalStore`].
#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryLocalStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a key currently holds a value.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        #[allow(clippy::unwrap_used)]
        self.values.read().unwrap().contains_key(key)
    }
}

impl LocalStore for MemoryLocalStore {
    fn read(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) {
        if let Ok(mut values) = self.values.write() {
            values.insert(key.to_owned(), value.to_owned());
        }
    }

    fn clear(&self, key: &str) {
        if let Ok(mut values) = self.values.write() {
            values.remove(key);
        }
    }
}
