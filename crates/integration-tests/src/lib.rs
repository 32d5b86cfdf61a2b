//! Integration tests for Greengrocer.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p greengrocer-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `reconciliation` - sign-in merge scenarios and failure ordering
//! - `cart_operations` - mutation semantics through a full session

use std::sync::Arc;

use greengrocer_cart::{CartSession, MemoryDocumentStore, MemoryLocalStore};
use greengrocer_core::{CurrencyCode, Price, ProductId, ProductSnapshot};

/// Shared test fixture: a cart session over in-memory stores.
pub struct TestContext {
    pub documents: Arc<MemoryDocumentStore>,
    pub local: Arc<MemoryLocalStore>,
    pub session: CartSession,
}

impl TestContext {
    /// Create a fresh session with empty stores.
    ///
    /// # Panics
    ///
    /// Panics if session construction fails (empty stores cannot be corrupt).
    #[must_use]
    pub fn new() -> Self {
        let documents = Arc::new(MemoryDocumentStore::new());
        let local = Arc::new(MemoryLocalStore::new());
        #[allow(clippy::unwrap_used)]
        let session = CartSession::new(documents.clone(), local.clone()).unwrap();
        Self {
            documents,
            local,
            session,
        }
    }

    /// A fresh session over this context's stores ("page reload").
    ///
    /// # Panics
    ///
    /// Panics if the stored local cart is corrupt.
    #[must_use]
    pub fn reload(&self) -> CartSession {
        #[allow(clippy::unwrap_used)]
        CartSession::new(self.documents.clone(), self.local.clone()).unwrap()
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Product snapshot fixture.
///
/// # Panics
///
/// Panics if `price` is not a valid decimal.
#[must_use]
pub fn snapshot(id: &str, price: &str) -> ProductSnapshot {
    #[allow(clippy::unwrap_used)]
    ProductSnapshot {
        product_id: ProductId::new(id),
        name: format!("Product {id}"),
        unit_price: Price::new(price.parse().unwrap(), CurrencyCode::USD),
        image_url: Some(format!("https://img.example.com/{id}.jpg")),
    }
}
