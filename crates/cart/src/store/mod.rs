//! Persistence seams for the cart: the remote document store and the
//! device-local key-value store, plus the wire forms each one holds.
//!
//! The split mirrors the system's ownership rule: a cart is held by exactly
//! one of the two stores at a time. [`DocumentStore`] is the network seam
//! (per-user cart document, async, fallible); [`LocalStore`] is the
//! browser-storage seam (synchronous, device-scoped, shared across tabs
//! with last-write-wins - an accepted limitation, not one this crate works
//! around).

mod disk;
mod http;
mod memory;

pub use disk::FileLocalStore;
pub use http::HttpDocumentStore;
pub use memory::{MemoryDocumentStore, MemoryLocalStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use greengrocer_core::{CartLine, LocalCartRevision, UserId};

/// Local-store key under which the anonymous cart is persisted.
pub const CART_LINES_KEY: &str = "cart_lines";

/// How many absorbed local revisions a cart document remembers.
///
/// One is enough for the single-device retry case; a small ring covers a
/// user signing in from a couple of devices before any of them completes
/// its local clear.
const MERGED_REVISIONS_KEPT: usize = 8;

/// Errors from the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Unexpected response status.
    #[error("unexpected status {status} from document store")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The cart document does not exist.
    #[error("cart document not found")]
    NotFound,

    /// Response body could not be parsed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Store unreachable or refusing service.
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

/// Errors encoding or decoding the device-local cart.
#[derive(Debug, Error)]
pub enum LocalCartError {
    /// Stored local cart data is not valid JSON for [`LocalCart`].
    #[error("failed to decode local cart: {0}")]
    Decode(#[source] serde_json::Error),

    /// Local cart could not be serialized.
    #[error("failed to encode local cart: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Per-user remote cart document, addressable by [`UserId`].
///
/// Reconciliation replaces the whole document (full line-list replace, not
/// a per-line patch); ordinary authenticated mutations go through the
/// partial [`DocumentStore::update_lines`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartDocument {
    /// The cart lines, in display order.
    pub lines: Vec<CartLine>,
    /// Local-cart revisions already merged into this document. Lets a
    /// reconciliation retry detect that its write landed even though the
    /// local clear did not.
    #[serde(default)]
    pub merged_revisions: Vec<LocalCartRevision>,
    /// Last write time.
    pub updated_at: DateTime<Utc>,
}

impl CartDocument {
    /// Create a document from lines, stamped now.
    #[must_use]
    pub fn new(lines: Vec<CartLine>) -> Self {
        Self {
            lines,
            merged_revisions: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Whether a local revision has already been merged into this document.
    #[must_use]
    pub fn has_merged(&self, revision: LocalCartRevision) -> bool {
        self.merged_revisions.contains(&revision)
    }

    /// Record an absorbed local revision, keeping the most recent
    /// [`MERGED_REVISIONS_KEPT`].
    pub fn record_merge(&mut self, revision: LocalCartRevision) {
        self.merged_revisions.push(revision);
        if self.merged_revisions.len() > MERGED_REVISIONS_KEPT {
            let excess = self.merged_revisions.len() - MERGED_REVISIONS_KEPT;
            self.merged_revisions.drain(..excess);
        }
        self.updated_at = Utc::now();
    }
}

/// Device-local cart as persisted in the [`LocalStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalCart {
    /// Generation marker for this cart; see [`LocalCartRevision`].
    pub revision: LocalCartRevision,
    /// The cart lines, in add order.
    pub lines: Vec<CartLine>,
}

impl LocalCart {
    /// Serialize for the string-valued local store.
    ///
    /// # Errors
    ///
    /// Returns [`LocalCartError::Encode`] if serialization fails.
    pub fn to_json(&self) -> Result<String, LocalCartError> {
        serde_json::to_string(self).map_err(LocalCartError::Encode)
    }

    /// Parse from the string-valued local store.
    ///
    /// # Errors
    ///
    /// Returns [`LocalCartError::Decode`] for corrupt data.
    pub fn from_json(raw: &str) -> Result<Self, LocalCartError> {
        serde_json::from_str(raw).map_err(LocalCartError::Decode)
    }
}

/// Remote per-user cart persistence.
///
/// All calls are network round-trips that may fail; callers treat a failed
/// read differently from a failed write (see the reconciliation contract in
/// [`crate::CartSession`]).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the user's cart document. `Ok(None)` is the explicit "absent"
    /// marker: the user has no stored cart yet.
    async fn get_cart(&self, user: &UserId) -> Result<Option<CartDocument>, StoreError>;

    /// Full-replace write of the cart document, creating it if absent.
    async fn put_cart(&self, user: &UserId, document: &CartDocument) -> Result<(), StoreError>;

    /// Partial update of the line list on an existing document.
    ///
    /// Fails with [`StoreError::NotFound`] if the document does not exist.
    async fn update_lines(&self, user: &UserId, lines: &[CartLine]) -> Result<(), StoreError>;
}

/// Device-local key-value storage surviving page reloads.
///
/// Synchronous and infallible for writes at this system's scale; corrupt
/// values surface when parsed, not when read.
pub trait LocalStore: Send + Sync {
    /// Read the value for a key, if present.
    fn read(&self, key: &str) -> Option<String>;

    /// Write the value for a key.
    fn write(&self, key: &str, value: &str);

    /// Remove a key. Absent keys are a no-op.
    fn clear(&self, key: &str);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_record_merge_bounded() {
        let mut doc = CartDocument::new(Vec::new());
        let revisions: Vec<_> = (0..12).map(|_| LocalCartRevision::generate()).collect();
        for rev in &revisions {
            doc.record_merge(*rev);
        }

        assert_eq!(doc.merged_revisions.len(), MERGED_REVISIONS_KEPT);
        // Oldest dropped, newest kept
        assert!(!doc.has_merged(revisions[0]));
        assert!(doc.has_merged(revisions[11]));
    }

    #[test]
    fn test_local_cart_json_roundtrip() {
        let local = LocalCart {
            revision: LocalCartRevision::generate(),
            lines: Vec::new(),
        };
        let json = local.to_json().unwrap();
        assert_eq!(LocalCart::from_json(&json).unwrap(), local);
    }

    #[test]
    fn test_local_cart_corrupt_data() {
        assert!(matches!(
            LocalCart::from_json("{not json"),
            Err(LocalCartError::Decode(_))
        ));
    }

    #[test]
    fn test_document_missing_revisions_field_defaults_empty() {
        // Documents written before the marker existed still parse
        let doc: CartDocument =
            serde_json::from_str(r#"{"lines":[],"updated_at":"2026-01-01T00:00:00Z"}"#).unwrap();
        assert!(doc.merged_revisions.is_empty());
    }
}
