//! Cart service error taxonomy.

use thiserror::Error;

use greengrocer_core::{CartError, ProductId, QuantityError};

use crate::store::{LocalCartError, StoreError};

/// Errors surfaced by [`crate::CartSession`] operations.
///
/// Validation errors (`InvalidQuantity`, `LineNotFound`) are local,
/// synchronous failures. Store failures during ordinary mutation leave the
/// in-memory cart intact but flagged dirty; the caller decides whether to
/// retry. `ReconciliationAborted` wraps the failure that stopped a merge -
/// by contract neither store was mutated when it is returned for a read
/// failure, and the local store still holds the cart when it is returned
/// for a write failure.
#[derive(Debug, Error)]
pub enum CartServiceError {
    /// Bad quantity input to add-line.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(#[from] QuantityError),

    /// Set-quantity targeted a product with no line.
    #[error("no cart line for product {0}")]
    LineNotFound(ProductId),

    /// Reading from the document store failed.
    #[error("store read failed: {0}")]
    StoreRead(#[source] StoreError),

    /// Writing to the document store failed.
    #[error("store write failed: {0}")]
    StoreWrite(#[source] StoreError),

    /// Device-local cart data could not be encoded or decoded.
    #[error("local cart storage: {0}")]
    LocalCart(#[from] LocalCartError),

    /// A merge stopped partway; no partial result was persisted.
    #[error("reconciliation aborted: {source}")]
    ReconciliationAborted {
        #[source]
        source: Box<CartServiceError>,
    },
}

impl CartServiceError {
    /// Wrap a failure as a reconciliation abort.
    #[must_use]
    pub fn aborted(source: Self) -> Self {
        Self::ReconciliationAborted {
            source: Box::new(source),
        }
    }
}

impl From<CartError> for CartServiceError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::InvalidQuantity(e) => Self::InvalidQuantity(e),
            CartError::LineNotFound(id) => Self::LineNotFound(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_error_mapping() {
        let err: CartServiceError = CartError::LineNotFound(ProductId::new("p")).into();
        assert!(matches!(err, CartServiceError::LineNotFound(_)));

        let err: CartServiceError = CartError::InvalidQuantity(QuantityError::Zero).into();
        assert!(matches!(err, CartServiceError::InvalidQuantity(_)));
    }

    #[test]
    fn test_aborted_preserves_source() {
        let err = CartServiceError::aborted(CartServiceError::StoreRead(StoreError::Unavailable(
            "down".to_owned(),
        )));
        assert!(matches!(
            err,
            CartServiceError::ReconciliationAborted { .. }
        ));
        assert!(err.to_string().contains("store read failed"));
    }
}
