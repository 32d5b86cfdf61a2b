//! Greengrocer Cart - anonymous-to-authenticated cart reconciliation.
//!
//! This crate owns "the current cart" for one browser/device session. While
//! nobody is signed in the cart lives in a device-local key-value store;
//! once an identity is established it lives in a per-user remote document.
//! The transition between the two - merging the anonymous cart into the
//! account cart exactly once per sign-in - is the reconciliation this crate
//! exists for.
//!
//! # Architecture
//!
//! - [`store`] - the two persistence seams ([`DocumentStore`] async,
//!   [`LocalStore`] sync) plus their wire forms and implementations
//! - [`identity`] - the sign-in/out trigger as a watch channel
//! - [`session`] - [`CartSession`], the state machine tying it together
//!
//! All collaborators are constructor-injected; nothing in this crate
//! reaches into ambient singletons.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use greengrocer_cart::{CartSession, MemoryDocumentStore, MemoryLocalStore};
//!
//! let session = CartSession::new(
//!     Arc::new(MemoryDocumentStore::new()),
//!     Arc::new(MemoryLocalStore::new()),
//! )?;
//!
//! session.add_line(snapshot, 2).await?;
//! session.sign_in(user_id).await?; // merges the anonymous cart
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod error;
pub mod identity;
pub mod session;
pub mod store;

pub use error::CartServiceError;
pub use identity::{AuthState, IdentityProvider, StaticIdentity};
pub use session::{CartOwner, CartSession};
pub use store::{
    CART_LINES_KEY, CartDocument, DocumentStore, FileLocalStore, HttpDocumentStore, LocalCart,
    LocalCartError, LocalStore, MemoryDocumentStore, MemoryLocalStore, StoreError,
};
