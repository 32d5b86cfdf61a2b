//! The cart session: one authoritative cart per browser/device session.
//!
//! [`CartSession`] keeps the current cart in memory, persists every
//! mutation to whichever store currently owns the cart, and performs the
//! local-into-remote merge when the identity state transitions to signed
//! in.
//!
//! # Locking
//!
//! All session state sits behind one `tokio::sync::Mutex`. Every operation
//! takes it for its whole duration, so reconciliation holds an exclusive
//! logical lock over the cart: mutations issued while a merge is in flight
//! queue behind it instead of interleaving with its read-merge-write-clear
//! sequence.
//!
//! # Reconciliation contract
//!
//! - Either read failing aborts the merge with neither store mutated.
//! - The remote write must acknowledge before the local store is cleared;
//!   a write failure leaves the local store populated.
//! - The remote document records absorbed local revisions, so a retry
//!   whose earlier write landed (but whose local clear did not) adopts the
//!   remote cart instead of adding the same lines twice.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};

use greengrocer_core::{
    Cart, LocalCartRevision, Price, ProductId, ProductSnapshot, Quantity, UserId,
};

use crate::error::CartServiceError;
use crate::identity::AuthState;
use crate::store::{CART_LINES_KEY, CartDocument, DocumentStore, LocalCart, LocalStore, StoreError};

/// Which store currently owns the session's cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartOwner {
    /// Unauthenticated: the device-local store is authoritative.
    Local,
    /// Authenticated: the user's remote cart document is authoritative.
    Remote(UserId),
}

struct SessionState {
    owner: CartOwner,
    cart: Cart,
    /// Generation of the local cart; meaningful while owner is `Local`.
    /// Re-minted on every persisted local mutation, so an absorbed
    /// revision always describes exactly the lines the remote has seen.
    revision: LocalCartRevision,
    /// True when the in-memory cart diverged from its backing store
    /// because a persistence attempt failed.
    dirty: bool,
}

/// The authoritative cart view for one session.
///
/// Collaborators are constructor-injected; see the crate docs.
pub struct CartSession {
    documents: Arc<dyn DocumentStore>,
    local: Arc<dyn LocalStore>,
    state: Mutex<SessionState>,
}

impl std::fmt::Debug for CartSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartSession").finish_non_exhaustive()
    }
}

impl CartSession {
    /// Create a session, restoring any anonymous cart a previous page load
    /// left in the local store.
    ///
    /// # Errors
    ///
    /// Returns [`CartServiceError::LocalCart`] if stored local cart data is
    /// corrupt. The data is left in place for the caller to inspect or
    /// clear; it is never silently dropped.
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        local: Arc<dyn LocalStore>,
    ) -> Result<Self, CartServiceError> {
        let restored = match local.read(CART_LINES_KEY) {
            Some(raw) => Some(LocalCart::from_json(&raw)?),
            None => None,
        };
        let (cart, revision) = match restored {
            Some(local_cart) => (
                Cart::from_lines(local_cart.lines),
                local_cart.revision,
            ),
            None => (Cart::new(), LocalCartRevision::generate()),
        };

        Ok(Self {
            documents,
            local,
            state: Mutex::new(SessionState {
                owner: CartOwner::Local,
                cart,
                revision,
                dirty: false,
            }),
        })
    }

    /// The current cart.
    pub async fn current_cart(&self) -> Cart {
        self.state.lock().await.cart.clone()
    }

    /// Current total: `sum(unit_price * quantity)`, recomputed fresh.
    pub async fn total(&self) -> Price {
        self.state.lock().await.cart.total()
    }

    /// Total unit count (the cart-badge number).
    pub async fn item_count(&self) -> u32 {
        self.state.lock().await.cart.item_count()
    }

    /// Which store currently owns the cart.
    pub async fn owner(&self) -> CartOwner {
        self.state.lock().await.owner.clone()
    }

    /// Whether the in-memory cart diverged from its backing store because a
    /// persistence attempt failed.
    pub async fn is_dirty(&self) -> bool {
        self.state.lock().await.dirty
    }

    /// Add `quantity` units of a product. An existing line for the product
    /// increments; otherwise a line is appended.
    ///
    /// # Errors
    ///
    /// Returns [`CartServiceError::InvalidQuantity`] for a zero quantity,
    /// or a store error if persistence fails (the in-memory cart keeps the
    /// addition and is flagged dirty).
    #[instrument(skip(self, snapshot), fields(product = %snapshot.product_id))]
    pub async fn add_line(
        &self,
        snapshot: ProductSnapshot,
        quantity: u32,
    ) -> Result<Cart, CartServiceError> {
        let quantity = Quantity::new(quantity)?;
        let mut state = self.state.lock().await;
        state.cart.add_line(snapshot, quantity);
        self.persist(&mut state).await?;
        Ok(state.cart.clone())
    }

    /// Replace a line's quantity; values below 1 are clamped to 1.
    ///
    /// # Errors
    ///
    /// Returns [`CartServiceError::LineNotFound`] if the product has no
    /// line, or a store error if persistence fails.
    #[instrument(skip(self), fields(product = %product_id))]
    pub async fn set_quantity(
        &self,
        product_id: &ProductId,
        new_quantity: u32,
    ) -> Result<Cart, CartServiceError> {
        let mut state = self.state.lock().await;
        state.cart.set_quantity(product_id, new_quantity)?;
        self.persist(&mut state).await?;
        Ok(state.cart.clone())
    }

    /// Remove a product's line. Absence is a no-op (idempotent), and a
    /// no-op performs no store write.
    ///
    /// # Errors
    ///
    /// Returns a store error if persistence fails.
    #[instrument(skip(self), fields(product = %product_id))]
    pub async fn remove_line(&self, product_id: &ProductId) -> Result<Cart, CartServiceError> {
        let mut state = self.state.lock().await;
        if state.cart.remove_line(product_id) {
            self.persist(&mut state).await?;
        }
        Ok(state.cart.clone())
    }

    /// Re-attempt persistence of a dirty cart. No-op when clean.
    ///
    /// # Errors
    ///
    /// Returns the store error if the retry also fails.
    pub async fn flush(&self) -> Result<(), CartServiceError> {
        let mut state = self.state.lock().await;
        if state.dirty {
            self.persist(&mut state).await?;
        }
        Ok(())
    }

    /// Empty the cart after checkout completes.
    ///
    /// # Errors
    ///
    /// Returns a store error if the remote clear fails.
    #[instrument(skip(self))]
    pub async fn clear_after_checkout(&self) -> Result<(), CartServiceError> {
        let mut state = self.state.lock().await;
        state.cart.clear();
        match &state.owner {
            CartOwner::Local => {
                self.local.clear(CART_LINES_KEY);
                state.revision = LocalCartRevision::generate();
                state.dirty = false;
                Ok(())
            }
            CartOwner::Remote(_) => self.persist(&mut state).await,
        }
    }

    /// Handle a signed-out -> signed-in transition: merge the anonymous
    /// cart into the user's remote cart.
    ///
    /// Idempotent for the same user: a second call while already signed in
    /// as `user` is a no-op.
    ///
    /// An empty anonymous cart signing into an account with no stored cart
    /// creates no remote document; the document appears on the first
    /// authenticated mutation.
    ///
    /// # Errors
    ///
    /// Returns [`CartServiceError::ReconciliationAborted`]. On a read
    /// failure neither store was mutated; on a write failure the local
    /// store still holds the cart. Either way the session stays
    /// local-owned and the next sign-in trigger retries safely.
    #[instrument(skip(self), fields(user = %user))]
    pub async fn sign_in(&self, user: UserId) -> Result<Cart, CartServiceError> {
        let mut state = self.state.lock().await;
        if state.owner == CartOwner::Remote(user.clone()) {
            return Ok(state.cart.clone());
        }
        self.reconcile(&mut state, user).await?;
        Ok(state.cart.clone())
    }

    /// Handle a signed-in -> signed-out transition. The remote cart stays
    /// with the account; the session returns to an empty anonymous cart.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) {
        let mut state = self.state.lock().await;
        if state.owner == CartOwner::Local {
            return;
        }
        state.owner = CartOwner::Local;
        state.cart = Cart::new();
        state.revision = LocalCartRevision::generate();
        state.dirty = false;
        debug!("session returned to anonymous cart");
    }

    /// Drive the session from an identity watch channel until the sender
    /// drops. Sign-in edges trigger reconciliation; a failed merge is
    /// logged and retried on the next edge.
    pub async fn run(&self, mut auth: watch::Receiver<AuthState>) {
        let mut previous = auth.borrow().clone();
        loop {
            if auth.changed().await.is_err() {
                break;
            }
            let current = auth.borrow_and_update().clone();
            match (&previous, &current) {
                (None, Some(user)) => {
                    if let Err(e) = self.sign_in(user.clone()).await {
                        warn!(user = %user, "cart reconciliation failed: {e}");
                    }
                }
                (Some(_), None) => self.sign_out().await,
                _ => {}
            }
            previous = current;
        }
    }

    /// Persist the in-memory cart to the owning store. Exactly one store is
    /// written per call.
    async fn persist(&self, state: &mut SessionState) -> Result<(), CartServiceError> {
        let result = match &state.owner {
            CartOwner::Local => {
                // Every local mutation starts a new generation. A revision
                // the remote document has absorbed must never cover lines
                // it has not seen, or reconciliation would adopt the remote
                // cart and drop them.
                state.revision = LocalCartRevision::generate();
                self.write_local(state)
            }
            CartOwner::Remote(user) => {
                match self.documents.update_lines(user, state.cart.lines()).await {
                    // First authenticated mutation may precede any document
                    Err(StoreError::NotFound) => {
                        let document = CartDocument::new(state.cart.lines().to_vec());
                        self.documents
                            .put_cart(user, &document)
                            .await
                            .map_err(CartServiceError::StoreWrite)
                    }
                    other => other.map_err(CartServiceError::StoreWrite),
                }
            }
        };
        match result {
            Ok(()) => {
                state.dirty = false;
                Ok(())
            }
            Err(e) => {
                state.dirty = true;
                Err(e)
            }
        }
    }

    fn write_local(&self, state: &SessionState) -> Result<(), CartServiceError> {
        let local_cart = LocalCart {
            revision: state.revision,
            lines: state.cart.lines().to_vec(),
        };
        self.local.write(CART_LINES_KEY, &local_cart.to_json()?);
        Ok(())
    }

    fn read_local(&self) -> Result<Option<LocalCart>, CartServiceError> {
        match self.local.read(CART_LINES_KEY) {
            Some(raw) => Ok(Some(LocalCart::from_json(&raw)?)),
            None => Ok(None),
        }
    }

    /// The merge itself. Caller holds the state lock.
    async fn reconcile(
        &self,
        state: &mut SessionState,
        user: UserId,
    ) -> Result<(), CartServiceError> {
        // Both reads complete before anything is mutated.
        let local_cart = self.read_local().map_err(CartServiceError::aborted)?;
        let remote = self
            .documents
            .get_cart(&user)
            .await
            .map_err(|e| CartServiceError::aborted(CartServiceError::StoreRead(e)))?;

        let has_local_lines = local_cart
            .as_ref()
            .is_some_and(|lc| !lc.lines.is_empty());

        if !has_local_lines {
            // Nothing to merge: adopt whatever the account holds. No write
            // is needed; an absent document is created lazily on the first
            // authenticated mutation.
            state.cart = remote.map_or_else(Cart::new, |doc| Cart::from_lines(doc.lines));
            self.local.clear(CART_LINES_KEY);
            state.owner = CartOwner::Remote(user);
            state.dirty = false;
            return Ok(());
        }

        // Checked above, but keep the borrow checker honest.
        let Some(local_cart) = local_cart else {
            return Ok(());
        };

        let (adopted, needs_write) = match remote {
            Some(document) if document.has_merged(local_cart.revision) => {
                // A previous attempt's write landed but its local clear did
                // not. Adopting the remote cart as-is keeps the retry from
                // adding the same lines twice.
                info!(revision = %local_cart.revision, "local cart already merged; adopting remote");
                (document, false)
            }
            Some(document) => {
                let merged = Cart::from_lines(document.lines.clone())
                    .merge_from_local(&Cart::from_lines(local_cart.lines.clone()));
                let mut replacement = document;
                replacement.lines = merged.into_iter().collect();
                replacement.record_merge(local_cart.revision);
                (replacement, true)
            }
            None => {
                // Absent remote: the merged cart is the local cart verbatim
                // and the write creates the document.
                let mut document = CartDocument::new(local_cart.lines.clone());
                document.record_merge(local_cart.revision);
                (document, true)
            }
        };

        if needs_write {
            // The one required ordering guarantee: the remote write must
            // acknowledge before the local store is cleared.
            self.documents
                .put_cart(&user, &adopted)
                .await
                .map_err(|e| CartServiceError::aborted(CartServiceError::StoreWrite(e)))?;
        }

        self.local.clear(CART_LINES_KEY);
        state.cart = Cart::from_lines(adopted.lines);
        state.owner = CartOwner::Remote(user);
        state.revision = LocalCartRevision::generate();
        state.dirty = false;
        info!(lines = state.cart.len(), "cart reconciled");
        Ok(())
    }
}
