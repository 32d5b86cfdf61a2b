//! Application state shared across handlers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use greengrocer_cart::{
    CartServiceError, CartSession, FileLocalStore, HttpDocumentStore, IdentityProvider,
    StaticIdentity,
};

use crate::config::StorefrontConfig;

/// How long an untouched device session stays resident. Matches the
/// practical lifetime of the session cookie that names it; the local cart
/// file outlives eviction, so a returning device restores its cart.
const SESSION_IDLE_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// One device session: its cart, and the identity channel that triggers
/// reconciliation for it.
pub struct SessionEntry {
    cart: Arc<CartSession>,
    identity: StaticIdentity,
}

impl SessionEntry {
    /// The session's cart.
    #[must_use]
    pub fn cart(&self) -> &Arc<CartSession> {
        &self.cart
    }

    /// The session's identity relay.
    #[must_use]
    pub fn identity(&self) -> &StaticIdentity {
        &self.identity
    }
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the document store client and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct SessionSlot {
    entry: Arc<SessionEntry>,
    last_used: Instant,
}

struct AppStateInner {
    config: StorefrontConfig,
    documents: HttpDocumentStore,
    sessions: Mutex<HashMap<String, SessionSlot>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let documents = HttpDocumentStore::new(
            config.document_store.base_url.clone(),
            config.document_store.api_token.clone(),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                documents,
                sessions: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get or create the cart session for a device ID.
    ///
    /// New sessions get a file-backed local store scoped to the device and
    /// a background driver task that reconciles on sign-in edges. Sessions
    /// idle for [`SESSION_IDLE_TTL`] are evicted here; dropping the entry
    /// drops its identity sender, which ends the driver task.
    ///
    /// # Errors
    ///
    /// Returns an error if a previously stored local cart is corrupt.
    pub async fn session_entry(
        &self,
        device_id: &str,
    ) -> Result<Arc<SessionEntry>, CartServiceError> {
        let mut sessions = self.inner.sessions.lock().await;
        sessions.retain(|_, slot| slot.last_used.elapsed() < SESSION_IDLE_TTL);

        if let Some(slot) = sessions.get_mut(device_id) {
            slot.last_used = Instant::now();
            return Ok(slot.entry.clone());
        }

        let local = FileLocalStore::new(self.inner.config.local_cart_dir.join(device_id));
        let cart = Arc::new(CartSession::new(
            Arc::new(self.inner.documents.clone()),
            Arc::new(local),
        )?);
        let identity = StaticIdentity::new();

        // Reconciliation trigger wiring: the driver observes sign-in/out
        // edges and runs until the entry (and its identity sender) drops.
        let auth = identity.subscribe();
        tokio::spawn({
            let cart = cart.clone();
            async move { cart.run(auth).await }
        });

        let entry = Arc::new(SessionEntry { cart, identity });
        sessions.insert(
            device_id.to_owned(),
            SessionSlot {
                entry: entry.clone(),
                last_used: Instant::now(),
            },
        );
        Ok(entry)
    }

    /// Number of resident device sessions.
    pub async fn session_count(&self) -> usize {
        self.inner.sessions.lock().await.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::DocumentStoreConfig;
    use secrecy::SecretString;
    use url::Url;

    fn test_state() -> AppState {
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            document_store: DocumentStoreConfig {
                base_url: Url::parse("http://localhost:9/").unwrap(),
                api_token: SecretString::from("integration-0123456789abcdef"),
            },
            // Never written: these tests do not mutate any cart
            local_cart_dir: std::env::temp_dir().join("greengrocer-state-tests"),
            sentry_dsn: None,
            sentry_environment: None,
        };
        AppState::new(config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_are_evicted() {
        let state = test_state();

        state.session_entry("device-1").await.unwrap();
        state.session_entry("device-2").await.unwrap();
        assert_eq!(state.session_count().await, 2);

        tokio::time::advance(SESSION_IDLE_TTL + Duration::from_secs(1)).await;

        // The next lookup sweeps the idle entries
        state.session_entry("device-3").await.unwrap();
        assert_eq!(state.session_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recently_used_session_is_retained() {
        let state = test_state();
        let first = state.session_entry("device-1").await.unwrap();

        tokio::time::advance(SESSION_IDLE_TTL / 2).await;
        state.session_entry("device-1").await.unwrap();
        tokio::time::advance(SESSION_IDLE_TTL / 2).await;

        let again = state.session_entry("device-1").await.unwrap();
        assert!(Arc::ptr_eq(&first, &again));
    }
}
