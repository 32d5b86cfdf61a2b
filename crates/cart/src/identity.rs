//! Identity-state trigger wiring.
//!
//! The identity provider itself (OAuth, passkeys, whatever) is an external
//! collaborator; the only thing the cart needs from it is the sign-in/out
//! transition stream. A `tokio::sync::watch` channel models it: the session
//! observes edges, not levels, so a sign-in fires reconciliation exactly
//! once.

use tokio::sync::watch;

use greengrocer_core::UserId;

/// Current authentication state: a user identifier, or signed out.
pub type AuthState = Option<UserId>;

/// Source of authentication-state change notifications.
pub trait IdentityProvider: Send + Sync {
    /// Subscribe to auth-state transitions. The receiver's initial value is
    /// the current state.
    fn subscribe(&self) -> watch::Receiver<AuthState>;
}

/// In-process identity provider driven by explicit calls.
///
/// Used by tests and by the storefront's session wiring, where the actual
/// authentication happens elsewhere and this just relays the outcome.
#[derive(Debug)]
pub struct StaticIdentity {
    sender: watch::Sender<AuthState>,
}

impl StaticIdentity {
    /// Create a provider in the signed-out state.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    /// Transition to signed in as `user`.
    pub fn sign_in(&self, user: UserId) {
        self.sender.send_replace(Some(user));
    }

    /// Transition to signed out.
    pub fn sign_out(&self) {
        self.sender.send_replace(None);
    }

    /// The current state.
    #[must_use]
    pub fn current(&self) -> AuthState {
        self.sender.borrow().clone()
    }
}

impl Default for StaticIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for StaticIdentity {
    fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.sender.subscribe()
    }
}
