//! Auth trigger route handlers.
//!
//! Authentication itself happens with an external identity provider; these
//! endpoints only relay the resulting state transition into the session's
//! identity channel, which is what triggers cart reconciliation.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use greengrocer_core::UserId;

use crate::error::Result;
use crate::routes::cart::CartView;
use crate::state::AppState;

/// Sign-in relay request body.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub user_id: String,
}

/// Sign-in response: the reconciled cart.
#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub cart: CartView,
}

/// Relay a sign-in. Merges the device's anonymous cart into the user's
/// remote cart and returns the merged view.
#[instrument(skip(state, session, request), fields(user = %request.user_id))]
pub async fn signin(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<SignInRequest>,
) -> Result<Json<SignInResponse>> {
    let device = super::cart::device_id(&session).await?;
    let entry = state.session_entry(&device).await?;

    let user = UserId::new(request.user_id);
    // Keep the identity channel consistent for the background driver; the
    // direct call surfaces reconciliation errors to this request.
    entry.identity().sign_in(user.clone());
    let cart = entry.cart().sign_in(user).await?;

    Ok(Json(SignInResponse {
        cart: CartView::from(&cart),
    }))
}

/// Relay a sign-out. The session returns to an empty anonymous cart.
#[instrument(skip(state, session))]
pub async fn signout(State(state): State<AppState>, session: Session) -> Result<()> {
    let device = super::cart::device_id(&session).await?;
    let entry = state.session_entry(&device).await?;

    entry.identity().sign_out();
    entry.cart().sign_out().await;
    Ok(())
}
