//! HTTP route handlers for the storefront cart API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//!
//! # Cart
//! GET  /cart                   - Current cart view
//! POST /cart/add               - Add a product (increments existing line)
//! POST /cart/update            - Set a line's quantity (clamped to >= 1)
//! POST /cart/remove            - Remove a line (idempotent)
//! GET  /cart/count             - Cart count badge number
//! POST /cart/checkout          - Clear the cart after checkout
//!
//! # Auth trigger
//! POST /auth/signin            - Relay a sign-in (fires reconciliation)
//! POST /auth/signout           - Relay a sign-out
//! ```

pub mod auth;
pub mod cart;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
        .route("/checkout", post(cart::checkout))
}

/// Create the auth-trigger routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signin", post(auth::signin))
        .route("/signout", post(auth::signout))
}

/// Health check endpoint.
pub async fn health() -> &'static str {
    "ok"
}
