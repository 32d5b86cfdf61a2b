//! Cart route handlers.
//!
//! All handlers resolve the caller's device session from the cookie
//! session, then delegate to its `CartSession`. Responses are JSON views;
//! prices are formatted strings so clients never do money math.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use greengrocer_core::{Cart, CurrencyCode, Price, ProductId, ProductSnapshot};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Session key holding the device identifier.
const DEVICE_ID_KEY: &str = "device_id";

/// Cart line display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    pub image_url: Option<String>,
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart
                .lines()
                .iter()
                .map(|line| CartItemView {
                    product_id: line.product_id.to_string(),
                    name: line.name.clone(),
                    quantity: line.quantity.get(),
                    unit_price: line.unit_price.to_string(),
                    line_total: line.line_total().to_string(),
                    image_url: line.image_url.clone(),
                })
                .collect(),
            subtotal: cart.total().to_string(),
            item_count: cart.item_count(),
        }
    }
}

/// Cart count badge data.
#[derive(Debug, Clone, Serialize)]
pub struct CartCountView {
    pub count: u32,
}

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    #[serde(default)]
    pub currency: Option<CurrencyCode>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
}

/// Update cart request body.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub product_id: String,
    pub quantity: u32,
}

/// Remove from cart request body.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub product_id: String,
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the device ID from the session, minting one on first touch.
pub async fn device_id(session: &Session) -> Result<String> {
    if let Some(id) = session.get::<String>(DEVICE_ID_KEY).await? {
        return Ok(id);
    }
    let id = Uuid::new_v4().to_string();
    session.insert(DEVICE_ID_KEY, &id).await?;
    Ok(id)
}

async fn cart_session(
    state: &AppState,
    session: &Session,
) -> Result<std::sync::Arc<crate::state::SessionEntry>> {
    let device = device_id(session).await?;
    state.session_entry(&device).await.map_err(AppError::from)
}

// =============================================================================
// Handlers
// =============================================================================

/// Current cart view.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let entry = cart_session(&state, &session).await?;
    let cart = entry.cart().current_cart().await;
    Ok(Json(CartView::from(&cart)))
}

/// Add a product to the cart. An existing line for the product increments
/// by the given quantity; otherwise a new line is appended.
#[instrument(skip(state, session, request), fields(product = %request.product_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let entry = cart_session(&state, &session).await?;
    let snapshot = ProductSnapshot {
        product_id: ProductId::new(request.product_id),
        name: request.name,
        unit_price: Price::new(request.unit_price, request.currency.unwrap_or_default()),
        image_url: request.image_url,
    };
    let cart = entry
        .cart()
        .add_line(snapshot, request.quantity.unwrap_or(1))
        .await?;
    Ok(Json(CartView::from(&cart)))
}

/// Set a line's quantity. Values below 1 are clamped to 1; removal is the
/// explicit `/cart/remove` operation.
#[instrument(skip(state, session, request), fields(product = %request.product_id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<UpdateCartRequest>,
) -> Result<Json<CartView>> {
    let entry = cart_session(&state, &session).await?;
    let cart = entry
        .cart()
        .set_quantity(&ProductId::new(request.product_id), request.quantity)
        .await?;
    Ok(Json(CartView::from(&cart)))
}

/// Remove a line. Absent lines are a no-op so double-clicks are harmless.
#[instrument(skip(state, session, request), fields(product = %request.product_id))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<Json<CartView>> {
    let entry = cart_session(&state, &session).await?;
    let cart = entry
        .cart()
        .remove_line(&ProductId::new(request.product_id))
        .await?;
    Ok(Json(CartView::from(&cart)))
}

/// Cart count badge number.
#[instrument(skip(state, session))]
pub async fn count(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CartCountView>> {
    let entry = cart_session(&state, &session).await?;
    Ok(Json(CartCountView {
        count: entry.cart().item_count().await,
    }))
}

/// Clear the cart after checkout completes.
#[instrument(skip(state, session))]
pub async fn checkout(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let entry = cart_session(&state, &session).await?;
    entry.cart().clear_after_checkout().await?;
    let cart = entry.cart().current_cart().await;
    Ok(Json(CartView::from(&cart)))
}
