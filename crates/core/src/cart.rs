//! Cart data model: lines, carts, and the pure merge law.
//!
//! A [`Cart`] is an ordered collection of [`CartLine`] entries with one
//! invariant: `product_id` is unique within a cart. All mutation goes
//! through methods that preserve it - adding a product that is already
//! present increments the existing line instead of appending a duplicate.
//!
//! The merge of a device-local cart into an account cart
//! ([`Cart::merge_from_local`]) is a pure function here; the store reads,
//! write-back ordering, and retry marker live in the `greengrocer-cart`
//! crate.

use serde::{Deserialize, Serialize};

use crate::types::{CurrencyCode, Price, ProductId, Quantity, QuantityError};

/// Errors from cart mutation operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// Quantity input was zero (or otherwise unrepresentable).
    #[error("invalid quantity: {0}")]
    InvalidQuantity(#[from] QuantityError),

    /// The targeted product has no line in this cart.
    #[error("no cart line for product {0}")]
    LineNotFound(ProductId),
}

/// The catalog data captured into a line at add time.
///
/// Name, image, and unit price are snapshots: they reflect the product as
/// it was when added and are not re-fetched on render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub image_url: Option<String>,
}

/// One product line in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub unit_price: Price,
    pub name: String,
    pub image_url: Option<String>,
}

impl CartLine {
    /// Create a line from an add-time snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: ProductSnapshot, quantity: Quantity) -> Self {
        Self {
            product_id: snapshot.product_id,
            quantity,
            unit_price: snapshot.unit_price,
            name: snapshot.name,
            image_url: snapshot.image_url,
        }
    }

    /// `unit_price * quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Ordered collection of cart lines with unique product IDs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Build a cart from lines, merging any duplicate product IDs by adding
    /// quantities. Used when deserializing externally-held data that may
    /// predate the uniqueness invariant.
    #[must_use]
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            match cart.position(&line.product_id) {
                Some(i) => {
                    if let Some(existing) = cart.lines.get_mut(i) {
                        existing.quantity = existing.quantity.plus(line.quantity);
                    }
                }
                None => cart.lines.push(line),
            }
        }
        cart
    }

    /// The lines in order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Number of distinct product lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total unit count across all lines (the cart-badge number).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0, |acc, line| acc.saturating_add(line.quantity.get()))
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.product_id == product_id)
    }

    fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.lines.iter().position(|l| &l.product_id == product_id)
    }

    /// Add `quantity` units of a product.
    ///
    /// If a line for the product exists its quantity increments by
    /// `quantity`; otherwise a new line is appended. Exactly one line
    /// changes.
    pub fn add_line(&mut self, snapshot: ProductSnapshot, quantity: Quantity) {
        match self.position(&snapshot.product_id) {
            Some(i) => {
                if let Some(line) = self.lines.get_mut(i) {
                    line.quantity = line.quantity.plus(quantity);
                }
            }
            None => self.lines.push(CartLine::from_snapshot(snapshot, quantity)),
        }
    }

    /// Replace a line's quantity. Values below 1 are clamped to 1; removal
    /// is a distinct explicit operation, never an implicit consequence of
    /// setting quantity to zero.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if the product has no line.
    pub fn set_quantity(
        &mut self,
        product_id: &ProductId,
        new_quantity: u32,
    ) -> Result<(), CartError> {
        let i = self
            .position(product_id)
            .ok_or_else(|| CartError::LineNotFound(product_id.clone()))?;
        if let Some(line) = self.lines.get_mut(i) {
            line.quantity = Quantity::clamping(new_quantity);
        }
        Ok(())
    }

    /// Remove a product's line. Returns whether a line was removed; absence
    /// is a no-op, not an error, so double-removal (two rapid clicks) is
    /// idempotent.
    pub fn remove_line(&mut self, product_id: &ProductId) -> bool {
        match self.position(product_id) {
            Some(i) => {
                self.lines.remove(i);
                true
            }
            None => false,
        }
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Total price: `sum(unit_price * quantity)` over all lines, computed
    /// on demand and never stored, so it cannot drift from the line data.
    #[must_use]
    pub fn total(&self) -> Price {
        let currency = self
            .lines
            .first()
            .map_or(CurrencyCode::default(), |l| l.unit_price.currency_code);
        self.lines
            .iter()
            .fold(Price::zero(currency), |acc, line| acc.plus(line.line_total()))
    }

    /// Merge a device-local cart into this (remote) cart.
    ///
    /// - Shared product: quantities are additive, not replaced. A user who
    ///   added 2 of an item anonymously and already had 3 on another device
    ///   ends up with 5.
    /// - Local-only lines are appended, in local order, after all remote
    ///   lines; the remote line's snapshot wins for shared products.
    /// - Remote lines keep their relative order.
    #[must_use]
    pub fn merge_from_local(&self, local: &Self) -> Self {
        let mut merged = self.clone();
        for line in &local.lines {
            match merged.position(&line.product_id) {
                Some(i) => {
                    if let Some(existing) = merged.lines.get_mut(i) {
                        existing.quantity = existing.quantity.plus(line.quantity);
                    }
                }
                None => merged.lines.push(line.clone()),
            }
        }
        merged
    }
}

impl IntoIterator for Cart {
    type Item = CartLine;
    type IntoIter = std::vec::IntoIter<CartLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.into_iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::CurrencyCode;

    fn usd(amount: &str) -> Price {
        Price::new(amount.parse().unwrap(), CurrencyCode::USD)
    }

    fn snapshot(id: &str, price: &str) -> ProductSnapshot {
        ProductSnapshot {
            product_id: ProductId::new(id),
            name: format!("Product {id}"),
            unit_price: usd(price),
            image_url: None,
        }
    }

    fn qty(n: u32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    fn cart_of(entries: &[(&str, u32, &str)]) -> Cart {
        let mut cart = Cart::new();
        for (id, n, price) in entries {
            cart.add_line(snapshot(id, price), qty(*n));
        }
        cart
    }

    #[test]
    fn test_add_existing_product_increments_only_that_line() {
        let mut cart = cart_of(&[("a", 2, "10"), ("b", 1, "5")]);
        cart.add_line(snapshot("a", "10"), qty(3));

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.line(&ProductId::new("a")).unwrap().quantity, qty(5));
        assert_eq!(cart.line(&ProductId::new("b")).unwrap().quantity, qty(1));
    }

    #[test]
    fn test_add_new_product_appends() {
        let mut cart = cart_of(&[("a", 1, "10")]);
        cart.add_line(snapshot("b", "5"), qty(2));

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.lines()[1].product_id, ProductId::new("b"));
    }

    #[test]
    fn test_set_quantity_clamps_below_one() {
        let mut cart = cart_of(&[("a", 3, "10")]);
        cart.set_quantity(&ProductId::new("a"), 0).unwrap();

        // Line retained at quantity 1, not removed
        assert_eq!(cart.line(&ProductId::new("a")).unwrap().quantity, qty(1));
    }

    #[test]
    fn test_set_quantity_missing_line() {
        let mut cart = Cart::new();
        let err = cart.set_quantity(&ProductId::new("ghost"), 2).unwrap_err();
        assert!(matches!(err, CartError::LineNotFound(_)));
    }

    #[test]
    fn test_remove_line_is_idempotent() {
        let mut cart = cart_of(&[("a", 1, "10")]);
        assert!(cart.remove_line(&ProductId::new("a")));
        let after_once = cart.clone();
        assert!(!cart.remove_line(&ProductId::new("a")));
        assert_eq!(cart, after_once);
    }

    #[test]
    fn test_total_recomputed_after_mutation() {
        let mut cart = cart_of(&[("a", 2, "10"), ("b", 1, "5")]);
        assert_eq!(cart.total(), usd("25"));

        cart.set_quantity(&ProductId::new("a"), 1).unwrap();
        assert_eq!(cart.total(), usd("15"));

        cart.remove_line(&ProductId::new("b"));
        assert_eq!(cart.total(), usd("10"));
    }

    #[test]
    fn test_total_of_empty_cart_is_zero() {
        assert_eq!(Cart::new().total().amount, rust_decimal::Decimal::ZERO);
    }

    #[test]
    fn test_item_count() {
        let cart = cart_of(&[("a", 2, "10"), ("b", 3, "5")]);
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_merge_disjoint_carts_concatenates() {
        let remote = cart_of(&[("r1", 1, "10"), ("r2", 2, "5")]);
        let local = cart_of(&[("l1", 1, "3"), ("l2", 4, "2")]);

        let merged = remote.merge_from_local(&local);

        assert_eq!(merged.len(), 4);
        // Remote order retained, local-only lines appended in local order
        let ids: Vec<_> = merged.lines().iter().map(|l| l.product_id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2", "l1", "l2"]);
    }

    #[test]
    fn test_merge_shared_product_adds_quantities() {
        let remote = cart_of(&[("p", 3, "10")]);
        let local = cart_of(&[("p", 2, "10")]);

        let merged = remote.merge_from_local(&local);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged.line(&ProductId::new("p")).unwrap().quantity, qty(5));
    }

    #[test]
    fn test_merge_scenario_from_two_devices() {
        // local [{A, qty 2, $10}], remote [{A, qty 1, $10}, {B, qty 1, $5}]
        let local = cart_of(&[("A", 2, "10")]);
        let remote = cart_of(&[("A", 1, "10"), ("B", 1, "5")]);

        let merged = remote.merge_from_local(&local);

        assert_eq!(merged.line(&ProductId::new("A")).unwrap().quantity, qty(3));
        assert_eq!(merged.line(&ProductId::new("B")).unwrap().quantity, qty(1));
        assert_eq!(merged.total(), usd("35"));
    }

    #[test]
    fn test_merge_into_empty_remote_is_local_verbatim() {
        let local = cart_of(&[("a", 2, "10"), ("b", 1, "5")]);
        let merged = Cart::new().merge_from_local(&local);
        assert_eq!(merged, local);
    }

    #[test]
    fn test_from_lines_coalesces_duplicates() {
        let line = CartLine::from_snapshot(snapshot("a", "10"), qty(1));
        let cart = Cart::from_lines([line.clone(), line]);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.line(&ProductId::new("a")).unwrap().quantity, qty(2));
    }

    #[test]
    fn test_serde_is_transparent_line_list() {
        let cart = cart_of(&[("a", 2, "10")]);
        let json = serde_json::to_value(&cart).unwrap();
        assert!(json.is_array());
        let back: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(back, cart);
    }
}
