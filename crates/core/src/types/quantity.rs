//! Positive-integer quantity type.
//!
//! Quantities are validated at every construction boundary: a `Quantity`
//! in hand is always >= 1, so merge and total logic never re-checks.

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// Quantities start at 1; zero means the line should not exist.
    #[error("quantity must be at least 1")]
    Zero,
}

/// A cart line quantity: an integer >= 1.
///
/// Removal is an explicit operation, never an implicit consequence of a
/// quantity reaching zero, so zero is unrepresentable here.
///
/// ## Examples
///
/// ```
/// use greengrocer_core::Quantity;
///
/// assert!(Quantity::new(1).is_ok());
/// assert!(Quantity::new(0).is_err());
/// assert_eq!(Quantity::clamping(0).get(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// The minimum quantity.
    pub const ONE: Self = Self(1);

    /// Construct a quantity, rejecting zero.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::Zero`] if `value` is 0.
    pub const fn new(value: u32) -> Result<Self, QuantityError> {
        if value == 0 {
            Err(QuantityError::Zero)
        } else {
            Ok(Self(value))
        }
    }

    /// Construct a quantity, clamping values below 1 up to 1.
    ///
    /// This is the set-quantity policy: the system never stores a zero or
    /// negative quantity via that path.
    #[must_use]
    pub const fn clamping(value: u32) -> Self {
        if value == 0 { Self(1) } else { Self(value) }
    }

    /// The underlying integer value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Additive combination of two quantities, saturating at `u32::MAX`.
    ///
    /// Used by the merge law: quantities from local and remote lines add.
    #[must_use]
    pub const fn plus(&self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// One more, saturating at `u32::MAX`.
    #[must_use]
    pub const fn increment(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// One less, floored at 1.
    #[must_use]
    pub const fn decrement(&self) -> Self {
        if self.0 <= 1 { Self(1) } else { Self(self.0 - 1) }
    }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_zero() {
        assert_eq!(Quantity::new(0), Err(QuantityError::Zero));
        assert_eq!(Quantity::new(1).unwrap().get(), 1);
    }

    #[test]
    fn test_clamping_floors_at_one() {
        assert_eq!(Quantity::clamping(0).get(), 1);
        assert_eq!(Quantity::clamping(7).get(), 7);
    }

    #[test]
    fn test_plus_is_additive() {
        let two = Quantity::new(2).unwrap();
        let three = Quantity::new(3).unwrap();
        assert_eq!(two.plus(three).get(), 5);
    }

    #[test]
    fn test_decrement_floors_at_one() {
        assert_eq!(Quantity::new(2).unwrap().decrement().get(), 1);
        assert_eq!(Quantity::ONE.decrement().get(), 1);
    }

    #[test]
    fn test_serde_rejects_zero() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        let q: Quantity = serde_json::from_str("4").unwrap();
        assert_eq!(q.get(), 4);
    }

    #[test]
    fn test_plus_saturates() {
        let max = Quantity::new(u32::MAX).unwrap();
        assert_eq!(max.plus(Quantity::ONE).get(), u32::MAX);
    }
}
