//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are add-time snapshots: a cart line carries the price the product
//! had when it was added and is never re-fetched on render, so totals stay
//! stable across catalog edits.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Quantity;

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero price in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Price for `quantity` units at this unit price.
    #[must_use]
    pub fn times(&self, quantity: Quantity) -> Self {
        Self::new(
            self.amount * Decimal::from(quantity.get()),
            self.currency_code,
        )
    }

    /// Sum of two prices. Carts in this system are single-currency so the
    /// operands always agree; debug builds check that.
    #[must_use]
    pub fn plus(&self, other: Self) -> Self {
        debug_assert_eq!(
            self.currency_code, other.currency_code,
            "price addition across currencies"
        );
        Self::new(self.amount + other.amount, self.currency_code)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{:.2}", self.currency_code.symbol(), self.amount)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "\u{20ac}",
            Self::GBP => "\u{a3}",
        }
    }

    /// ISO 4217 code string.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn usd(amount: &str) -> Price {
        Price::new(amount.parse().unwrap(), CurrencyCode::USD)
    }

    #[test]
    fn test_times_quantity() {
        let price = usd("9.99");
        let qty = Quantity::new(3).unwrap();
        assert_eq!(price.times(qty), usd("29.97"));
    }

    #[test]
    fn test_plus() {
        assert_eq!(usd("10.00").plus(usd("5.50")), usd("15.50"));
    }

    #[test]
    fn test_display() {
        assert_eq!(usd("4.5").to_string(), "$4.50");
    }

    #[test]
    #[should_panic(expected = "price addition across currencies")]
    fn test_plus_rejects_mixed_currencies() {
        let eur = Price::new("1".parse().unwrap(), CurrencyCode::EUR);
        let _ = usd("1").plus(eur);
    }

    #[test]
    fn test_decimal_exactness() {
        // 0.1 + 0.2 must be exactly 0.3, not the float approximation
        assert_eq!(usd("0.1").plus(usd("0.2")), usd("0.3"));
    }
}
