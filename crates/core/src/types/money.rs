//! Type-safe money representation using decimal arithmetic.
//!
//! The API transmits every monetary field as a decimal string (`"12.50"`).
//! Those strings are parsed into [`Money`] at the gateway boundary so that no
//! arithmetic ever happens on text or on binary floating point.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// ISO 4217 code of the only currency the bazaar trades in.
pub const CURRENCY_CODE: &str = "KWD";

/// Errors that can occur when parsing a [`Money`] amount.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The input string is empty.
    #[error("amount cannot be empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("invalid amount: {0:?}")]
    Invalid(String),
    /// The amount is below zero.
    #[error("amount cannot be negative: {0}")]
    Negative(Decimal),
}

/// A non-negative amount in [`CURRENCY_CODE`].
///
/// Serializes as a decimal string, matching the wire format.
///
/// ```
/// use bazaar_core::Money;
///
/// let price = Money::parse("10.00").unwrap();
/// let line = price.times(2);
/// assert_eq!(line.to_string(), "20.00 KWD");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Parse a decimal string such as `"12.5"` or `" 3 "`.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is empty, not a decimal number, or
    /// negative.
    pub fn parse(s: &str) -> Result<Self, MoneyError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(MoneyError::Empty);
        }
        let amount =
            Decimal::from_str(trimmed).map_err(|_| MoneyError::Invalid(trimmed.to_owned()))?;
        Self::from_decimal(amount)
    }

    /// Wrap a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] for amounts below zero.
    pub fn from_decimal(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Build an amount from hundredths (`1250` is `12.50`).
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Multiply by a line quantity, saturating at [`Decimal::MAX`].
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.checked_mul(Decimal::from(quantity)).unwrap_or(Decimal::MAX))
    }

    /// Amount formatted with two decimals and no currency, as sent on the wire.
    #[must_use]
    pub fn to_wire(&self) -> String {
        format!("{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    /// Saturates at [`Decimal::MAX`].
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.checked_add(rhs.0).unwrap_or(Decimal::MAX))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {CURRENCY_CODE}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wire_strings() {
        assert_eq!(Money::parse("12.50").unwrap(), Money::from_cents(1250));
        assert_eq!(Money::parse(" 2 ").unwrap(), Money::from_cents(200));
        assert_eq!(Money::parse("0").unwrap(), Money::ZERO);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Money::parse(""), Err(MoneyError::Empty));
        assert!(matches!(Money::parse("abc"), Err(MoneyError::Invalid(_))));
        assert!(matches!(Money::parse("-1.00"), Err(MoneyError::Negative(_))));
    }

    #[test]
    fn test_sum_and_times() {
        let lines = [Money::from_cents(1000).times(2), Money::from_cents(500).times(1)];
        let subtotal: Money = lines.into_iter().sum();
        assert_eq!(subtotal, Money::from_cents(2500));
        assert_eq!((subtotal + Money::from_cents(200)).to_wire(), "27.00");
    }

    #[test]
    fn test_huge_amounts_saturate() {
        let huge = Money::from_decimal(Decimal::MAX / Decimal::TWO).unwrap();
        assert_eq!(huge.times(3_000_000_000).amount(), Decimal::MAX);

        let max = Money::from_decimal(Decimal::MAX).unwrap();
        assert_eq!((max + Money::from_cents(100)).amount(), Decimal::MAX);

        let subtotal: Money = [huge.times(4), Money::from_cents(1)].into_iter().sum();
        assert_eq!(subtotal.amount(), Decimal::MAX);
    }

    #[test]
    fn test_display_includes_currency() {
        assert_eq!(Money::from_cents(705).to_string(), "7.05 KWD");
    }

    #[test]
    fn test_serde_uses_decimal_strings() {
        let json = serde_json::to_string(&Money::from_cents(1999)).unwrap();
        assert_eq!(json, "\"19.99\"");
        let back: Money = serde_json::from_str("\"19.99\"").unwrap();
        assert_eq!(back, Money::from_cents(1999));
    }
}
