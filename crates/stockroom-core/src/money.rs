//! # Money Module
//!
//! Provides the `Money` type for monetary values.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sale totals are sums of products and differences:                      │
//! │                                                                         │
//! │    line     = unit_price × quantity − line_discount                     │
//! │    total    = Σ line                                                    │
//! │    grand    = total − header_discount + header_tax                      │
//! │                                                                         │
//! │  With floats, Σ line can drift from the stored grand total by a        │
//! │  fraction of a cent. With integer cents the identity holds exactly,    │
//! │  so `grand == Σ line − discount + tax` can be asserted with `==`.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::money::Money;
//!
//! let price = Money::from_cents(10_000); // $100.00
//! let gross = price * 3_i64;             // $300.00
//! let line = gross - Money::from_cents(500);
//! assert_eq!(line.cents(), 29_500);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// Signed, because a heavily discounted sale may legitimately carry a
/// negative line subtotal or grand total; this type does not police that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1099).cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Zero.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity, or `None` if the product does
    /// not fit.
    ///
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.checked_mul_quantity(3), Some(Money::from_cents(897)));
    /// assert_eq!(Money::from_cents(i64::MAX).checked_mul_quantity(2), None);
    /// ```
    #[inline]
    pub fn checked_mul_quantity(&self, qty: i64) -> Option<Self> {
        // Use i128 so the product itself cannot wrap
        let product = self.0 as i128 * qty as i128;
        i64::try_from(product).ok().map(Money)
    }

    #[inline]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }

    #[inline]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Money)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-oriented rendering; presentation layers do their own formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(28_700).to_string(), "287.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((b - a).cents(), -500);
        assert_eq!((a * 3_i64).cents(), 3000);
        assert_eq!((-a).cents(), -1000);
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let max = Money::from_cents(i64::MAX);
        let one = Money::from_cents(1);

        assert_eq!(max.checked_add(one), None);
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(one), None);
        assert_eq!(max.checked_mul_quantity(2), None);
        assert_eq!(max.checked_mul_quantity(1), Some(max));
        assert_eq!(
            Money::from_cents(1000).checked_sub(Money::from_cents(1500)),
            Some(Money::from_cents(-500))
        );
    }

    #[test]
    fn test_sign_checks() {
        assert!(Money::zero().is_zero());
        assert!(!Money::from_cents(1).is_negative());
        assert!(Money::from_cents(-1).is_negative());
    }
}
