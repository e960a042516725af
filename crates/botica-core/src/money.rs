//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Order totals are sums of discounted line totals; every line is        │
//! │  rounded to the cent once, when it is stored. Integer cents make        │
//! │  "total = sum of line totals" hold exactly.                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use botica_core::money::Money;
//! use botica_core::types::Percentage;
//!
//! let unit_price = Money::from_cents(1250); // 12.50
//! let gross = unit_price * 3;               // 37.50
//! let net = gross.apply_discount(Percentage::from_percentage(10.0));
//! assert_eq!(net.cents(), 3375);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::types::Percentage;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: differences such as `target - sales` may go negative
///   before being clamped
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serialized as plain cents**: `{"total": 12550}`
///
/// ## Where Money is Used
/// ```text
/// OrderLine.unit_price ──► OrderLine.line_total ──► Order.total
///                                                       │
///               Settings.quarterly_targets ─────────────┼──► QuarterProjection
///                                                       │
///                                   sales_so_far ◄──────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use botica_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
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
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
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

    /// Clamps negative values to zero.
    ///
    /// ```rust
    /// use botica_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(-300).non_negative(), Money::zero());
    /// assert_eq!(Money::from_cents(300).non_negative().cents(), 300);
    /// ```
    #[inline]
    pub fn non_negative(self) -> Self {
        Money(self.0.max(0))
    }

    /// Multiplies money by a quantity.
    ///
    /// ```rust
    /// use botica_core::money::Money;
    ///
    /// let line_total = Money::from_cents(299).multiply_quantity(3);
    /// assert_eq!(line_total.cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Returns the amount left after a percentage discount, rounded to the
    /// cent (half away from zero).
    ///
    /// The net amount is rounded directly rather than rounding the discount
    /// and subtracting, so `round2(gross × (1 − pct/100))` holds.
    ///
    /// ```rust
    /// use botica_core::money::Money;
    /// use botica_core::types::Percentage;
    ///
    /// let gross = Money::from_cents(1005);
    /// let net = gross.apply_discount(Percentage::from_percentage(50.0));
    /// assert_eq!(net.cents(), 503); // 5.025 -> 5.03
    /// ```
    pub fn apply_discount(&self, discount: Percentage) -> Money {
        let keep_bps = 10_000_i128 - discount.bps() as i128;
        clamp_i128(div_round(self.0 as i128 * keep_bps, 10_000))
    }

    /// Returns the amount grown by a percentage uplift, rounded to the cent.
    ///
    /// ```rust
    /// use botica_core::money::Money;
    /// use botica_core::types::Percentage;
    ///
    /// let target = Money::from_cents(100_000);
    /// let desired = target.apply_uplift(Percentage::from_percentage(10.0));
    /// assert_eq!(desired.cents(), 110_000);
    /// ```
    pub fn apply_uplift(&self, uplift: Percentage) -> Money {
        let grow_bps = 10_000_i128 + uplift.bps() as i128;
        clamp_i128(div_round(self.0 as i128 * grow_bps, 10_000))
    }

    /// Splits the amount into `parts` equal shares, rounded to the cent.
    /// A non-positive divisor yields the amount unchanged.
    ///
    /// ```rust
    /// use botica_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1000).divide_by(3).cents(), 333);
    /// assert_eq!(Money::from_cents(1000).divide_by(0).cents(), 1000);
    /// ```
    pub fn divide_by(&self, parts: i64) -> Money {
        if parts <= 0 {
            return *self;
        }
        clamp_i128(div_round(self.0 as i128, parts as i128))
    }

    /// Whole-number percentage this amount represents of `whole`, rounded.
    /// Returns 0 when `whole` is not positive.
    ///
    /// ```rust
    /// use botica_core::money::Money;
    ///
    /// let sales = Money::from_cents(2_500);
    /// assert_eq!(sales.percent_of(Money::from_cents(10_000)), 25);
    /// assert_eq!(sales.percent_of(Money::zero()), 0);
    /// ```
    pub fn percent_of(&self, whole: Money) -> i64 {
        if whole.0 <= 0 {
            return 0;
        }
        clamp_i128(div_round(self.0 as i128 * 100, whole.0 as i128)).cents()
    }

    /// Formats as a plain decimal string with two places (`-12.50`).
    /// Used by exports; display formatting belongs to the presentation layer.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

/// Narrows an intermediate result, saturating at the `i64` bounds.
fn clamp_i128(value: i128) -> Money {
    Money(value.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
}

/// Integer division rounding half away from zero.
fn div_round(numerator: i128, denominator: i128) -> i128 {
    if denominator == 0 {
        return 0;
    }
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if remainder.abs() * 2 >= denominator.abs() {
        if (numerator < 0) == (denominator < 0) {
            quotient + 1
        } else {
            quotient - 1
        }
    } else {
        quotient
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

// Addition and subtraction saturate like `multiply_quantity`, so a corrupt
// imported line can distort a total but never overflow it.

/// Debug-oriented display. Use the CLI formatter for user-facing output.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal_string())
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
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
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
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_discount_rounds_net_amount() {
        // 3 x 3.33 = 9.99, 15% off = 8.4915 -> 8.49
        let gross = Money::from_cents(333) * 3;
        let net = gross.apply_discount(Percentage::from_percentage(15.0));
        assert_eq!(net.cents(), 849);

        // 100% discount leaves nothing
        let free = gross.apply_discount(Percentage::from_percentage(100.0));
        assert!(free.is_zero());
    }

    #[test]
    fn test_uplift_rounding() {
        // 999.99 + 12.5% = 1124.98875 -> 1124.99
        let target = Money::from_cents(99_999);
        let desired = target.apply_uplift(Percentage::from_percentage(12.5));
        assert_eq!(desired.cents(), 112_499);
    }

    #[test]
    fn test_divide_by() {
        assert_eq!(Money::from_cents(10_000).divide_by(7).cents(), 1429);
        assert_eq!(Money::from_cents(-1000).divide_by(3).cents(), -333);
        assert_eq!(Money::from_cents(5).divide_by(2).cents(), 3);
        assert_eq!(Money::from_cents(500).divide_by(-1).cents(), 500);
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(Money::from_cents(1000).percent_of(Money::from_cents(1000)), 100);
        assert_eq!(Money::from_cents(1).percent_of(Money::from_cents(3)), 33);
        assert_eq!(Money::from_cents(2).percent_of(Money::from_cents(3)), 67);
        assert_eq!(Money::from_cents(3000).percent_of(Money::from_cents(1000)), 300);
        assert_eq!(Money::from_cents(3000).percent_of(Money::from_cents(-5)), 0);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_negative());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
        assert!(negative.non_negative().is_zero());
    }

    #[test]
    fn test_arithmetic_saturates() {
        let huge = Money::from_cents(i64::MAX);
        assert_eq!((huge + Money::from_cents(1)).cents(), i64::MAX);
        assert_eq!((Money::from_cents(i64::MIN) - Money::from_cents(1)).cents(), i64::MIN);

        let total: Money = [huge, huge, Money::from_cents(5)].iter().sum();
        assert_eq!(total.cents(), i64::MAX);

        let mut running = huge;
        running += huge;
        assert_eq!(running.cents(), i64::MAX);

        let grown = huge.apply_uplift(Percentage::from_percentage(50.0));
        assert_eq!(grown.cents(), i64::MAX);
    }

    /// Splitting a quarter's shortfall into days loses fractions of a cent;
    /// the loss is bounded by half a cent per share.
    #[test]
    fn test_division_precision_loss_documented() {
        let shortfall = Money::from_cents(1000);
        let per_day = shortfall.divide_by(3);
        let reconstructed = per_day * 3;
        assert_eq!(reconstructed.cents(), 999);
        assert_eq!((shortfall - reconstructed).cents(), 1);
    }
}
