//! # Money & Weight Module
//!
//! Provides the `Money` and `Weight` types for handling monetary values and
//! gold weights safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                         │
//! │                                                                     │
//! │  In floating point:                                                 │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                       │
//! │                                                                     │
//! │  A debt paid down in installments must reach EXACTLY 0.00,          │
//! │  and an account balance must match its movement history to the      │
//! │  cent. Drift is not an option.                                      │
//! │                                                                     │
//! │  OUR SOLUTION: Integer Minor Units                                  │
//! │    Money  = i64 cents       (2 decimal places)                      │
//! │    Weight = i64 milligrams  (3 decimal places of a gram)            │
//! │                                                                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Parsing from decimal strings rejects excess precision: a payment of
//! `"10.005"` is a validation error, never silently rounded.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents (the smallest currency unit).
///
/// Every monetary value in the system flows through this type: order
/// totals, debt balances, installment amounts, account balances, movement
/// amounts, and close snapshots.
///
/// ## Example
/// ```rust
/// use aurum_core::money::Money;
///
/// let price = Money::from_cents(1099); // $10.99
/// let total = price + Money::from_cents(500);
/// assert_eq!(total.cents(), 1599);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Parses a decimal string like `"300.00"` into Money.
    ///
    /// ## Rules
    /// - At most 2 fractional digits; `"10.005"` is rejected, never rounded
    /// - Optional leading `-`
    /// - No thousands separators, currency symbols, or exponents
    ///
    /// ## Example
    /// ```rust
    /// use aurum_core::money::Money;
    ///
    /// assert_eq!(Money::parse("300.00").unwrap().cents(), 30000);
    /// assert_eq!(Money::parse("0.5").unwrap().cents(), 50);
    /// assert!(Money::parse("10.005").is_err());
    /// assert!(Money::parse("12a").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        parse_fixed_point(input, "amount", 2).map(Money)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Subtracts, flooring the result at zero.
    ///
    /// Used for paying down debt balances: `pending_amount` never goes
    /// negative no matter what the caller hands us.
    ///
    /// ## Example
    /// ```rust
    /// use aurum_core::money::Money;
    ///
    /// let pending = Money::from_cents(5000);
    /// assert_eq!(pending.saturating_sub(Money::from_cents(7000)), Money::zero());
    /// ```
    #[inline]
    pub fn saturating_sub(self, other: Self) -> Self {
        Money((self.0 - other.0).max(0))
    }
}

/// Display implementation shows money in a human-readable format.
/// For debugging and log output, not client display.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
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

// =============================================================================
// Weight Type
// =============================================================================

/// A gold weight in milligrams (3 decimal places of a gram).
///
/// Item weights and per-gram sale margins use this type so that subtotal
/// arithmetic stays in exact integer math end to end.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct Weight(i64);

impl Weight {
    /// Creates a Weight from milligrams.
    #[inline]
    pub const fn from_milligrams(mg: i64) -> Self {
        Weight(mg)
    }

    /// Parses a decimal gram string like `"4.5"` into a Weight.
    ///
    /// At most 3 fractional digits (milligram precision).
    ///
    /// ## Example
    /// ```rust
    /// use aurum_core::money::Weight;
    ///
    /// assert_eq!(Weight::parse("4.5").unwrap().milligrams(), 4500);
    /// assert!(Weight::parse("4.0001").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        parse_fixed_point(input, "weight", 3).map(Weight)
    }

    /// Returns the value in milligrams.
    #[inline]
    pub const fn milligrams(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Weight(0)
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:03}g", sign, (self.0 / 1000).abs(), (self.0 % 1000).abs())
    }
}

/// Margin grams are added on top of the item weight for sale pricing.
impl Add for Weight {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Weight(self.0 + other.0)
    }
}

// =============================================================================
// Line Subtotal Arithmetic
// =============================================================================

/// Computes `weight × price_per_gram × quantity` as Money.
///
/// ## Implementation
/// Pure integer math in i128 to prevent overflow, with half-up rounding
/// back to the cent: `(mg × cents × qty + 500) / 1000`.
///
/// ## Example
/// ```rust
/// use aurum_core::money::{line_subtotal, Money, Weight};
///
/// // 4.500g at $20.00/g × 2 = $180.00
/// let subtotal = line_subtotal(Weight::from_milligrams(4500), Money::from_cents(2000), 2);
/// assert_eq!(subtotal, Money::from_cents(18000));
/// ```
pub fn line_subtotal(weight: Weight, price_per_gram: Money, quantity: i64) -> Money {
    let raw = weight.milligrams() as i128 * price_per_gram.cents() as i128 * quantity as i128;
    Money::from_cents(((raw + 500) / 1000) as i64)
}

// =============================================================================
// Fixed-Point Parsing
// =============================================================================

/// Parses a plain decimal string into integer minor units.
///
/// Rejects anything with more than `max_places` fractional digits rather
/// than rounding; the caller entered a value the system cannot represent
/// exactly, and that is their error to fix.
fn parse_fixed_point(input: &str, field: &str, max_places: u32) -> Result<i64, ValidationError> {
    let s = input.trim();
    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };

    let invalid = || ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a plain decimal number".to_string(),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if frac.len() as u32 > max_places {
        return Err(ValidationError::TooPrecise {
            field: field.to_string(),
            max_places,
        });
    }

    let out_of_range = || ValidationError::OutOfRange {
        field: field.to_string(),
        min: i64::MIN,
        max: i64::MAX,
    };

    let scale = 10i64.pow(max_places);
    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| out_of_range())?
    };
    let frac_units: i64 = if frac.is_empty() {
        0
    } else {
        let parsed: i64 = frac.parse().map_err(|_| invalid())?;
        parsed * 10i64.pow(max_places - frac.len() as u32)
    };

    let units = whole
        .checked_mul(scale)
        .and_then(|scaled| scaled.checked_add(frac_units))
        .ok_or_else(out_of_range)?;
    Ok(if negative { -units } else { units })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_money() {
        assert_eq!(Money::parse("300.00").unwrap().cents(), 30000);
        assert_eq!(Money::parse("300").unwrap().cents(), 30000);
        assert_eq!(Money::parse("0.5").unwrap().cents(), 50);
        assert_eq!(Money::parse(".99").unwrap().cents(), 99);
        assert_eq!(Money::parse("-5.25").unwrap().cents(), -525);
    }

    #[test]
    fn test_parse_money_rejects_excess_precision() {
        let err = Money::parse("10.005").unwrap_err();
        assert!(matches!(err, ValidationError::TooPrecise { .. }));
    }

    #[test]
    fn test_parse_money_rejects_garbage() {
        assert!(Money::parse("").is_err());
        assert!(Money::parse(".").is_err());
        assert!(Money::parse("12a").is_err());
        assert!(Money::parse("1,000.00").is_err());
        assert!(Money::parse("1e3").is_err());
    }

    #[test]
    fn test_parse_money_rejects_overflow() {
        // i64::MAX in whole currency units overflows the cents
        // representation; it must come back as a range error, not wrap.
        let err = Money::parse("9223372036854775807").unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));

        // More digits than i64 itself can hold.
        let err = Money::parse("99999999999999999999").unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));

        // The largest parseable value still round-trips.
        assert_eq!(
            Money::parse("92233720368547758.07").unwrap().cents(),
            i64::MAX
        );
    }

    #[test]
    fn test_parse_weight() {
        assert_eq!(Weight::parse("4.5").unwrap().milligrams(), 4500);
        assert_eq!(Weight::parse("0.001").unwrap().milligrams(), 1);
        assert!(Weight::parse("4.0001").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::zero()), "$0.00");
        assert_eq!(format!("{}", Weight::from_milligrams(4500)), "4.500g");
        assert_eq!(format!("{}", Weight::from_milligrams(-500)), "-0.500g");
        assert_eq!(format!("{}", Weight::from_milligrams(-4500)), "-4.500g");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(400);

        assert_eq!((a + b).cents(), 1400);
        assert_eq!((a - b).cents(), 600);

        let mut c = a;
        c += b;
        assert_eq!(c.cents(), 1400);
        c -= a;
        assert_eq!(c.cents(), 400);
    }

    #[test]
    fn test_saturating_sub_floors_at_zero() {
        let pending = Money::from_cents(5000);
        assert_eq!(pending.saturating_sub(Money::from_cents(2000)).cents(), 3000);
        assert_eq!(pending.saturating_sub(Money::from_cents(5000)).cents(), 0);
        assert_eq!(pending.saturating_sub(Money::from_cents(9000)).cents(), 0);
    }

    #[test]
    fn test_line_subtotal_exact() {
        // 4.500g at $20.00/g × 2 = $180.00 exactly
        let subtotal = line_subtotal(Weight::from_milligrams(4500), Money::from_cents(2000), 2);
        assert_eq!(subtotal.cents(), 18000);
    }

    #[test]
    fn test_line_subtotal_rounds_half_up() {
        // 4.601g × $10.99/g = 5056.499 cents → $50.56
        let subtotal = line_subtotal(Weight::from_milligrams(4601), Money::from_cents(1099), 1);
        assert_eq!(subtotal.cents(), 5056);

        // 0.500g × $0.01/g = 0.5 cents → rounds up to 1 cent
        let subtotal = line_subtotal(Weight::from_milligrams(500), Money::from_cents(1), 1);
        assert_eq!(subtotal.cents(), 1);
    }

    #[test]
    fn test_line_subtotal_with_margin() {
        // (4.000g + 0.100g margin) × $20.00/g × 3 = $246.00
        let weight = Weight::from_milligrams(4000) + Weight::from_milligrams(100);
        let subtotal = line_subtotal(weight, Money::from_cents(2000), 3);
        assert_eq!(subtotal.cents(), 24600);
    }
}
