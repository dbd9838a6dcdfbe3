//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely, plus the
//! fixed-point helpers shared by [`Rate`] and [`Quantity`].
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  An invoice re-priced after every currency change accumulates that     │
//! │  error on every line.                                                   │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    Money  = i64 cents                                                   │
//! │    Rate   = i64 millionths   (exchange rate, unit factor, percentage)   │
//! │    Qty    = i64 thousandths                                             │
//! │    Every product is rounded ONCE, half away from zero.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use souq_core::money::Money;
//!
//! let price = Money::from_cents(1099);
//! let doubled = price * 2;
//! let total = price + Money::from_cents(500);
//! assert_eq!(doubled.cents(), 2198);
//! assert_eq!(total.to_string(), "15.99");
//! ```

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use crate::types::{Quantity, Rate};
use crate::{MINOR_UNITS, QUANTITY_SCALE, RATE_SCALE};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents, fils).
///
/// ## Design Decisions
/// - **i64 (signed)**: negative values appear for refunds and adjustments
/// - **Currency-agnostic**: the invoice carries the currency id; a symbol is
///   only attached when formatting
/// - **Wire form**: the backend speaks major-unit decimals (`"900.00"`), so
///   serde converts at the boundary (see `wire`)
///
/// ## Where Money Flows
/// ```text
/// Item.cost ──► × unit factor × exchange rate ──► line unit price
///                                                   │
///                                          × quantity ▼
///                                               line total ──► Σ invoice total
///                                                                  │
///                      + transport + labor − discount (+ loan) ────┘
///                                                                  ▼
///                                                             grand total
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use souq_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole major units.
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * MINOR_UNITS)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    /// `from_major_minor(-5, 50)` = -5.50, not -4.50
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * MINOR_UNITS - minor)
        } else {
            Money(major * MINOR_UNITS + minor)
        }
    }

    /// Parses a user or backend decimal string (`"1,250.5"`, `"-3"`).
    ///
    /// Thousands separators are ignored; digits past the second decimal are
    /// rounded half away from zero. Returns `None` for empty or malformed
    /// input.
    ///
    /// ## Example
    /// ```rust
    /// use souq_core::money::Money;
    ///
    /// assert_eq!(Money::parse("1,250.5"), Some(Money::from_cents(125050)));
    /// assert_eq!(Money::parse("abc"), None);
    /// ```
    pub fn parse(input: &str) -> Option<Money> {
        parse_fixed(input, 2).map(Money)
    }

    /// Converts a major-unit float from JSON, rounding to the nearest cent.
    pub fn from_major_f64(value: f64) -> Money {
        Money((value * MINOR_UNITS as f64).round() as i64)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole major unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / MINOR_UNITS
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % MINOR_UNITS).abs()
    }

    /// Major-unit float for JSON bodies.
    pub fn to_major_f64(&self) -> f64 {
        self.0 as f64 / MINOR_UNITS as f64
    }

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

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.saturating_abs())
    }

    /// Multiplies by a fixed-point rate (exchange rate, unit factor).
    ///
    /// ## Example
    /// ```rust
    /// use souq_core::{Money, Rate};
    ///
    /// let cost = Money::from_major(100);
    /// assert_eq!(cost.scale(Rate::parse("1.5").unwrap()), Money::from_major(150));
    /// ```
    pub fn scale(&self, rate: Rate) -> Money {
        let scaled = div_round(self.0 as i128 * rate.micros() as i128, RATE_SCALE as i128);
        Money(saturate(scaled))
    }

    /// Returns `pct` percent of this amount (`pct` = 10 means 10%), rounded
    /// half away from zero to a whole major unit.
    ///
    /// ## Example
    /// ```rust
    /// use souq_core::{Money, Rate};
    ///
    /// let total = Money::from_major(1000);
    /// assert_eq!(total.percentage(Rate::from_integer(10)), Money::from_major(100));
    /// assert_eq!(Money::from_major(1003).percentage(Rate::from_integer(15)), Money::from_major(150));
    /// ```
    pub fn percentage(&self, pct: Rate) -> Money {
        let whole = div_round(
            self.0 as i128 * pct.micros() as i128,
            100 * RATE_SCALE as i128 * MINOR_UNITS as i128,
        );
        Money(saturate(whole * MINOR_UNITS as i128))
    }

    /// Multiplies a unit price by a (possibly fractional) quantity.
    ///
    /// ## Example
    /// ```rust
    /// use souq_core::{Money, Quantity};
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(Quantity::from_units(3)).cents(), 897);
    /// ```
    pub fn multiply_quantity(&self, qty: Quantity) -> Money {
        let product = div_round(
            self.0 as i128 * qty.millis() as i128,
            QUANTITY_SCALE as i128,
        );
        Money(saturate(product))
    }

    /// Two-decimal amount with thousands separators (`1,234.50`).
    pub fn format_with_commas(&self) -> String {
        format_fixed(self.0, 2, 2, true)
    }

    /// Formatted amount prefixed with a currency symbol (`$1,234.50`).
    pub fn with_symbol(&self, symbol: &str) -> String {
        format!("{}{}", symbol, self.format_with_commas())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with_commas())
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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(self.0.saturating_neg())
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
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
// Fixed-Point Helpers
// =============================================================================

/// Integer division rounding half away from zero. `denominator` must be > 0.
pub(crate) fn div_round(numerator: i128, denominator: i128) -> i128 {
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    }
}

/// Clamps an i128 intermediate back into i64.
pub(crate) fn saturate(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

/// Parses a decimal string into a fixed-point integer with `decimals` places.
///
/// Accepts an optional leading sign, thousands separators and surrounding
/// whitespace. Extra fractional digits are rounded half away from zero.
pub(crate) fn parse_fixed(input: &str, decimals: u32) -> Option<i64> {
    let cleaned: String = input
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    let (negative, unsigned) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };

    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, f),
        None => (unsigned, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    let scale = 10_i128.pow(decimals);
    let mut value: i128 = 0;
    for digit in int_part.bytes() {
        value = value.checked_mul(10)?.checked_add((digit - b'0') as i128)?;
    }
    value = value.checked_mul(scale)?;

    let mut frac_value: i128 = 0;
    let mut frac_digits = frac_part.bytes();
    for _ in 0..decimals {
        let digit = frac_digits.next().map(|d| (d - b'0') as i128).unwrap_or(0);
        frac_value = frac_value * 10 + digit;
    }
    if let Some(next) = frac_digits.next() {
        if next >= b'5' {
            frac_value += 1;
        }
    }

    let magnitude = value.checked_add(frac_value)?;
    let signed = if negative { -magnitude } else { magnitude };
    i64::try_from(signed).ok()
}

/// Renders a fixed-point integer.
///
/// Trailing fractional zeros are trimmed down to `min_frac` digits.
pub(crate) fn format_fixed(value: i64, decimals: u32, min_frac: usize, group: bool) -> String {
    let scale = 10_i128.pow(decimals);
    let raw = value as i128;
    let magnitude = raw.abs();

    let int_digits = (magnitude / scale).to_string();
    let int_str = if group {
        group_thousands(&int_digits)
    } else {
        int_digits
    };

    let mut frac_str = format!("{:0width$}", magnitude % scale, width = decimals as usize);
    while frac_str.len() > min_frac && frac_str.ends_with('0') {
        frac_str.pop();
    }

    let mut out = String::with_capacity(int_str.len() + frac_str.len() + 2);
    if raw < 0 {
        out.push('-');
    }
    out.push_str(&int_str);
    if !frac_str.is_empty() {
        out.push('.');
        out.push_str(&frac_str);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// =============================================================================
// Unit Tests
// =============================================================================
