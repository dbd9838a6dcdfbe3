//! # Discount
//!
//! Invoice-level discount: a percentage of the invoice total or a flat
//! amount, never more than the total itself.
//!
//! ```text
//! kind        value   invoice total   result
//! ──────────  ─────   ─────────────   ──────────────────────────
//! Percentage  10      1,000.00        100.00   (total × value / 100, whole units)
//! Flat        150     1,000.00        150.00   (value)
//! Flat        1,500   1,000.00        DiscountExceedsTotal
//! (unset)     any     any             0.00
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::Rate;
use crate::MINOR_UNITS;
use crate::RATE_SCALE;

// =============================================================================
// Discount Kind
// =============================================================================

/// How the discount value is read. The backend stores the Kurdish label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum DiscountKind {
    /// ڕێژە: value is a percentage of the invoice total.
    Percentage,
    /// پارە: value is an amount of money.
    Flat,
}

impl DiscountKind {
    pub const ALL: [DiscountKind; 2] = [DiscountKind::Percentage, DiscountKind::Flat];

    pub const fn label(&self) -> &'static str {
        match self {
            DiscountKind::Percentage => "ڕێژە",
            DiscountKind::Flat => "پارە",
        }
    }

    pub const fn alias(&self) -> &'static str {
        match self {
            DiscountKind::Percentage => "percentage",
            DiscountKind::Flat => "flat",
        }
    }
}

impl fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DiscountKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        DiscountKind::ALL
            .into_iter()
            .find(|k| s == k.label() || s.eq_ignore_ascii_case(k.alias()))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "discount_type".to_string(),
                allowed: DiscountKind::ALL
                    .iter()
                    .map(|k| k.label().to_string())
                    .collect(),
            })
    }
}

impl TryFrom<String> for DiscountKind {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DiscountKind> for &'static str {
    fn from(value: DiscountKind) -> Self {
        value.label()
    }
}

// =============================================================================
// Discount Calculation
// =============================================================================

/// Discount amount for an invoice total.
///
/// Returns zero when the kind, the value or the total is missing or zero.
///
/// ## Example
/// ```rust
/// use souq_core::discount::discount_result;
/// use souq_core::{DiscountKind, Money, Rate};
///
/// let total = Money::from_major(1000);
/// let pct = discount_result(Some(DiscountKind::Percentage), Some(Rate::from_integer(10)), total);
/// let flat = discount_result(Some(DiscountKind::Flat), Some(Rate::from_integer(150)), total);
/// assert_eq!(pct, Money::from_major(100));
/// assert_eq!(flat, Money::from_major(150));
/// ```
pub fn discount_result(kind: Option<DiscountKind>, value: Option<Rate>, invoice_total: Money) -> Money {
    let (Some(kind), Some(value)) = (kind, value) else {
        return Money::zero();
    };
    if value.is_zero() || invoice_total.is_zero() {
        return Money::zero();
    }
    match kind {
        DiscountKind::Percentage => invoice_total.percentage(value),
        DiscountKind::Flat => value.to_money(),
    }
}

/// Discount settings entered on an invoice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Discount {
    pub kind: Option<DiscountKind>,
    pub value: Option<Rate>,
}

impl Discount {
    pub const fn none() -> Self {
        Discount {
            kind: None,
            value: None,
        }
    }

    pub const fn percentage(pct: Rate) -> Self {
        Discount {
            kind: Some(DiscountKind::Percentage),
            value: Some(pct),
        }
    }

    /// Flat discount of `amount`.
    pub const fn flat(amount: Money) -> Self {
        Discount {
            kind: Some(DiscountKind::Flat),
            value: Some(Rate::from_micros(amount.cents().saturating_mul(RATE_SCALE / MINOR_UNITS))),
        }
    }

    pub fn is_set(&self) -> bool {
        self.kind.is_some() && self.value.is_some_and(|v| !v.is_zero())
    }

    /// Discount amount against `invoice_total`, uncapped.
    pub fn result(&self, invoice_total: Money) -> Money {
        discount_result(self.kind, self.value, invoice_total)
    }

    /// Discount amount, rejected when it exceeds `invoice_total`.
    ///
    /// ## Example
    /// ```rust
    /// use souq_core::{CoreError, Discount, Money};
    ///
    /// let discount = Discount::flat(Money::from_major(1500));
    /// let err = discount.validate(Money::from_major(1000)).unwrap_err();
    /// assert!(matches!(err, CoreError::DiscountExceedsTotal { .. }));
    /// ```
    pub fn validate(&self, invoice_total: Money) -> CoreResult<Money> {
        let discount = self.result(invoice_total);
        if discount > invoice_total {
            return Err(CoreError::DiscountExceedsTotal {
                discount,
                total: invoice_total,
            });
        }
        Ok(discount)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
