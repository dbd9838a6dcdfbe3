//! # Validation Module
//!
//! Field validation and numeric input parsing for the invoice screens.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Keystroke filter                                             │
//! │  ├── discount value accepts [0-9.]                                     │
//! │  └── transport / labor accept [0-9+-]                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── thousands separators stripped, blank → absent                     │
//! │  └── required / positive checks, one error per field                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend                                                      │
//! │  └── foreign keys, uniqueness                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use souq_core::validation::{parse_quantity, validate_quantity};
//!
//! let qty = parse_quantity("1,200").unwrap();
//! assert!(validate_quantity(qty).is_ok());
//! assert!(validate_quantity(None).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Quantity, Rate};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Input Parsing
// =============================================================================

/// Removes thousands separators and surrounding whitespace.
pub fn strip_separators(input: &str) -> String {
    input.trim().replace(',', "")
}

/// Reads a stored form amount, treating blank or malformed input as zero.
///
/// ## Example
/// ```rust
/// use souq_core::validation::clean_number;
/// use souq_core::Money;
///
/// assert_eq!(clean_number("1,500"), Money::from_major(1500));
/// assert_eq!(clean_number(""), Money::zero());
/// ```
pub fn clean_number(input: &str) -> Money {
    Money::parse(&strip_separators(input)).unwrap_or_default()
}

/// Parses a transport or labor amount.
///
/// Only digits and sign characters are accepted. Blank input is `None`.
pub fn parse_amount_input(field: &str, input: &str) -> ValidationResult<Option<Money>> {
    let raw = strip_separators(input);
    if raw.is_empty() {
        return Ok(None);
    }
    if !raw.chars().all(|c| c.is_ascii_digit() || c == '+' || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "only digits and +/- are allowed".to_string(),
        });
    }
    Money::parse(&raw)
        .map(Some)
        .ok_or_else(|| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "not a number".to_string(),
        })
}

/// Parses a discount value (percentage or flat amount).
///
/// ## Example
/// ```rust
/// use souq_core::validation::parse_discount_value;
/// use souq_core::Rate;
///
/// assert_eq!(parse_discount_value("12.5").unwrap(), Some(Rate::parse("12.5").unwrap()));
/// assert!(parse_discount_value("-3").is_err());
/// ```
pub fn parse_discount_value(input: &str) -> ValidationResult<Option<Rate>> {
    let raw = strip_separators(input);
    if raw.is_empty() {
        return Ok(None);
    }
    let invalid = || ValidationError::InvalidFormat {
        field: "discount_value".to_string(),
        reason: "only digits and a decimal point are allowed".to_string(),
    };
    if !raw.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(invalid());
    }
    Rate::parse(&raw).map(Some).ok_or_else(invalid)
}

/// Parses a line quantity; blank is `None`.
pub fn parse_quantity(input: &str) -> ValidationResult<Option<Quantity>> {
    let raw = strip_separators(input);
    if raw.is_empty() {
        return Ok(None);
    }
    Quantity::parse(&raw)
        .map(Some)
        .ok_or_else(|| ValidationError::InvalidFormat {
            field: "quantity".to_string(),
            reason: "not a number".to_string(),
        })
}

/// Parses a manually entered unit price; blank is `None`.
pub fn parse_price(input: &str) -> ValidationResult<Option<Money>> {
    let raw = strip_separators(input);
    if raw.is_empty() {
        return Ok(None);
    }
    Money::parse(&raw)
        .map(Some)
        .ok_or_else(|| ValidationError::InvalidFormat {
            field: "unit_price".to_string(),
            reason: "not a number".to_string(),
        })
}

// =============================================================================
// Field Validators
// =============================================================================

/// Requires a selected record id. Zero counts as "nothing selected".
///
/// ## Example
/// ```rust
/// use souq_core::validation::validate_id;
///
/// assert_eq!(validate_id("branch_id", Some(4)), Ok(4));
/// assert!(validate_id("branch_id", Some(0)).is_err());
/// assert!(validate_id("branch_id", None).is_err());
/// ```
pub fn validate_id(field: &str, id: Option<i64>) -> ValidationResult<i64> {
    match id {
        Some(id) if id != 0 => Ok(id),
        _ => Err(ValidationError::required(field)),
    }
}

/// Requires a non-blank text value.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

/// Requires a non-zero, positive quantity.
pub fn validate_quantity(quantity: Option<Quantity>) -> ValidationResult<Quantity> {
    match quantity {
        None => Err(ValidationError::required("quantity")),
        Some(q) if q.is_zero() => Err(ValidationError::required("quantity")),
        Some(q) if !q.is_positive() => Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }),
        Some(q) => Ok(q),
    }
}

/// Requires a non-zero, non-negative unit price.
pub fn validate_unit_price(price: Option<Money>) -> ValidationResult<Money> {
    match price {
        None => Err(ValidationError::required("unit_price")),
        Some(p) if p.is_zero() => Err(ValidationError::required("unit_price")),
        Some(p) if p.is_negative() => Err(ValidationError::MustBePositive {
            field: "unit_price".to_string(),
        }),
        Some(p) => Ok(p),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
