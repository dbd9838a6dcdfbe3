//! # Error Types
//!
//! Domain-specific error types for souq-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  souq-core errors (this file)                                          │
//! │  ├── CoreError         - General domain errors                         │
//! │  ├── ValidationError   - One field failed validation                   │
//! │  └── ValidationErrors  - Field → error map shown inline on a form      │
//! │                                                                         │
//! │  souq-client errors (separate crate)                                   │
//! │  └── ClientError       - Network / backend failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → ValidationErrors → CoreError → ClientError    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No invoice line with this local row id.
    #[error("Invoice line not found: {0}")]
    LineNotFound(Uuid),

    /// Discount is larger than the invoice total it applies to.
    ///
    /// ## User Workflow
    /// ```text
    /// Invoice total: 1,000.00
    ///      │
    ///      ▼
    /// Discount: flat 1,500.00
    ///      │
    ///      ▼
    /// DiscountExceedsTotal → save button disabled, helper text shown
    /// ```
    #[error("Discount {discount} cannot be greater than the invoice total {total}")]
    DiscountExceedsTotal { discount: Money, total: Money },

    /// One or more form fields failed validation.
    #[error("Invalid input: {0}")]
    InvalidFields(ValidationErrors),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl From<ValidationErrors> for CoreError {
    fn from(errors: ValidationErrors) -> Self {
        CoreError::InvalidFields(errors)
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when user input doesn't meet requirements and are shown as
/// inline helper text next to the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. letters in an amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Value is larger than the limit it is bound by.
    #[error("{field} cannot be greater than {limit}")]
    Exceeds { field: String, limit: String },
}

impl ValidationError {
    /// Creates a Required error for a field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Returns the name of the field this error belongs to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. }
            | ValidationError::Exceeds { field, .. } => field,
        }
    }
}

// =============================================================================
// Validation Errors (per-field map)
// =============================================================================

/// Field-level validation errors for a whole form.
///
/// Only the first error per field is kept, matching how a form shows one
/// helper text per input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<String, ValidationError>,
}

impl ValidationErrors {
    /// Creates an empty error set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error under its own field name.
    pub fn push(&mut self, error: ValidationError) {
        self.errors
            .entry(error.field().to_string())
            .or_insert(error);
    }

    /// Records the error of a failed check, if any.
    pub fn check<T>(&mut self, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.push(e);
                None
            }
        }
    }

    /// Returns the error for a field, if any.
    pub fn get(&self, field: &str) -> Option<&ValidationError> {
        self.errors.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterates `(field, error)` pairs in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValidationError)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// `Ok(())` when no errors were recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in self.errors.values() {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}", error)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::DiscountExceedsTotal {
            discount: Money::from_major(1500),
            total: Money::from_major(1000),
        };
        assert_eq!(
            err.to_string(),
            "Discount 1,500.00 cannot be greater than the invoice total 1,000.00"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("quantity");
        assert_eq!(err.to_string(), "quantity is required");
        assert_eq!(err.field(), "quantity");
    }

    #[test]
    fn test_validation_errors_keep_first_per_field() {
        let mut errors = ValidationErrors::new();
        errors.push(ValidationError::required("unit_price"));
        errors.push(ValidationError::MustBePositive {
            field: "unit_price".to_string(),
        });
        errors.push(ValidationError::required("item_id"));

        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.get("unit_price"),
            Some(&ValidationError::required("unit_price"))
        );
        assert_eq!(
            errors.to_string(),
            "item_id is required; unit_price is required"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("item_id").into();
        assert!(matches!(core_err, CoreError::Validation(_)));

        let mut errors = ValidationErrors::new();
        errors.push(ValidationError::required("item_id"));
        let core_err: CoreError = errors.into();
        assert!(matches!(core_err, CoreError::InvalidFields(_)));
    }
}
