//! # souq-core: Pure Business Logic for Souq Back Office
//!
//! This crate holds the arithmetic and rules behind buy/sell invoicing as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Souq Back Office Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    souq-cli (thin front end)                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 souq-client (REST backend)                      │   │
//! │  │    repositories, invoice save chain, lookup loading             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ souq-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │  pricing  │  │  totals   │  │ validation│  │   │
//! │  │   │   Money   │  │ LineDraft │  │ Discount  │  │  field    │  │   │
//! │  │   │   Rate    │  │ Lines     │  │ Summary   │  │  errors   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Backend records, `Rate`, `Quantity`, payment/invoice kinds
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Line-item pricing and the line editor
//! - [`discount`] - Percentage/flat discount with the invoice-total cap
//! - [`totals`] - Surcharges, loan and grand total
//! - [`invoice`] - Invoice form state, validation and request payloads
//! - [`reconcile`] - Create/update/delete plan for saving edited invoices
//! - [`report`] - Per-currency and per-type summaries for printed reports
//! - [`validation`] - Field validation and numeric input parsing
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use souq_core::pricing::{line_total, unit_price};
//! use souq_core::{Money, Quantity, Rate};
//!
//! let base_cost = Money::from_major(100);
//! let price = unit_price(base_cost, Rate::from_integer(2), Rate::parse("1.5").unwrap());
//! assert_eq!(price, Money::from_major(300));
//!
//! let total = line_total(Quantity::from_units(3), price);
//! assert_eq!(total, Money::from_major(900));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod discount;
pub mod error;
pub mod invoice;
pub mod money;
pub mod pricing;
pub mod reconcile;
pub mod report;
pub mod totals;
pub mod types;
pub mod validation;

mod wire;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use discount::{Discount, DiscountKind};
pub use error::{CoreError, CoreResult, ValidationError, ValidationErrors};
pub use money::Money;
pub use totals::{Adjustments, InvoiceSummary};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Minor units per major currency unit (cents per dollar, fils per dinar).
pub const MINOR_UNITS: i64 = 100;

/// Fixed-point scale of [`Rate`]: six decimal places.
pub const RATE_SCALE: i64 = 1_000_000;

/// Fixed-point scale of [`Quantity`]: three decimal places.
pub const QUANTITY_SCALE: i64 = 1_000;
