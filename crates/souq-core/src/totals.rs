//! # Invoice Totals
//!
//! Surcharges, discount and carried-forward loan on top of the line total.
//!
//! ```text
//!   invoice total      Σ line totals
//! + transport          surcharge
//! + labor              surcharge
//! − discount           see `discount`
//! + loan               Sell only: balance carried forward
//! ─────────────────
//! = grand total
//! ```

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{InvoiceKind, InvoiceRecord};

/// Amounts applied on top of the invoice total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Adjustments {
    pub transport: Money,
    pub labor: Money,
    pub discount: Money,
    pub loan: Money,
}

/// Grand total for an invoice total and its adjustments.
///
/// ## Example
/// ```rust
/// use souq_core::totals::grand_total;
/// use souq_core::{Adjustments, InvoiceKind, Money};
///
/// let adjustments = Adjustments {
///     transport: Money::from_major(50),
///     labor: Money::from_major(25),
///     discount: Money::from_major(100),
///     loan: Money::from_major(200),
/// };
/// let total = Money::from_major(1000);
/// assert_eq!(grand_total(total, &adjustments, InvoiceKind::Sell), Money::from_major(1175));
/// assert_eq!(grand_total(total, &adjustments, InvoiceKind::Buy), Money::from_major(975));
/// ```
pub fn grand_total(invoice_total: Money, adjustments: &Adjustments, kind: InvoiceKind) -> Money {
    let loan = if kind.includes_loan() {
        adjustments.loan
    } else {
        Money::zero()
    };
    invoice_total + adjustments.transport + adjustments.labor - adjustments.discount + loan
}

/// Every figure shown in an invoice's totals block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InvoiceSummary {
    pub kind: InvoiceKind,
    pub invoice_total: Money,
    pub transport: Money,
    pub labor: Money,
    pub discount: Money,
    /// Zero for kinds that do not carry a loan.
    pub loan: Money,
    pub after_discount: Money,
    pub grand_total: Money,
}

impl InvoiceSummary {
    pub fn compute(invoice_total: Money, adjustments: Adjustments, kind: InvoiceKind) -> Self {
        InvoiceSummary {
            kind,
            invoice_total,
            transport: adjustments.transport,
            labor: adjustments.labor,
            discount: adjustments.discount,
            loan: if kind.includes_loan() {
                adjustments.loan
            } else {
                Money::zero()
            },
            after_discount: invoice_total - adjustments.discount,
            grand_total: grand_total(invoice_total, &adjustments, kind),
        }
    }

    /// Like [`compute`](Self::compute), but rejects a discount larger than
    /// the invoice total for kinds that carry one.
    ///
    /// ## Example
    /// ```rust
    /// use souq_core::{Adjustments, CoreError, InvoiceKind, InvoiceSummary, Money};
    ///
    /// let adjustments = Adjustments { discount: Money::from_major(500), ..Adjustments::default() };
    /// let err = InvoiceSummary::checked(Money::from_major(100), adjustments, InvoiceKind::Sell).unwrap_err();
    /// assert!(matches!(err, CoreError::DiscountExceedsTotal { .. }));
    /// ```
    pub fn checked(invoice_total: Money, adjustments: Adjustments, kind: InvoiceKind) -> CoreResult<Self> {
        if kind.has_adjustments() && adjustments.discount > invoice_total {
            return Err(CoreError::DiscountExceedsTotal {
                discount: adjustments.discount,
                total: invoice_total,
            });
        }
        Ok(InvoiceSummary::compute(invoice_total, adjustments, kind))
    }

    /// Summary of a stored invoice, for printing.
    pub fn from_record(record: &InvoiceRecord, kind: InvoiceKind) -> Self {
        let adjustments = Adjustments {
            transport: record.amount_transport,
            labor: record.amount_labor,
            discount: record.discount_result,
            loan: record.loan,
        };
        InvoiceSummary::compute(record.total_amount, adjustments, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn adjustments() -> Adjustments {
        Adjustments {
            transport: Money::from_major(40),
            labor: Money::from_major(60),
            discount: Money::from_major(100),
            loan: Money::from_major(500),
        }
    }

    #[test]
    fn test_sell_includes_loan() {
        let summary = InvoiceSummary::compute(Money::from_major(1000), adjustments(), InvoiceKind::Sell);
        assert_eq!(summary.after_discount, Money::from_major(900));
        assert_eq!(summary.grand_total, Money::from_major(1500));
    }

    #[test]
    fn test_buy_kinds_omit_loan() {
        for kind in [InvoiceKind::Buy, InvoiceKind::BuyReturn] {
            let summary = InvoiceSummary::compute(Money::from_major(1000), adjustments(), kind);
            assert_eq!(summary.loan, Money::zero());
            assert_eq!(summary.grand_total, Money::from_major(1000));
        }
    }

    #[test]
    fn test_checked_rejects_discount_over_total() {
        let adj = Adjustments {
            discount: Money::from_major(500),
            ..Adjustments::default()
        };
        match InvoiceSummary::checked(Money::from_major(100), adj, InvoiceKind::Sell) {
            Err(CoreError::DiscountExceedsTotal { discount, total }) => {
                assert_eq!(discount, Money::from_major(500));
                assert_eq!(total, Money::from_major(100));
            }
            other => panic!("expected DiscountExceedsTotal, got {other:?}"),
        }

        let at_total = Adjustments {
            discount: Money::from_major(100),
            ..Adjustments::default()
        };
        let summary = InvoiceSummary::checked(Money::from_major(100), at_total, InvoiceKind::Sell).unwrap();
        assert_eq!(summary.grand_total, Money::zero());

        // buy kinds ignore the discount entirely
        assert!(InvoiceSummary::checked(Money::from_major(100), adj, InvoiceKind::Buy).is_ok());
    }

    #[test]
    fn test_grand_total_is_order_independent() {
        let lines = [
            Money::from_cents(33_333),
            Money::from_cents(1),
            Money::from_cents(99_999),
        ];
        let forward: Money = lines.iter().sum();
        let backward: Money = lines.iter().rev().sum();
        let adj = adjustments();

        assert_eq!(
            grand_total(forward, &adj, InvoiceKind::Sell),
            grand_total(backward, &adj, InvoiceKind::Sell)
        );
        assert_eq!(
            grand_total(forward, &adj, InvoiceKind::Sell),
            forward + adj.loan - adj.discount + adj.labor + adj.transport
        );
    }

    #[test]
    fn test_from_record() {
        let record: InvoiceRecord = serde_json::from_value(json!({
            "id": 1,
            "total_amount": "1000",
            "amount_transport": 50,
            "amount_labor": "",
            "discount_result": "100",
            "loan": 250
        }))
        .unwrap();
        let summary = InvoiceSummary::from_record(&record, InvoiceKind::Sell);
        assert_eq!(summary.grand_total, Money::from_major(1200));
    }
}
