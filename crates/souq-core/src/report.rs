//! # Report Summaries
//!
//! Totals printed under invoice and payment lists. Mixed currencies are
//! never added together: each currency gets its own sum, keyed by its
//! symbol (or its id when it has none), in the order first seen.
//!
//! ```text
//! $12,500.00 | IQD1,480,000.00 | 7350.00
//!                                ▲ currency 7 has no symbol
//! ```

use serde::Serialize;

use crate::money::Money;
use crate::types::{Currency, InvoiceRecord, Payment};

/// Total for one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencySum {
    pub key: String,
    pub total: Money,
}

/// Currency sums for one payment type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeSum {
    /// Payment type as stored; empty when unset.
    pub kind: String,
    pub sums: Vec<CurrencySum>,
}

fn currency_key(currency_id: Option<i64>, currencies: &[Currency]) -> String {
    let Some(id) = currency_id else {
        return String::new();
    };
    currencies
        .iter()
        .find(|c| c.id == id)
        .map(Currency::key)
        .unwrap_or_else(|| id.to_string())
}

fn add_to(sums: &mut Vec<CurrencySum>, key: String, amount: Money) {
    match sums.iter_mut().find(|s| s.key == key) {
        Some(sum) => sum.total += amount,
        None => sums.push(CurrencySum { key, total: amount }),
    }
}

/// Per-currency totals of `total_amount`.
pub fn sum_by_currency(invoices: &[InvoiceRecord], currencies: &[Currency]) -> Vec<CurrencySum> {
    let mut sums = Vec::new();
    for invoice in invoices {
        add_to(
            &mut sums,
            currency_key(invoice.currency_id, currencies),
            invoice.total_amount,
        );
    }
    sums
}

/// Per-type, per-currency totals of payment amounts.
pub fn sum_by_type_and_currency(payments: &[Payment], currencies: &[Currency]) -> Vec<TypeSum> {
    let mut by_type: Vec<TypeSum> = Vec::new();
    for payment in payments {
        let kind = payment.kind.clone().unwrap_or_default();
        let key = currency_key(payment.currency_id, currencies);
        let index = match by_type.iter().position(|t| t.kind == kind) {
            Some(index) => index,
            None => {
                by_type.push(TypeSum {
                    kind,
                    sums: Vec::new(),
                });
                by_type.len() - 1
            }
        };
        add_to(&mut by_type[index].sums, key, payment.amount);
    }
    by_type
}

/// One-line rendering used under report tables: `$1,000.00 | IQD500.00`.
pub fn format_sums(sums: &[CurrencySum]) -> String {
    sums.iter()
        .map(|s| s.total.with_symbol(&s.key))
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn currencies() -> Vec<Currency> {
        serde_json::from_value(json!([
            {"id": 1, "name": "Dollar", "symbol": "$"},
            {"id": 2, "name": "Dinar", "symbol": "IQD"},
            {"id": 3, "name": "Lira", "symbol": ""}
        ]))
        .unwrap()
    }

    fn invoice(currency_id: i64, total: &str) -> InvoiceRecord {
        serde_json::from_value(json!({
            "id": 1,
            "currency_id": currency_id,
            "total_amount": total
        }))
        .unwrap()
    }

    #[test]
    fn test_sum_by_currency_first_seen_order() {
        let invoices = [
            invoice(2, "1000"),
            invoice(1, "12.50"),
            invoice(2, "500"),
            invoice(3, "7"),
            invoice(9, "1"),
        ];
        let sums = sum_by_currency(&invoices, &currencies());

        let keys: Vec<&str> = sums.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, ["IQD", "$", "3", "9"]);
        assert_eq!(sums[0].total, Money::from_major(1500));
        assert_eq!(
            format_sums(&sums),
            "IQD1,500.00 | $12.50 | 37.00 | 91.00"
        );
    }

    #[test]
    fn test_sum_by_type_and_currency() {
        let payments: Vec<Payment> = serde_json::from_value(json!([
            {"id": 1, "amount": 100, "currency_id": 1, "type": "cash"},
            {"id": 2, "amount": "50", "currency_id": 2, "type": "cash"},
            {"id": 3, "amount": 25, "currency_id": 1, "type": "bank"},
            {"id": 4, "amount": 10, "currency_id": 1, "type": "cash"}
        ]))
        .unwrap();

        let sums = sum_by_type_and_currency(&payments, &currencies());
        assert_eq!(sums.len(), 2);
        assert_eq!(sums[0].kind, "cash");
        assert_eq!(
            sums[0].sums,
            vec![
                CurrencySum {
                    key: "$".into(),
                    total: Money::from_major(110)
                },
                CurrencySum {
                    key: "IQD".into(),
                    total: Money::from_major(50)
                },
            ]
        );
        assert_eq!(sums[1].sums[0].total, Money::from_major(25));
    }
}
