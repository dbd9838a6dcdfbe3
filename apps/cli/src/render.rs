//! Plain-text rendering of invoices, lists and summaries.

use std::fmt::Write;

use souq_core::pricing::{InvoiceLines, UnitCatalog, UnitQuantity};
use souq_core::report::{format_sums, CurrencySum, TypeSum};
use souq_core::{Driver, InvoiceRecord, InvoiceSummary, Money};

/// Totals block under an invoice.
///
/// Transport/labor only appear for kinds that carry them, loan only for
/// kinds that add it to the grand total.
pub fn summary(summary: &InvoiceSummary) -> String {
    let mut rows: Vec<(&str, Money)> = vec![("Total", summary.invoice_total)];
    if summary.kind.has_adjustments() {
        rows.push(("Transport", summary.transport));
        rows.push(("Labor", summary.labor));
        rows.push(("Discount", summary.discount));
        rows.push(("After discount", summary.after_discount));
    }
    if summary.kind.includes_loan() {
        rows.push(("Loan", summary.loan));
    }
    rows.push(("Grand total", summary.grand_total));

    let mut out = String::new();
    for (label, amount) in rows {
        let _ = writeln!(out, "{:<16}{:>18}", label, amount.format_with_commas());
    }
    out
}

pub fn lines(lines: &InvoiceLines, catalog: &UnitCatalog) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<4}{:<28}{:<12}{:>10}{:>16}{:>18}",
        "#", "Item", "Unit", "Qty", "Unit price", "Total"
    );
    for (index, row) in lines.iter().enumerate() {
        let line = &row.line;
        let name = line
            .item_name
            .clone()
            .unwrap_or_else(|| format!("item {}", line.item_id));
        let unit = catalog
            .name_of(line.unit_id)
            .map(str::to_string)
            .unwrap_or_else(|| line.unit_id.to_string());
        let _ = writeln!(
            out,
            "{:<4}{:<28}{:<12}{:>10}{:>16}{:>18}",
            index + 1,
            truncate(&name, 27),
            truncate(&unit, 11),
            line.quantity.to_string(),
            line.unit_price.format_with_commas(),
            line.total.format_with_commas(),
        );
    }
    out
}

/// `3 box · 12 piece`
pub fn unit_quantities(sums: &[UnitQuantity]) -> String {
    sums.iter()
        .map(|s| format!("{} {}", s.quantity, s.unit_name))
        .collect::<Vec<_>>()
        .join(" · ")
}

pub fn invoice_header(record: &InvoiceRecord) -> String {
    let mut out = String::new();
    let number = record.invoice_number.as_deref().unwrap_or("-");
    let _ = writeln!(out, "Invoice #{} ({})", record.id, number);
    if let Some(date) = record.invoice_date {
        let _ = writeln!(out, "Date:      {}", date);
    }
    if let Some(kind) = record.payment_type {
        let _ = writeln!(out, "Type:      {} ({})", kind.alias(), kind.label());
    }
    if let Some(due) = record.due_date {
        let _ = writeln!(out, "Due:       {}", due);
    }
    match (&record.customer_name, &record.direct_customer_name) {
        (Some(name), _) if !name.is_empty() => {
            let _ = writeln!(out, "Customer:  {}", name);
        }
        (_, Some(name)) if !name.is_empty() => {
            let phone = record.direct_customer_phone.as_deref().unwrap_or("");
            let _ = writeln!(out, "Customer:  {} {}", name, phone);
        }
        _ => {
            if let Some(id) = record.customer_id {
                let _ = writeln!(out, "Customer:  #{}", id);
            }
        }
    }
    if let Some(note) = record.note.as_deref().filter(|n| !n.is_empty()) {
        let _ = writeln!(out, "Note:      {}", note);
    }
    out
}

pub fn invoice_rows(records: &[InvoiceRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<8}{:<14}{:<12}{:<10}{:<24}{:>18}",
        "ID", "Number", "Date", "Type", "Customer", "Total"
    );
    for record in records {
        let customer = record
            .customer_name
            .clone()
            .or_else(|| record.direct_customer_name.clone())
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{:<8}{:<14}{:<12}{:<10}{:<24}{:>18}",
            record.id,
            truncate(record.invoice_number.as_deref().unwrap_or("-"), 13),
            record
                .invoice_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            record.payment_type.map(|t| t.alias()).unwrap_or("-"),
            truncate(&customer, 23),
            record.total_amount.format_with_commas(),
        );
    }
    out
}

pub fn currency_sums(sums: &[CurrencySum]) -> String {
    if sums.is_empty() {
        return "Total: 0.00".to_string();
    }
    format!("Total: {}", format_sums(sums))
}

pub fn type_sums(sums: &[TypeSum]) -> String {
    let mut out = String::new();
    for entry in sums {
        let kind = if entry.kind.is_empty() { "-" } else { &entry.kind };
        let _ = writeln!(out, "{:<16}{}", kind, format_sums(&entry.sums));
    }
    out
}

pub fn drivers(drivers: &[Driver]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<6}{:<24}{:<16}{:<14}{:<12}",
        "ID", "Name", "Phone", "Car", "Hired"
    );
    for driver in drivers {
        let _ = writeln!(
            out,
            "{:<6}{:<24}{:<16}{:<14}{:<12}",
            driver.id.map(|id| id.to_string()).unwrap_or_default(),
            truncate(&driver.name, 23),
            driver.phone.as_deref().unwrap_or(""),
            truncate(driver.car_number.as_deref().unwrap_or(""), 13),
            driver.hired_date.map(|d| d.to_string()).unwrap_or_default(),
        );
    }
    out
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
