//! # Invoice Form
//!
//! Header fields plus lines of an invoice being created or edited, with the
//! rules the create/edit screens enforce before anything is sent.
//!
//! ## Save Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  InvoiceForm                                                            │
//! │     │                                                                   │
//! │     ├── validate() ──────► ValidationErrors (field → message)           │
//! │     │                         blocks save when non-empty                │
//! │     │                                                                   │
//! │     ├── to_payload() ────► InvoicePayload  ──► POST /…-invoice/store    │
//! │     │                                         PUT  /…-invoice/update/id │
//! │     │                                                                   │
//! │     └── lines ───────────► reconcile::plan() ─► line_payload() per op  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::discount::{Discount, DiscountKind};
use crate::error::{CoreResult, ValidationError, ValidationErrors};
use crate::money::Money;
use crate::pricing::{InvoiceLines, LineItem, UnitCatalog};
use crate::totals::{Adjustments, InvoiceSummary};
use crate::types::{InvoiceKind, InvoiceRecord, PaymentType, Rate, StoredLine};
use crate::validation::validate_id;

// =============================================================================
// Invoice Form
// =============================================================================

/// Invoice header and lines.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use souq_core::invoice::InvoiceForm;
/// use souq_core::{InvoiceKind, PaymentType};
///
/// let mut form = InvoiceForm::new(InvoiceKind::Sell, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
/// form.customer_id = Some(12);
/// form.set_payment_type(PaymentType::Direct);
/// assert_eq!(form.customer_id, None);
///
/// let errors = form.validate().unwrap_err();
/// assert!(errors.contains("items"));
/// assert!(!errors.contains("customer_id"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceForm {
    kind: InvoiceKind,
    id: Option<i64>,
    payment_type: Option<PaymentType>,
    currency_id: Option<i64>,
    exchange_rate: Rate,
    discount: Discount,
    lines: InvoiceLines,

    pub invoice_number: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub customer_id: Option<i64>,
    pub direct_customer_name: Option<String>,
    pub direct_customer_phone: Option<String>,
    pub branch_id: Option<i64>,
    pub warehouse_id: Option<i64>,
    pub employee_id: Option<i64>,
    pub agent_id: Option<i64>,
    pub driver_id: Option<i64>,
    pub transport: Money,
    pub labor: Money,
    pub loan: Money,
    pub note: String,
    pub payment_method: Option<String>,
    pub payment_status: Option<String>,
}

impl InvoiceForm {
    /// Blank form for a new invoice dated `invoice_date`.
    pub fn new(kind: InvoiceKind, invoice_date: NaiveDate) -> Self {
        InvoiceForm {
            kind,
            id: None,
            payment_type: None,
            currency_id: None,
            exchange_rate: Rate::ONE,
            discount: Discount::none(),
            lines: InvoiceLines::new(),
            invoice_number: None,
            invoice_date: Some(invoice_date),
            due_date: None,
            customer_id: None,
            direct_customer_name: None,
            direct_customer_phone: None,
            branch_id: None,
            warehouse_id: None,
            employee_id: None,
            agent_id: None,
            driver_id: None,
            transport: Money::zero(),
            labor: Money::zero(),
            loan: Money::zero(),
            note: String::new(),
            payment_method: None,
            payment_status: None,
        }
    }

    /// Form for editing a stored invoice.
    pub fn from_record(kind: InvoiceKind, record: &InvoiceRecord, lines: &[StoredLine]) -> Self {
        InvoiceForm {
            kind,
            id: Some(record.id),
            payment_type: record.payment_type,
            currency_id: record.currency_id,
            exchange_rate: record.exchange_rate.map(Rate::or_one).unwrap_or(Rate::ONE),
            discount: Discount {
                kind: record.discount_type,
                value: record.discount_value,
            },
            lines: InvoiceLines::from_stored(lines),
            invoice_number: record.invoice_number.clone().filter(|n| !n.is_empty()),
            invoice_date: record.invoice_date,
            due_date: record.due_date,
            customer_id: record.customer_id.filter(|id| *id != 0),
            direct_customer_name: record.direct_customer_name.clone(),
            direct_customer_phone: record.direct_customer_phone.clone(),
            branch_id: record.branch_id,
            warehouse_id: record.warehouse_id,
            employee_id: record.employee_id,
            agent_id: record.agent_id.filter(|id| *id != 0),
            driver_id: record.driver_id.filter(|id| *id != 0),
            transport: record.amount_transport,
            labor: record.amount_labor,
            loan: record.loan,
            note: record.note.clone().unwrap_or_default(),
            payment_method: record.payment_method.clone(),
            payment_status: record.payment_status.clone(),
        }
    }

    pub fn kind(&self) -> InvoiceKind {
        self.kind
    }

    /// Backend id when editing a stored invoice.
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn is_editing(&self) -> bool {
        self.id.is_some()
    }

    /// Records the id assigned by the backend after the first store.
    pub fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    pub fn payment_type(&self) -> Option<PaymentType> {
        self.payment_type
    }

    /// Changes the settlement type.
    ///
    /// Direct invoices have no customer record; every other type drops the
    /// walk-in name and phone.
    pub fn set_payment_type(&mut self, payment_type: PaymentType) {
        self.payment_type = Some(payment_type);
        if payment_type == PaymentType::Direct {
            self.customer_id = None;
        } else {
            self.direct_customer_name = None;
            self.direct_customer_phone = None;
        }
    }

    pub fn currency_id(&self) -> Option<i64> {
        self.currency_id
    }

    pub fn exchange_rate(&self) -> Rate {
        self.exchange_rate
    }

    /// Switches currency.
    ///
    /// New invoices reprice every line at the new rate; stored invoices keep
    /// their saved prices.
    pub fn change_currency(&mut self, currency_id: i64, rate: Rate, catalog: &UnitCatalog) {
        self.currency_id = Some(currency_id);
        self.exchange_rate = rate.or_one();
        if !self.is_editing() {
            self.lines.reprice_all(self.exchange_rate, catalog);
        }
    }

    pub fn discount(&self) -> Discount {
        self.discount
    }

    pub fn set_discount(&mut self, kind: Option<DiscountKind>, value: Option<Rate>) {
        self.discount = Discount { kind, value };
    }

    /// Discount amount against the current invoice total.
    pub fn discount_result(&self) -> Money {
        self.discount.result(self.invoice_total())
    }

    pub fn lines(&self) -> &InvoiceLines {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut InvoiceLines {
        &mut self.lines
    }

    pub fn add_line(&mut self, line: LineItem) -> Uuid {
        self.lines.add(line)
    }

    pub fn invoice_total(&self) -> Money {
        self.lines.invoice_total()
    }

    pub fn adjustments(&self) -> Adjustments {
        Adjustments {
            transport: self.transport,
            labor: self.labor,
            discount: self.discount_result(),
            loan: self.loan,
        }
    }

    pub fn summary(&self) -> InvoiceSummary {
        InvoiceSummary::compute(self.invoice_total(), self.adjustments(), self.kind)
    }

    /// Checks everything the save button requires.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.payment_type != Some(PaymentType::Direct) {
            errors.check(validate_id("customer_id", self.customer_id));
        }
        errors.check(validate_id("branch_id", self.branch_id));
        errors.check(validate_id("warehouse_id", self.warehouse_id));
        errors.check(validate_id("employee_id", self.employee_id));
        errors.check(validate_id("currency_id", self.currency_id));
        if self.payment_type.is_none() {
            errors.push(ValidationError::required("type"));
        }
        if self.invoice_date.is_none() {
            errors.push(ValidationError::required("invoice_date"));
        }
        if self.lines.is_empty() {
            errors.push(ValidationError::required("items"));
        }

        let total = self.invoice_total();
        if self.discount.validate(total).is_err() {
            errors.push(ValidationError::Exceeds {
                field: "discount_result".to_string(),
                limit: total.to_string(),
            });
        }

        errors.into_result()
    }

    /// Validated request body for `store` / `update`.
    pub fn to_payload(&self) -> CoreResult<InvoicePayload> {
        self.validate()?;

        let missing = |field: &str| ValidationError::required(field);
        let payment_type = self.payment_type.ok_or_else(|| missing("type"))?;
        let invoice_date = self.invoice_date.ok_or_else(|| missing("invoice_date"))?;
        let direct = payment_type == PaymentType::Direct;

        let sell_fields = self.kind.has_adjustments().then(|| SellFields {
            agent_id: self.agent_id.unwrap_or(0),
            driver_id: self.driver_id.unwrap_or(0),
            amount_transport: self.transport,
            amount_labor: self.labor,
            discount_type: self.discount.kind,
            discount_value: self.discount.value.unwrap_or(Rate::from_micros(0)),
            discount_result: self.discount_result(),
            direct_customer_name: self.direct_customer_name.clone().filter(|s| !s.is_empty()),
            direct_customer_phone: self.direct_customer_phone.clone().filter(|s| !s.is_empty()),
            payment_type: self.payment_method.clone().filter(|s| !s.is_empty()),
            payment_status: self.payment_status.clone().filter(|s| !s.is_empty()),
        });

        Ok(InvoicePayload {
            payment_type,
            invoice_date,
            note: self.note.clone(),
            customer_id: if direct { 0 } else { self.customer_id.unwrap_or(0) },
            branch_id: self.branch_id.unwrap_or(0),
            warehouse_id: self.warehouse_id.unwrap_or(0),
            employee_id: self.employee_id.unwrap_or(0),
            currency_id: self.currency_id.unwrap_or(0),
            exchange_rate: self.exchange_rate,
            total_amount: self.invoice_total(),
            sell_fields,
            invoice_number: self.invoice_number.clone().filter(|n| !n.is_empty()),
            due_date: if payment_type == PaymentType::Loan {
                self.due_date
            } else {
                None
            },
        })
    }
}

// =============================================================================
// Request Payloads
// =============================================================================

/// Body of `POST /…-invoice/store` and `PUT /…-invoice/update/:id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoicePayload {
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    pub invoice_date: NaiveDate,
    pub note: String,
    /// 0 for Direct invoices.
    pub customer_id: i64,
    pub branch_id: i64,
    pub warehouse_id: i64,
    pub employee_id: i64,
    pub currency_id: i64,
    pub exchange_rate: Rate,
    pub total_amount: Money,
    #[serde(flatten)]
    pub sell_fields: Option<SellFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    /// Sent only for Loan invoices.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

/// Header fields only sell invoices carry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellFields {
    pub agent_id: i64,
    pub driver_id: i64,
    pub amount_transport: Money,
    pub amount_labor: Money,
    pub discount_type: Option<DiscountKind>,
    pub discount_value: Rate,
    pub discount_result: Money,
    pub direct_customer_name: Option<String>,
    pub direct_customer_phone: Option<String>,
    pub payment_type: Option<String>,
    pub payment_status: Option<String>,
}

/// Body of a line `store` / `update`, keyed to the parent invoice by the
/// kind's foreign-key name.
///
/// ## Example
/// ```rust
/// use souq_core::invoice::line_payload;
/// use souq_core::pricing::LineItem;
/// use souq_core::{InvoiceKind, Money, Quantity};
///
/// let line = LineItem {
///     item_id: 4,
///     item_name: None,
///     unit_id: 2,
///     quantity: Quantity::from_units(3),
///     unit_price: Money::from_major(300),
///     base_price: Money::from_major(300),
///     total: Money::from_major(900),
/// };
/// let body = line_payload(InvoiceKind::Buy, &line, 17);
/// assert_eq!(body["buy_invoice_id"], 17);
/// assert_eq!(body["total_amount"], 900.0);
/// ```
pub fn line_payload(kind: InvoiceKind, line: &LineItem, invoice_id: i64) -> Value {
    let mut body = Map::new();
    body.insert(kind.line_foreign_key().to_string(), json!(invoice_id));
    body.insert("item_id".to_string(), json!(line.item_id));
    body.insert("item_unit_id".to_string(), json!(line.unit_id));
    body.insert("quantity".to_string(), json!(line.quantity));
    body.insert("unit_price".to_string(), json!(line.unit_price));
    body.insert("total_amount".to_string(), json!(line.total));
    Value::Object(body)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::pricing::line_total;
    use crate::types::{ItemRef, ItemUnit, Quantity};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn line(item_id: i64, unit_id: i64, qty: i64, price: i64) -> LineItem {
        let price = Money::from_major(price);
        LineItem {
            item_id,
            item_name: None,
            unit_id,
            quantity: Quantity::from_units(qty),
            unit_price: price,
            base_price: price,
            total: line_total(Quantity::from_units(qty), price),
        }
    }

    fn filled(kind: InvoiceKind) -> InvoiceForm {
        let mut form = InvoiceForm::new(kind, date());
        form.set_payment_type(PaymentType::Cash);
        form.customer_id = Some(3);
        form.branch_id = Some(1);
        form.warehouse_id = Some(2);
        form.employee_id = Some(5);
        form.change_currency(1, Rate::ONE, &UnitCatalog::default());
        form.add_line(line(4, 2, 3, 300));
        form
    }

    #[test]
    fn test_validate_reports_required_fields() {
        let errors = InvoiceForm::new(InvoiceKind::Sell, date()).validate().unwrap_err();
        for field in [
            "customer_id",
            "branch_id",
            "warehouse_id",
            "employee_id",
            "currency_id",
            "type",
            "items",
        ] {
            assert!(errors.contains(field), "missing error for {field}");
        }
        assert!(!errors.contains("invoice_date"));
    }

    #[test]
    fn test_filled_form_is_valid() {
        assert!(filled(InvoiceKind::Sell).validate().is_ok());
    }

    #[test]
    fn test_discount_over_total_blocks_save() {
        let mut form = filled(InvoiceKind::Sell);
        form.set_discount(Some(DiscountKind::Flat), Some(Rate::from_integer(1000)));

        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.get("discount_result"),
            Some(&ValidationError::Exceeds {
                field: "discount_result".to_string(),
                limit: "900.00".to_string(),
            })
        );
        assert!(matches!(form.to_payload(), Err(CoreError::InvalidFields(_))));
    }

    #[test]
    fn test_direct_payment_clears_customer() {
        let mut form = filled(InvoiceKind::Sell);
        form.set_payment_type(PaymentType::Direct);
        form.direct_customer_name = Some("Walk-in".to_string());

        let payload = form.to_payload().unwrap();
        assert_eq!(payload.customer_id, 0);
        let body = serde_json::to_value(&payload).unwrap();
        assert_eq!(body["direct_customer_name"], "Walk-in");
        assert_eq!(body["type"], "ڕاستەوخۆ");

        form.set_payment_type(PaymentType::Cash);
        assert_eq!(form.direct_customer_name, None);
    }

    #[test]
    fn test_sell_payload_defaults_and_optional_fields() {
        let mut form = filled(InvoiceKind::Sell);
        form.due_date = NaiveDate::from_ymd_opt(2024, 6, 1);
        form.set_discount(Some(DiscountKind::Percentage), Some(Rate::from_integer(10)));

        let body = serde_json::to_value(form.to_payload().unwrap()).unwrap();
        assert_eq!(body["agent_id"], 0);
        assert_eq!(body["driver_id"], 0);
        assert_eq!(body["discount_type"], "ڕێژە");
        assert_eq!(body["discount_result"], 90.0);
        assert_eq!(body["total_amount"], 900.0);
        assert_eq!(body["invoice_date"], "2024-05-01");
        assert!(body.get("due_date").is_none());
        assert!(body.get("invoice_number").is_none());

        form.set_payment_type(PaymentType::Loan);
        form.invoice_number = Some("S-100".to_string());
        let body = serde_json::to_value(form.to_payload().unwrap()).unwrap();
        assert_eq!(body["due_date"], "2024-06-01");
        assert_eq!(body["invoice_number"], "S-100");
    }

    #[test]
    fn test_buy_payload_omits_adjustments() {
        let mut form = filled(InvoiceKind::Buy);
        form.transport = Money::from_major(10);
        let body = serde_json::to_value(form.to_payload().unwrap()).unwrap();
        assert!(body.get("amount_transport").is_none());
        assert!(body.get("discount_type").is_none());
        assert!(body.get("agent_id").is_none());
        assert_eq!(body["customer_id"], 3);
    }

    #[test]
    fn test_currency_change_reprices_new_invoices_only() {
        let catalog = UnitCatalog::new(vec![ItemUnit {
            id: 2,
            name: "box".to_string(),
            item_id: Some(4),
            conversion_factor: Some(Rate::from_integer(2)),
        }]);

        let mut new_form = filled(InvoiceKind::Sell);
        new_form.change_currency(2, Rate::parse("1.5").unwrap(), &catalog);
        // base 300 × 2 × 1.5 = 900 per unit, 3 units
        assert_eq!(new_form.invoice_total(), Money::from_major(2700));

        let record: InvoiceRecord = serde_json::from_value(json!({
            "id": 9,
            "type": "نەقد",
            "currency_id": 1,
            "exchange_rate": 1,
            "total_amount": 900
        }))
        .unwrap();
        let stored = StoredLine {
            id: 1,
            item_id: ItemRef::Id(4),
            item_unit_id: 2,
            quantity: Quantity::from_units(3),
            unit_price: Money::from_major(300),
            total_amount: Money::from_major(900),
            base_unit_price: None,
            item_name: None,
        };
        let mut edit_form = InvoiceForm::from_record(InvoiceKind::Sell, &record, &[stored]);
        edit_form.change_currency(2, Rate::parse("1.5").unwrap(), &catalog);
        assert_eq!(edit_form.exchange_rate(), Rate::parse("1.5").unwrap());
        assert_eq!(edit_form.invoice_total(), Money::from_major(900));
    }

    #[test]
    fn test_summary_includes_loan_for_sell() {
        let mut form = filled(InvoiceKind::Sell);
        form.transport = Money::from_major(50);
        form.loan = Money::from_major(100);
        assert_eq!(form.summary().grand_total, Money::from_major(1050));
    }
}
