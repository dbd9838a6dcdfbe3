//! # Domain Types
//!
//! Core domain types shared by every layer of Souq Back Office.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Fixed point                                                            │
//! │  ├── Rate          - exchange rate, unit factor, percentage (6 dp)      │
//! │  └── Quantity      - line quantity (3 dp, kg/litre friendly)            │
//! │                                                                         │
//! │  Enumerations                                                           │
//! │  ├── PaymentType   - نەقد / قەرز / ڕاستەوخۆ                            │
//! │  └── InvoiceKind   - Sell / Buy / BuyReturn                             │
//! │                                                                         │
//! │  Backend records (JSON, snake_case)                                     │
//! │  ├── Item, ItemUnit, ItemWithUnits, Currency                            │
//! │  ├── Customer, Branch, Warehouse, Driver, Employee                      │
//! │  ├── Payment                                                            │
//! │  └── InvoiceRecord, StoredLine                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::{div_round, format_fixed, parse_fixed, saturate, Money};
use crate::wire;
use crate::{MINOR_UNITS, QUANTITY_SCALE, RATE_SCALE};

// =============================================================================
// Rate
// =============================================================================

/// Fixed-point multiplier with six decimal places.
///
/// Used for currency exchange rates, unit conversion factors and
/// percentage discount values.
///
/// ## Example
/// ```rust
/// use souq_core::Rate;
///
/// let rate = Rate::parse("1.5").unwrap();
/// assert_eq!(rate.micros(), 1_500_000);
/// assert_eq!(rate.to_string(), "1.5");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rate(i64);

impl Rate {
    /// Multiplicative identity.
    pub const ONE: Rate = Rate(RATE_SCALE);

    #[inline]
    pub const fn from_micros(micros: i64) -> Self {
        Rate(micros)
    }

    #[inline]
    pub const fn from_integer(value: i64) -> Self {
        Rate(value * RATE_SCALE)
    }

    /// Parses a decimal string; thousands separators are ignored.
    pub fn parse(input: &str) -> Option<Rate> {
        parse_fixed(input, 6).map(Rate)
    }

    pub fn from_f64(value: f64) -> Rate {
        Rate((value * RATE_SCALE as f64).round() as i64)
    }

    #[inline]
    pub const fn micros(&self) -> i64 {
        self.0
    }

    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / RATE_SCALE as f64
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns `self`, or 1 when zero. Factors and exchange rates of zero
    /// are treated as "not set".
    pub const fn or_one(self) -> Rate {
        if self.0 == 0 {
            Rate::ONE
        } else {
            self
        }
    }

    /// Reads this value as a money amount (flat discount values are typed
    /// into the same field as percentages).
    pub fn to_money(&self) -> Money {
        let cents = div_round(self.0 as i128 * MINOR_UNITS as i128, RATE_SCALE as i128);
        Money::from_cents(saturate(cents))
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_fixed(self.0, 6, 0, false))
    }
}

// =============================================================================
// Quantity
// =============================================================================

/// Line quantity with three decimal places.
///
/// ## Example
/// ```rust
/// use souq_core::Quantity;
///
/// let qty = Quantity::parse("2.5").unwrap();
/// assert_eq!(qty.millis(), 2500);
/// assert_eq!(Quantity::from_units(3).to_string(), "3");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(i64);

impl Quantity {
    #[inline]
    pub const fn from_millis(millis: i64) -> Self {
        Quantity(millis)
    }

    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units * QUANTITY_SCALE)
    }

    pub fn parse(input: &str) -> Option<Quantity> {
        parse_fixed(input, 3).map(Quantity)
    }

    pub fn from_f64(value: f64) -> Quantity {
        Quantity((value * QUANTITY_SCALE as f64).round() as i64)
    }

    #[inline]
    pub const fn millis(&self) -> i64 {
        self.0
    }

    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / QUANTITY_SCALE as f64
    }

    #[inline]
    pub const fn zero() -> Self {
        Quantity(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_fixed(self.0, 3, 0, false))
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Quantity(self.0 + other.0)
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Self {
        iter.fold(Quantity::zero(), Add::add)
    }
}

// =============================================================================
// Payment Type
// =============================================================================

/// How an invoice is settled.
///
/// The backend stores the Kurdish label; English aliases are accepted on
/// input.
///
/// ```text
/// Cash   (نەقد)      paid in full at the counter
/// Loan   (قەرز)      customer owes the amount until the due date
/// Direct (ڕاستەوخۆ)  walk-in customer, name/phone instead of a record
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum PaymentType {
    Cash,
    Loan,
    Direct,
}

impl PaymentType {
    pub const ALL: [PaymentType; 3] = [PaymentType::Cash, PaymentType::Loan, PaymentType::Direct];

    /// Backend label.
    pub const fn label(&self) -> &'static str {
        match self {
            PaymentType::Cash => "نەقد",
            PaymentType::Loan => "قەرز",
            PaymentType::Direct => "ڕاستەوخۆ",
        }
    }

    pub const fn alias(&self) -> &'static str {
        match self {
            PaymentType::Cash => "cash",
            PaymentType::Loan => "loan",
            PaymentType::Direct => "direct",
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        PaymentType::ALL
            .into_iter()
            .find(|t| s == t.label() || s.eq_ignore_ascii_case(t.alias()))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "type".to_string(),
                allowed: PaymentType::ALL.iter().map(|t| t.label().to_string()).collect(),
            })
    }
}

impl TryFrom<String> for PaymentType {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PaymentType> for &'static str {
    fn from(value: PaymentType) -> Self {
        value.label()
    }
}

// =============================================================================
// Invoice Kind
// =============================================================================

/// Which invoice family a header or line belongs to.
///
/// | Kind      | Line foreign key        | Loan in grand total | Surcharges |
/// |-----------|-------------------------|---------------------|------------|
/// | Sell      | `invoice_id`            | yes                 | yes        |
/// | Buy       | `buy_invoice_id`        | no                  | no         |
/// | BuyReturn | `buy_return_invoice_id` | no                  | no         |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceKind {
    Sell,
    Buy,
    BuyReturn,
}

impl InvoiceKind {
    /// Field naming the parent invoice on a line record.
    pub const fn line_foreign_key(&self) -> &'static str {
        match self {
            InvoiceKind::Sell => "invoice_id",
            InvoiceKind::Buy => "buy_invoice_id",
            InvoiceKind::BuyReturn => "buy_return_invoice_id",
        }
    }

    /// Whether the carried-forward loan is part of the grand total.
    pub const fn includes_loan(&self) -> bool {
        matches!(self, InvoiceKind::Sell)
    }

    /// Whether transport/labor/discount fields are sent with the header.
    pub const fn has_adjustments(&self) -> bool {
        matches!(self, InvoiceKind::Sell)
    }
}

impl fmt::Display for InvoiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InvoiceKind::Sell => "sell",
            InvoiceKind::Buy => "buy",
            InvoiceKind::BuyReturn => "buy-return",
        };
        f.write_str(name)
    }
}

impl FromStr for InvoiceKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "sell" => Ok(InvoiceKind::Sell),
            "buy" => Ok(InvoiceKind::Buy),
            "buy-return" => Ok(InvoiceKind::BuyReturn),
            _ => Err(ValidationError::NotAllowed {
                field: "kind".to_string(),
                allowed: vec!["sell".into(), "buy".into(), "buy-return".into()],
            }),
        }
    }
}

// =============================================================================
// Catalog Records
// =============================================================================

/// Sellable item as returned by `/item/index` and `/item/show/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    /// Base cost in the backend's base currency.
    #[serde(default)]
    pub cost: Money,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
}

/// Unit of measure; `item_id` is `None` for generic units shared by all items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemUnit {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub item_id: Option<i64>,
    #[serde(default)]
    pub conversion_factor: Option<Rate>,
}

impl ItemUnit {
    /// Conversion factor, 1 when absent or zero.
    pub fn factor(&self) -> Rate {
        self.conversion_factor.map(Rate::or_one).unwrap_or(Rate::ONE)
    }
}

/// Response of `/item/with-units/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemWithUnits {
    #[serde(flatten)]
    pub item: Item,
    #[serde(default)]
    pub units: Vec<ItemUnit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub exchange_rate: Option<Rate>,
}

impl Currency {
    /// Display key for per-currency sums: the symbol, else the id.
    pub fn key(&self) -> String {
        match self.symbol.as_deref() {
            Some(symbol) if !symbol.is_empty() => symbol.to_string(),
            _ => self.id.to_string(),
        }
    }
}

// =============================================================================
// People & Places
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub branch_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub branch_id: Option<i64>,
}

/// Delivery driver.
///
/// `id` is absent on records that have not been stored yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub national_id: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "wire::lenient_date")]
    pub hired_date: Option<NaiveDate>,
    #[serde(default)]
    pub car_number: Option<String>,
    #[serde(default)]
    pub car_name: Option<String>,
}

/// Customer payment against an outstanding balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    #[serde(default)]
    pub customer_id: Option<i64>,
    #[serde(default)]
    pub amount: Money,
    #[serde(default)]
    pub currency_id: Option<i64>,
    /// Free-form payment category shown in reports.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub branch_id: Option<i64>,
    #[serde(default)]
    pub employee_id: Option<i64>,
    #[serde(default)]
    pub receipt_number: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default, deserialize_with = "wire::lenient_date")]
    pub payment_date: Option<NaiveDate>,
}

// =============================================================================
// Invoice Records
// =============================================================================

/// Invoice header as stored by the backend (any kind).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub id: i64,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "wire::blank_as_none")]
    pub payment_type: Option<PaymentType>,
    #[serde(default, deserialize_with = "wire::lenient_date")]
    pub invoice_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "wire::lenient_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub customer_id: Option<i64>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub branch_id: Option<i64>,
    #[serde(default)]
    pub warehouse_id: Option<i64>,
    #[serde(default)]
    pub employee_id: Option<i64>,
    #[serde(default)]
    pub agent_id: Option<i64>,
    #[serde(default)]
    pub driver_id: Option<i64>,
    #[serde(default)]
    pub currency_id: Option<i64>,
    #[serde(default)]
    pub exchange_rate: Option<Rate>,
    #[serde(default)]
    pub total_amount: Money,
    #[serde(default)]
    pub amount_transport: Money,
    #[serde(default)]
    pub amount_labor: Money,
    #[serde(default, deserialize_with = "wire::blank_as_none")]
    pub discount_type: Option<crate::discount::DiscountKind>,
    #[serde(default)]
    pub discount_value: Option<Rate>,
    #[serde(default)]
    pub discount_result: Money,
    #[serde(default)]
    pub loan: Money,
    #[serde(default)]
    pub direct_customer_name: Option<String>,
    #[serde(default)]
    pub direct_customer_phone: Option<String>,
    /// Payment method label (separate from the settlement `type`).
    #[serde(default, rename = "payment_type")]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Line item reference that arrives either as a bare id or as an
/// `{ id, name }` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemRef {
    Id(i64),
    Object {
        id: i64,
        #[serde(default)]
        name: Option<String>,
    },
}

impl ItemRef {
    pub fn id(&self) -> i64 {
        match self {
            ItemRef::Id(id) | ItemRef::Object { id, .. } => *id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            ItemRef::Id(_) => None,
            ItemRef::Object { name, .. } => name.as_deref(),
        }
    }
}

/// Persisted invoice line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLine {
    pub id: i64,
    pub item_id: ItemRef,
    pub item_unit_id: i64,
    #[serde(default)]
    pub quantity: Quantity,
    #[serde(default)]
    pub unit_price: Money,
    #[serde(default)]
    pub total_amount: Money,
    #[serde(default)]
    pub base_unit_price: Option<Money>,
    #[serde(default)]
    pub item_name: Option<String>,
}

impl StoredLine {
    /// Base price used for repricing; falls back to the stored unit price.
    pub fn base_price(&self) -> Money {
        match self.base_unit_price {
            Some(base) if !base.is_zero() => base,
            _ => self.unit_price,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rate_or_one() {
        assert_eq!(Rate::from_micros(0).or_one(), Rate::ONE);
        assert_eq!(Rate::from_integer(2).or_one(), Rate::from_integer(2));
    }

    #[test]
    fn test_rate_to_money() {
        assert_eq!(Rate::from_integer(150).to_money(), Money::from_major(150));
        assert_eq!(Rate::parse("0.005").unwrap().to_money(), Money::from_cents(1));
    }

    #[test]
    fn test_payment_type_parse() {
        assert_eq!("نەقد".parse::<PaymentType>(), Ok(PaymentType::Cash));
        assert_eq!("LOAN".parse::<PaymentType>(), Ok(PaymentType::Loan));
        assert_eq!("direct".parse::<PaymentType>(), Ok(PaymentType::Direct));
        assert!("cheque".parse::<PaymentType>().is_err());
    }

    #[test]
    fn test_payment_type_serializes_as_label() {
        let value = serde_json::to_value(PaymentType::Loan).unwrap();
        assert_eq!(value, json!("قەرز"));
    }

    #[test]
    fn test_invoice_kind_foreign_keys() {
        assert_eq!(InvoiceKind::Sell.line_foreign_key(), "invoice_id");
        assert_eq!(InvoiceKind::Buy.line_foreign_key(), "buy_invoice_id");
        assert_eq!(
            InvoiceKind::BuyReturn.line_foreign_key(),
            "buy_return_invoice_id"
        );
        assert!(InvoiceKind::Sell.includes_loan());
        assert!(!InvoiceKind::Buy.includes_loan());
        assert_eq!("buy_return".parse::<InvoiceKind>(), Ok(InvoiceKind::BuyReturn));
    }

    #[test]
    fn test_unit_factor_defaults_to_one() {
        let unit: ItemUnit = serde_json::from_value(json!({"id": 1, "name": "box"})).unwrap();
        assert_eq!(unit.factor(), Rate::ONE);

        let unit: ItemUnit =
            serde_json::from_value(json!({"id": 2, "name": "dozen", "conversion_factor": "12"}))
                .unwrap();
        assert_eq!(unit.factor(), Rate::from_integer(12));
    }

    #[test]
    fn test_item_with_units_decodes() {
        let body = json!({
            "id": 7,
            "name": "Rice",
            "cost": "12.50",
            "units": [{"id": 1, "name": "kg", "item_id": 7, "conversion_factor": 1}]
        });
        let item: ItemWithUnits = serde_json::from_value(body).unwrap();
        assert_eq!(item.item.cost, Money::from_cents(1250));
        assert_eq!(item.units.len(), 1);
    }

    #[test]
    fn test_invoice_record_lenient_fields() {
        let body = json!({
            "id": 3,
            "type": "",
            "invoice_date": "2024-05-01T00:00:00.000Z",
            "total_amount": "1000.00",
            "discount_type": "ڕێژە",
            "discount_value": "10",
            "discount_result": 100,
            "loan": null
        });
        let record: InvoiceRecord = serde_json::from_value(body).unwrap();
        assert_eq!(record.payment_type, None);
        assert_eq!(record.invoice_date, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(record.total_amount, Money::from_major(1000));
        assert_eq!(record.discount_value, Some(Rate::from_integer(10)));
        assert_eq!(record.loan, Money::zero());
    }

    #[test]
    fn test_stored_line_item_ref_forms() {
        let plain: StoredLine = serde_json::from_value(
            json!({"id": 1, "item_id": 4, "item_unit_id": 2, "quantity": "3", "unit_price": 300}),
        )
        .unwrap();
        let nested: StoredLine = serde_json::from_value(
            json!({"id": 2, "item_id": {"id": 4, "name": "Rice"}, "item_unit_id": 2}),
        )
        .unwrap();
        assert_eq!(plain.item_id.id(), 4);
        assert_eq!(nested.item_id.id(), 4);
        assert_eq!(nested.item_id.name(), Some("Rice"));
        assert_eq!(plain.base_price(), Money::from_major(300));
    }
}
