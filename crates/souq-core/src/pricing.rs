//! # Line-Item Pricing
//!
//! Derives invoice line prices from an item's base cost and keeps every
//! line consistent while the user edits it.
//!
//! ## Pricing Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   unit_price = base_cost × conversion_factor × exchange_rate            │
//! │                              (default 1)        (default 1)             │
//! │                                                                         │
//! │   line_total = quantity × unit_price                                    │
//! │                                                                         │
//! │   Each product is rounded once, half away from zero, to the cent.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Recompute Triggers
//! ```text
//! User action                LineDraft method          Effect
//! ───────────                ────────────────          ──────
//! pick item ───────────────► select_item() ──────────► base cost, units, price
//! pick unit ───────────────► select_unit() ──────────► price from factor
//! currency changed ────────► reprice() / reprice_all ► price from new rate
//! type quantity ───────────► set_quantity() ─────────► total
//! type price ──────────────► set_unit_price() ───────► total (manual override)
//! ```
//!
//! A manual price stays in place until the next item, unit or rate change.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationErrors};
use crate::money::{div_round, saturate, Money};
use crate::types::{ItemUnit, ItemWithUnits, Quantity, Rate, StoredLine};
use crate::validation::{validate_id, validate_quantity, validate_unit_price};
use crate::RATE_SCALE;

// =============================================================================
// Pricing Functions
// =============================================================================

/// Price of one unit in the invoice currency.
///
/// Zero factors and rates count as "not set" and read as 1.
///
/// ## Example
/// ```rust
/// use souq_core::pricing::unit_price;
/// use souq_core::{Money, Rate};
///
/// let price = unit_price(Money::from_major(100), Rate::from_integer(2), Rate::parse("1.5").unwrap());
/// assert_eq!(price, Money::from_major(300));
/// ```
pub fn unit_price(base_cost: Money, factor: Rate, rate: Rate) -> Money {
    let numerator = (base_cost.cents() as i128)
        .checked_mul(factor.or_one().micros() as i128)
        .and_then(|n| n.checked_mul(rate.or_one().micros() as i128));
    let denominator = RATE_SCALE as i128 * RATE_SCALE as i128;

    match numerator {
        Some(n) => Money::from_cents(saturate(div_round(n, denominator))),
        // Only reachable for absurd inputs; fall back to two roundings.
        None => base_cost.scale(factor.or_one()).scale(rate.or_one()),
    }
}

/// Quantity times unit price.
///
/// ## Example
/// ```rust
/// use souq_core::pricing::line_total;
/// use souq_core::{Money, Quantity};
///
/// assert_eq!(line_total(Quantity::from_units(3), Money::from_major(300)), Money::from_major(900));
/// ```
pub fn line_total(quantity: Quantity, unit_price: Money) -> Money {
    unit_price.multiply_quantity(quantity)
}

// =============================================================================
// Unit Catalog
// =============================================================================

/// All item units known to the screen, used for factor lookups when
/// repricing lines that were not picked through the draft editor.
#[derive(Debug, Clone, Default)]
pub struct UnitCatalog {
    units: Vec<ItemUnit>,
}

impl UnitCatalog {
    pub fn new(units: Vec<ItemUnit>) -> Self {
        UnitCatalog { units }
    }

    pub fn units(&self) -> &[ItemUnit] {
        &self.units
    }

    /// Conversion factor of `unit_id` for `item_id`.
    ///
    /// Prefers a unit bound to the item, then a generic unit (no item);
    /// anything else reads as 1.
    pub fn factor_for(&self, unit_id: i64, item_id: i64) -> Rate {
        self.units
            .iter()
            .find(|u| u.id == unit_id && u.item_id == Some(item_id))
            .or_else(|| {
                self.units
                    .iter()
                    .find(|u| u.id == unit_id && u.item_id.is_none())
            })
            .map(ItemUnit::factor)
            .unwrap_or(Rate::ONE)
    }

    pub fn name_of(&self, unit_id: i64) -> Option<&str> {
        self.units
            .iter()
            .find(|u| u.id == unit_id)
            .map(|u| u.name.as_str())
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// A validated invoice line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub item_id: i64,
    pub item_name: Option<String>,
    pub unit_id: i64,
    pub quantity: Quantity,
    pub unit_price: Money,
    /// Base cost the price was derived from (before factor and rate).
    pub base_price: Money,
    pub total: Money,
}

impl LineItem {
    /// Recomputes `total` from quantity and unit price.
    pub fn recompute_total(&mut self) {
        self.total = line_total(self.quantity, self.unit_price);
    }

    /// Re-derives the unit price from the base price.
    pub fn reprice(&mut self, factor: Rate, rate: Rate) {
        self.unit_price = unit_price(self.base_price, factor, rate);
        self.recompute_total();
    }
}

// =============================================================================
// Line Draft (the "add line" editor)
// =============================================================================

/// In-progress line being added or edited.
///
/// ## Example
/// ```rust
/// use souq_core::pricing::LineDraft;
/// use souq_core::{Item, ItemUnit, ItemWithUnits, Money, Quantity, Rate};
///
/// let item = ItemWithUnits {
///     item: Item {
///         id: 1,
///         name: "Flour".into(),
///         cost: Money::from_major(100),
///         code: None,
///         barcode: None,
///         category_id: None,
///     },
///     units: vec![ItemUnit {
///         id: 10,
///         name: "sack".into(),
///         item_id: Some(1),
///         conversion_factor: Some(Rate::from_integer(2)),
///     }],
/// };
///
/// let mut draft = LineDraft::new();
/// draft.select_item(item, Rate::parse("1.5").unwrap());
/// draft.set_quantity(Some(Quantity::from_units(3)));
///
/// let line = draft.build().unwrap();
/// assert_eq!(line.unit_price, Money::from_major(300));
/// assert_eq!(line.total, Money::from_major(900));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineDraft {
    item_id: Option<i64>,
    item_name: Option<String>,
    units: Vec<ItemUnit>,
    unit_id: Option<i64>,
    quantity: Option<Quantity>,
    base_price: Option<Money>,
    unit_price: Option<Money>,
}

impl LineDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a draft from an existing line for in-place editing.
    ///
    /// When `units` is non-empty and does not contain the line's unit, the
    /// first unit is selected instead.
    pub fn from_line(line: &LineItem, units: Vec<ItemUnit>) -> Self {
        let unit_id = match units.first() {
            Some(first) if !units.iter().any(|u| u.id == line.unit_id) => first.id,
            _ => line.unit_id,
        };
        LineDraft {
            item_id: Some(line.item_id),
            item_name: line.item_name.clone(),
            units,
            unit_id: Some(unit_id),
            quantity: Some(line.quantity),
            base_price: Some(line.base_price),
            unit_price: Some(line.unit_price),
        }
    }

    /// Picks an item: stores its base cost and units, selects the first
    /// unit and derives the price.
    pub fn select_item(&mut self, item: ItemWithUnits, rate: Rate) {
        self.item_id = Some(item.item.id);
        self.item_name = Some(item.item.name);
        self.base_price = Some(item.item.cost);
        self.unit_id = item.units.first().map(|u| u.id);
        self.units = item.units;
        self.reprice(rate);
    }

    /// Clears the item selection (also used when loading the item failed).
    pub fn clear_item(&mut self) {
        self.item_id = None;
        self.item_name = None;
        self.units.clear();
        self.unit_id = None;
        self.base_price = None;
        self.unit_price = None;
    }

    /// Picks a unit from the draft's unit list and re-derives the price.
    pub fn select_unit(&mut self, unit_id: i64, rate: Rate) {
        self.unit_id = Some(unit_id);
        self.reprice(rate);
    }

    pub fn set_quantity(&mut self, quantity: Option<Quantity>) {
        self.quantity = quantity;
    }

    /// Manual price override.
    pub fn set_unit_price(&mut self, price: Option<Money>) {
        self.unit_price = price;
    }

    /// Re-derives the price from the base cost at `rate`.
    pub fn reprice(&mut self, rate: Rate) {
        if let Some(base) = self.base_price {
            self.unit_price = Some(unit_price(base, self.factor(), rate));
        }
    }

    /// Factor of the selected unit among the draft's units, default 1.
    pub fn factor(&self) -> Rate {
        self.unit_id
            .and_then(|id| self.units.iter().find(|u| u.id == id))
            .map(ItemUnit::factor)
            .unwrap_or(Rate::ONE)
    }

    pub fn item_id(&self) -> Option<i64> {
        self.item_id
    }

    pub fn unit_id(&self) -> Option<i64> {
        self.unit_id
    }

    pub fn units(&self) -> &[ItemUnit] {
        &self.units
    }

    pub fn quantity(&self) -> Option<Quantity> {
        self.quantity
    }

    pub fn unit_price(&self) -> Option<Money> {
        self.unit_price
    }

    pub fn base_price(&self) -> Option<Money> {
        self.base_price
    }

    /// Running total shown while typing; blanks count as zero.
    pub fn total(&self) -> Money {
        line_total(
            self.quantity.unwrap_or_default(),
            self.unit_price.unwrap_or_default(),
        )
    }

    /// Validates the draft into a line.
    ///
    /// Every missing field is reported, not just the first.
    pub fn build(&self) -> Result<LineItem, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let item_id = errors.check(validate_id("item_id", self.item_id));
        let unit_id = errors.check(validate_id("item_unit_id", self.unit_id));
        let quantity = errors.check(validate_quantity(self.quantity));
        let price = errors.check(validate_unit_price(self.unit_price));

        match (item_id, unit_id, quantity, price) {
            (Some(item_id), Some(unit_id), Some(quantity), Some(unit_price)) => Ok(LineItem {
                item_id,
                item_name: self.item_name.clone(),
                unit_id,
                quantity,
                unit_price,
                base_price: self.base_price.unwrap_or(unit_price),
                total: line_total(quantity, unit_price),
            }),
            _ => Err(errors),
        }
    }
}

// =============================================================================
// Invoice Lines
// =============================================================================

/// A line on the invoice being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceLine {
    /// Local row id, stable across edits.
    pub row_id: Uuid,
    /// Backend id when the line was loaded from storage.
    pub stored_id: Option<i64>,
    pub line: LineItem,
}

impl From<&StoredLine> for InvoiceLine {
    fn from(stored: &StoredLine) -> Self {
        let item_name = stored
            .item_name
            .clone()
            .or_else(|| stored.item_id.name().map(str::to_string));
        InvoiceLine {
            row_id: Uuid::new_v4(),
            stored_id: Some(stored.id),
            line: LineItem {
                item_id: stored.item_id.id(),
                item_name,
                unit_id: stored.item_unit_id,
                quantity: stored.quantity,
                unit_price: stored.unit_price,
                base_price: stored.base_price(),
                total: stored.total_amount,
            },
        }
    }
}

/// Quantity sum for one unit, shown under the lines table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitQuantity {
    pub unit_id: i64,
    /// Unit name, or the id when the unit is unknown.
    pub unit_name: String,
    pub quantity: Quantity,
}

/// Ordered lines of one invoice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceLines {
    lines: Vec<InvoiceLine>,
}

impl InvoiceLines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines as loaded from the backend for an existing invoice.
    pub fn from_stored(stored: &[StoredLine]) -> Self {
        InvoiceLines {
            lines: stored.iter().map(InvoiceLine::from).collect(),
        }
    }

    /// Appends a line and returns its row id.
    pub fn add(&mut self, line: LineItem) -> Uuid {
        let row_id = Uuid::new_v4();
        self.lines.push(InvoiceLine {
            row_id,
            stored_id: None,
            line,
        });
        row_id
    }

    pub fn remove(&mut self, row_id: Uuid) -> CoreResult<InvoiceLine> {
        let index = self.index_of(row_id)?;
        Ok(self.lines.remove(index))
    }

    /// Opens a row in the editor, seeded with the item's units.
    pub fn edit(&self, row_id: Uuid, units: Vec<ItemUnit>) -> CoreResult<LineDraft> {
        let row = self.get(row_id).ok_or(CoreError::LineNotFound(row_id))?;
        Ok(LineDraft::from_line(&row.line, units))
    }

    /// Saves an edited row back in place.
    pub fn replace(&mut self, row_id: Uuid, line: LineItem) -> CoreResult<()> {
        let index = self.index_of(row_id)?;
        self.lines[index].line = line;
        Ok(())
    }

    pub fn get(&self, row_id: Uuid) -> Option<&InvoiceLine> {
        self.lines.iter().find(|l| l.row_id == row_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InvoiceLine> {
        self.lines.iter()
    }

    /// Validated line items in display order.
    pub fn items(&self) -> impl Iterator<Item = &LineItem> {
        self.lines.iter().map(|l| &l.line)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Re-derives every row's price at a new exchange rate.
    pub fn reprice_all(&mut self, rate: Rate, catalog: &UnitCatalog) {
        for row in &mut self.lines {
            let factor = catalog.factor_for(row.line.unit_id, row.line.item_id);
            row.line.reprice(factor, rate);
        }
    }

    /// Sum of line totals.
    pub fn invoice_total(&self) -> Money {
        self.lines.iter().map(|l| l.line.total).sum()
    }

    /// Per-unit quantity sums in first-seen order.
    pub fn quantity_by_unit(&self, catalog: &UnitCatalog) -> Vec<UnitQuantity> {
        let mut sums: Vec<UnitQuantity> = Vec::new();
        for row in &self.lines {
            let unit_id = row.line.unit_id;
            match sums.iter_mut().find(|s| s.unit_id == unit_id) {
                Some(sum) => sum.quantity += row.line.quantity,
                None => sums.push(UnitQuantity {
                    unit_id,
                    unit_name: catalog
                        .name_of(unit_id)
                        .map(str::to_string)
                        .unwrap_or_else(|| unit_id.to_string()),
                    quantity: row.line.quantity,
                }),
            }
        }
        sums
    }

    fn index_of(&self, row_id: Uuid) -> CoreResult<usize> {
        self.lines
            .iter()
            .position(|l| l.row_id == row_id)
            .ok_or(CoreError::LineNotFound(row_id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
