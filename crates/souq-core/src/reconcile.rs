//! # Line Reconciliation
//!
//! Turns "lines stored on the backend" and "lines on screen" into the
//! minimal list of line requests needed to save an edited invoice.
//!
//! ```text
//! key = (item_id, item_unit_id)
//!
//! on screen, key stored   ──► Update   (only if quantity / price / total changed)
//! on screen, key new      ──► Create
//! stored, key gone        ──► Delete   (after every create and update)
//! ```
//!
//! A stored row whose key repeats an earlier stored row is deleted; the
//! first stored row of a key is the one that gets updated.

use std::collections::{HashMap, HashSet};

use crate::pricing::LineItem;
use crate::types::StoredLine;

/// Identity of a line for reconciliation.
pub type LineKey = (i64, i64);

/// One line request of a save.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOp {
    Create(LineItem),
    Update { stored_id: i64, line: LineItem },
    Delete { stored_id: i64 },
}

pub fn line_key(line: &LineItem) -> LineKey {
    (line.item_id, line.unit_id)
}

pub fn stored_key(line: &StoredLine) -> LineKey {
    (line.item_id.id(), line.item_unit_id)
}

fn differs(stored: &StoredLine, line: &LineItem) -> bool {
    stored.quantity != line.quantity
        || stored.unit_price != line.unit_price
        || stored.total_amount != line.total
}

/// Plans the line requests for saving `desired` over `stored`.
///
/// ## Example
/// ```rust
/// use souq_core::reconcile::{plan, LineOp};
/// use souq_core::pricing::LineItem;
/// use souq_core::{Money, Quantity};
///
/// let line = LineItem {
///     item_id: 1,
///     item_name: None,
///     unit_id: 1,
///     quantity: Quantity::from_units(1),
///     unit_price: Money::from_major(5),
///     base_price: Money::from_major(5),
///     total: Money::from_major(5),
/// };
/// let ops = plan(&[], &[line.clone()]);
/// assert_eq!(ops, vec![LineOp::Create(line)]);
/// ```
pub fn plan(stored: &[StoredLine], desired: &[LineItem]) -> Vec<LineOp> {
    let mut by_key: HashMap<LineKey, &StoredLine> = HashMap::new();
    let mut shadowed = Vec::new();
    for row in stored {
        if by_key.contains_key(&stored_key(row)) {
            shadowed.push(row.id);
        } else {
            by_key.insert(stored_key(row), row);
        }
    }

    let mut ops = Vec::new();
    let mut wanted: HashSet<LineKey> = HashSet::new();

    for line in desired {
        let key = line_key(line);
        wanted.insert(key);
        match by_key.get(&key) {
            Some(row) if differs(row, line) => ops.push(LineOp::Update {
                stored_id: row.id,
                line: line.clone(),
            }),
            Some(_) => {}
            None => ops.push(LineOp::Create(line.clone())),
        }
    }

    for row in stored {
        if shadowed.contains(&row.id) || !wanted.contains(&stored_key(row)) {
            ops.push(LineOp::Delete { stored_id: row.id });
        }
    }

    ops
}
