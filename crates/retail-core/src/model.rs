//! # Entity Model
//!
//! The in-memory shape of a sales transaction.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Entity Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Bill       │   │    BillItem     │   │      Buyer      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (rowid)     │──►│  product_name   │   │  id (rowid)     │       │
//! │  │  bill_date      │1:N│  quantity       │   │  name           │       │
//! │  │  grand_total    │   │  unit_price     │   │  phone          │       │
//! │  │  buyer (0..1)   │   │  item_total()   │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                             │
//! │                                                                         │
//! │  Derivation chain (never stored, always recomputed):                   │
//! │    item_total = quantity × unit_price                                  │
//! │    subtotal   = Σ item_total                                           │
//! │    discount_amount = subtotal × discount_percent / 100                 │
//! │    grand_total     = subtotal − discount_amount                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only `grand_total` is durable. On reload the discount fields are
//! back-derived from the reloaded items and the stored grand total, so a
//! round trip may not bit-for-bit reproduce the values entered at save time
//! (floating-point arithmetic). That is inherent to the storage design.

use serde::{Deserialize, Serialize};

// =============================================================================
// Buyer
// =============================================================================

/// Optional customer identity attached to a bill.
///
/// A buyer is persisted once per bill save when either field is non-blank.
/// There is no dedup: a repeat customer mints a new row per save. Buyers are
/// never updated or deleted by this core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Buyer {
    /// Storage-assigned identifier; `None` until persisted.
    pub id: Option<i64>,

    /// Display name.
    pub name: Option<String>,

    /// Contact phone.
    pub phone: Option<String>,
}

impl Buyer {
    /// Creates a transient buyer from form input.
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Buyer {
            id: None,
            name: Some(name.into()),
            phone: Some(phone.into()),
        }
    }

    /// True when the buyer carries anything worth persisting: a non-blank
    /// name or a non-blank phone.
    pub fn has_identity(&self) -> bool {
        let non_blank = |s: &Option<String>| s.as_deref().is_some_and(|v| !v.trim().is_empty());
        non_blank(&self.name) || non_blank(&self.phone)
    }
}

// =============================================================================
// BillItem
// =============================================================================

/// One product line within a bill.
///
/// Quantities are real numbers: weight-based goods sell in fractional units.
/// No validation happens here; the entry form owns that. Whatever values
/// arrive are carried and persisted verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillItem {
    /// Display name of the product.
    pub product_name: String,

    /// Quantity sold (fractional allowed).
    pub quantity: f64,

    /// Price per unit.
    pub unit_price: f64,
}

impl BillItem {
    /// Creates a line item.
    pub fn new(product_name: impl Into<String>, quantity: f64, unit_price: f64) -> Self {
        BillItem {
            product_name: product_name.into(),
            quantity,
            unit_price,
        }
    }

    /// Line total: `quantity × unit_price`.
    ///
    /// Recomputed on demand, never cached, never stored.
    #[inline]
    pub fn item_total(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

// =============================================================================
// Bill
// =============================================================================

/// One completed sales transaction: header plus line items.
///
/// ## Lifecycle
/// ```text
/// entry form builds Bill ──► BillRepository::save_bill (stamps date,
/// assigns id) ──► immutable thereafter; reloaded many times for display
/// ```
///
/// A saved bill is never mutated: no update or delete path exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    /// Storage-assigned identifier; `None` until persisted.
    pub id: Option<i64>,

    /// Save-time stamp, assigned by the repository. Any caller-supplied
    /// value is overwritten during save.
    pub bill_date: String,

    /// Sum of item totals. Derived; kept here so reloaded snapshots carry it.
    pub subtotal: f64,

    /// Declared discount percentage. Not durable; back-derived on reload.
    pub discount_percent: f64,

    /// Declared discount amount. Not durable; back-derived on reload.
    pub discount_amount: f64,

    /// The actually-charged amount. The only durable total.
    pub grand_total: f64,

    /// Optional buyer (zero or one).
    pub buyer: Option<Buyer>,

    /// Line items in insertion order.
    pub items: Vec<BillItem>,
}

impl Bill {
    /// Creates an empty transient bill.
    pub fn new() -> Self {
        Bill::default()
    }

    /// Appends a line item. No validation; the entry form owns that.
    pub fn add_item(&mut self, item: BillItem) {
        self.items.push(item);
    }

    /// Sum of line totals over the current items.
    pub fn compute_subtotal(&self) -> f64 {
        self.items.iter().map(BillItem::item_total).sum()
    }

    /// Recomputes the whole derivation chain from the current items and the
    /// given discount percentage, writing `subtotal`, `discount_amount` and
    /// `grand_total`.
    ///
    /// This is the explicit form of the entry form's live recalculation:
    /// called after every edit instead of an implicit reactive binding.
    /// The percentage is clamped to `[0, 100]`; NaN is treated as zero.
    pub fn recalculate(&mut self, discount_percent: f64) {
        let pct = if discount_percent.is_nan() {
            0.0
        } else {
            discount_percent.clamp(0.0, 100.0)
        };

        self.subtotal = self.compute_subtotal();
        self.discount_percent = pct;
        self.discount_amount = self.subtotal * (pct / 100.0);
        self.grand_total = self.subtotal - self.discount_amount;
    }
}

// =============================================================================
// Discount back-derivation
// =============================================================================

/// Derives `(discount_amount, discount_percent)` from a reloaded subtotal
/// and the stored grand total.
///
/// Only the grand total is persisted, so on reload the discount is always
/// recovered from the difference:
///
/// - `discount_amount = max(0, subtotal − grand_total)` (a stored total
///   exceeding the subtotal never yields a negative discount)
/// - `discount_percent = discount_amount / subtotal × 100`, or zero when the
///   subtotal is zero
pub fn derive_discount(subtotal: f64, grand_total: f64) -> (f64, f64) {
    let amount = (subtotal - grand_total).max(0.0);
    let percent = if subtotal > 0.0 {
        amount / subtotal * 100.0
    } else {
        0.0
    };
    (amount, percent)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_total_is_quantity_times_price() {
        let item = BillItem::new("Sugar", 2.5, 4.0);
        assert_eq!(item.item_total(), 10.0);

        // zero and negative values pass through untouched
        assert_eq!(BillItem::new("Free", 0.0, 99.0).item_total(), 0.0);
        assert_eq!(BillItem::new("Refund", -1.0, 5.0).item_total(), -5.0);
    }

    #[test]
    fn subtotal_sums_items_in_order() {
        let mut bill = Bill::new();
        bill.add_item(BillItem::new("Widget", 2.0, 10.0));
        bill.add_item(BillItem::new("Gadget", 1.0, 5.0));

        assert_eq!(bill.compute_subtotal(), 25.0);
        assert_eq!(bill.items[0].product_name, "Widget");
        assert_eq!(bill.items[1].product_name, "Gadget");
    }

    #[test]
    fn recalculate_applies_discount_chain() {
        let mut bill = Bill::new();
        bill.add_item(BillItem::new("Widget", 2.0, 10.0));
        bill.add_item(BillItem::new("Gadget", 1.0, 5.0));

        bill.recalculate(10.0);
        assert_eq!(bill.subtotal, 25.0);
        assert_eq!(bill.discount_amount, 2.5);
        assert_eq!(bill.grand_total, 22.5);
    }

    #[test]
    fn recalculate_clamps_percent() {
        let mut bill = Bill::new();
        bill.add_item(BillItem::new("Widget", 1.0, 100.0));

        bill.recalculate(150.0);
        assert_eq!(bill.discount_percent, 100.0);
        assert_eq!(bill.grand_total, 0.0);

        bill.recalculate(-5.0);
        assert_eq!(bill.discount_percent, 0.0);
        assert_eq!(bill.grand_total, 100.0);

        bill.recalculate(f64::NAN);
        assert_eq!(bill.discount_percent, 0.0);
        assert_eq!(bill.grand_total, 100.0);
    }

    #[test]
    fn derive_discount_recovers_amount_and_percent() {
        let (amount, percent) = derive_discount(25.0, 22.5);
        assert_eq!(amount, 2.5);
        assert_eq!(percent, 10.0);
    }

    #[test]
    fn derive_discount_clamps_negative_to_zero() {
        // stored grand total above the subtotal: no negative discount
        let (amount, percent) = derive_discount(10.0, 12.0);
        assert_eq!(amount, 0.0);
        assert_eq!(percent, 0.0);
    }

    #[test]
    fn derive_discount_zero_subtotal_yields_zero_percent() {
        let (amount, percent) = derive_discount(0.0, 0.0);
        assert_eq!(amount, 0.0);
        assert_eq!(percent, 0.0);
    }

    #[test]
    fn buyer_identity_requires_non_blank_field() {
        assert!(Buyer::new("Alice", "").has_identity());
        assert!(Buyer::new("", "0301-1234567").has_identity());
        assert!(!Buyer::new("", "").has_identity());
        assert!(!Buyer::new("   ", "  ").has_identity());
        assert!(!Buyer::default().has_identity());
    }
}
