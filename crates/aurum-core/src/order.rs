//! # Orders
//!
//! Sales and purchases and the per-item lines that build their totals.
//!
//! ## Pricing Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Line Subtotal Formulas                        │
//! │                                                                     │
//! │  Sale:     (item weight + margin grams) × price/gram × quantity     │
//! │  Purchase:  item weight                 × price/gram × quantity     │
//! │                                                                     │
//! │  Order total = Σ line subtotals (recomputed explicitly after every  │
//! │  line change, stored read-only)                                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The margin is expressed in grams, not money: the shop marks an item up
//! by selling it as if it weighed a little more, so profit scales with the
//! gold price like everything else.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::debt::{DebtKind, DebtRef};
use crate::error::{ValidationError, ValidationErrors};
use crate::money::{line_subtotal, Money, Weight};

// =============================================================================
// Order Kind
// =============================================================================

/// Whether the order moves gold out of the shop (sale) or in (purchase).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    Sale,
    Purchase,
}

// =============================================================================
// Order
// =============================================================================

/// A sale or purchase.
///
/// `total` is derived from the lines and read-only to callers; the storage
/// engine recomputes it after every line change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub kind: OrderKind,

    /// Customer id for sales, supplier id for purchases. Opaque to the
    /// engines; the party registry lives elsewhere.
    pub party_id: String,

    pub payment_method: String,

    /// Present iff the order is financed.
    pub debt_ref: Option<DebtRef>,

    /// Sum of line subtotals. Derived, never set directly.
    pub total: Money,

    pub date: NaiveDate,

    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Whether this order is financed rather than settled at the counter.
    pub fn is_financed(&self) -> bool {
        self.debt_ref.is_some()
    }
}

// =============================================================================
// New Order (creation parameters)
// =============================================================================

/// Parameters for creating an order shell (lines come afterwards).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub kind: OrderKind,
    pub party_id: String,
    pub payment_method: String,
    pub debt_kind: Option<DebtKind>,
    pub date: NaiveDate,
    pub description: Option<String>,
}

impl NewOrder {
    /// Validates the order shell, aggregate-then-raise.
    ///
    /// Layaway financing is sale-only; a purchase may only be financed
    /// with a credit.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.party_id.trim().is_empty() {
            errors.push(ValidationError::Required {
                field: "party_id".to_string(),
            });
        }
        if let (OrderKind::Purchase, Some(DebtKind::Layaway)) = (self.kind, self.debt_kind) {
            errors.push(ValidationError::InvalidDebtRef {
                field: "debt_kind".to_string(),
                reason: "a purchase cannot be financed with a layaway".to_string(),
            });
        }

        errors.into_result()
    }
}

// =============================================================================
// Order Line
// =============================================================================

/// One item on an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    pub item_id: String,

    /// Units of the item (≥ 1).
    pub quantity: i64,

    /// Agreed gold price per gram (> 0).
    pub price_per_gram: Money,

    /// Markup grams added on top of the item weight. Sales only;
    /// zero on purchases.
    pub margin_per_gram: Weight,

    /// Derived from the formula for the order's kind. Read-only.
    pub subtotal: Money,

    pub created_at: DateTime<Utc>,
}

impl OrderLine {
    /// Sale profit contributed by this line: the margin grams priced at
    /// the agreed per-gram rate, across all units.
    pub fn profit(&self) -> Money {
        line_subtotal(self.margin_per_gram, self.price_per_gram, self.quantity)
    }

    /// Grams of gold this line moves (item weight × quantity).
    pub fn total_grams(&self, item_weight: Weight) -> Weight {
        Weight::from_milligrams(item_weight.milligrams() * self.quantity)
    }
}

// =============================================================================
// Line Subtotal
// =============================================================================

/// Validates a line's quantity/price/margin and computes its subtotal
/// under the order kind's formula.
///
/// All violations are reported together; the subtotal is only produced
/// when every input is valid.
pub fn compute_line_subtotal(
    kind: OrderKind,
    item_weight: Weight,
    quantity: i64,
    price_per_gram: Money,
    margin_per_gram: Weight,
) -> Result<Money, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if quantity < 1 {
        errors.push(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    } else if quantity > crate::MAX_LINE_QUANTITY {
        errors.push(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: crate::MAX_LINE_QUANTITY,
        });
    }
    if !price_per_gram.is_positive() {
        errors.push(ValidationError::MustBePositive {
            field: "price_per_gram".to_string(),
        });
    }
    if margin_per_gram.is_negative() {
        errors.push(ValidationError::MustNotBeNegative {
            field: "margin_per_gram".to_string(),
        });
    }
    if kind == OrderKind::Purchase && margin_per_gram.milligrams() != 0 {
        errors.push(ValidationError::InvalidFormat {
            field: "margin_per_gram".to_string(),
            reason: "purchases are priced at raw weight, without margin".to_string(),
        });
    }
    errors.into_result()?;

    let effective_weight = match kind {
        OrderKind::Sale => item_weight + margin_per_gram,
        OrderKind::Purchase => item_weight,
    };
    Ok(line_subtotal(effective_weight, price_per_gram, quantity))
}

/// Sums line subtotals into the order total.
pub fn compute_order_total(lines: &[OrderLine]) -> Money {
    lines
        .iter()
        .fold(Money::zero(), |acc, line| acc + line.subtotal)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(subtotal_cents: i64) -> OrderLine {
        OrderLine {
            id: "l1".to_string(),
            order_id: "o1".to_string(),
            item_id: "i1".to_string(),
            quantity: 2,
            price_per_gram: Money::from_cents(2000),
            margin_per_gram: Weight::from_milligrams(100),
            subtotal: Money::from_cents(subtotal_cents),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_sale_subtotal_includes_margin() {
        // (4.000g + 0.100g) × $20.00/g × 2 = $164.00
        let subtotal = compute_line_subtotal(
            OrderKind::Sale,
            Weight::from_milligrams(4000),
            2,
            Money::from_cents(2000),
            Weight::from_milligrams(100),
        )
        .unwrap();
        assert_eq!(subtotal.cents(), 16400);
    }

    #[test]
    fn test_purchase_subtotal_uses_raw_weight() {
        // 4.000g × $15.00/g × 3 = $180.00
        let subtotal = compute_line_subtotal(
            OrderKind::Purchase,
            Weight::from_milligrams(4000),
            3,
            Money::from_cents(1500),
            Weight::zero(),
        )
        .unwrap();
        assert_eq!(subtotal.cents(), 18000);
    }

    #[test]
    fn test_purchase_rejects_margin() {
        let err = compute_line_subtotal(
            OrderKind::Purchase,
            Weight::from_milligrams(4000),
            1,
            Money::from_cents(1500),
            Weight::from_milligrams(100),
        )
        .unwrap_err();
        assert!(err
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidFormat { .. })));
    }

    #[test]
    fn test_line_validation_aggregates() {
        let err = compute_line_subtotal(
            OrderKind::Sale,
            Weight::from_milligrams(4000),
            0,
            Money::zero(),
            Weight::zero(),
        )
        .unwrap_err();
        // Both the quantity and the price are reported.
        assert_eq!(err.iter().count(), 2);
    }

    #[test]
    fn test_order_total_sums_lines() {
        let lines = vec![line(16400), line(5056), line(1)];
        assert_eq!(compute_order_total(&lines).cents(), 21457);
        assert_eq!(compute_order_total(&[]).cents(), 0);
    }

    #[test]
    fn test_line_profit() {
        // 0.100g margin × $20.00/g × 2 = $4.00
        assert_eq!(line(0).profit().cents(), 400);
    }

    #[test]
    fn test_purchase_cannot_be_layaway_financed() {
        let new_order = NewOrder {
            kind: OrderKind::Purchase,
            party_id: "supplier-1".to_string(),
            payment_method: "Cash".to_string(),
            debt_kind: Some(DebtKind::Layaway),
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            description: None,
        };
        let err = new_order.validate().unwrap_err();
        assert!(err
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidDebtRef { .. })));

        let financed_purchase = NewOrder {
            debt_kind: Some(DebtKind::Credit),
            ..new_order
        };
        financed_purchase.validate().unwrap();
    }

    #[test]
    fn test_is_financed() {
        let now = Utc::now();
        let order = Order {
            id: "o1".to_string(),
            kind: OrderKind::Sale,
            party_id: "c1".to_string(),
            payment_method: "Cash".to_string(),
            debt_ref: Some(DebtRef::credit("d1")),
            total: Money::zero(),
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            description: None,
            created_at: now,
            updated_at: now,
        };
        assert!(order.is_financed());
    }
}
