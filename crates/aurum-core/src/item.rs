//! # Gold Inventory Items
//!
//! The inventory contract the order and debt engines consume: a weighed
//! item with a stock count. Sale lines reserve stock, purchase lines add
//! it, and cancelling a financed order reverses whatever its lines did.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationErrors};
use crate::money::Weight;

/// A gold item carried in inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct GoldItem {
    /// Unique identifier (UUID v4).
    pub id: String,
    pub name: String,
    /// Weight of one unit.
    pub weight: Weight,
    /// Units on hand. Never negative; sale reservations are guarded.
    pub available_quantity: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GoldItem {
    /// Whether `quantity` units can be sold right now.
    pub fn has_stock(&self, quantity: i64) -> bool {
        self.active && self.available_quantity >= quantity
    }
}

/// Parameters for registering a new item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGoldItem {
    pub name: String,
    pub weight: Weight,
    pub available_quantity: i64,
}

impl NewGoldItem {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.name.trim().is_empty() {
            errors.push(ValidationError::Required {
                field: "name".to_string(),
            });
        }
        if self.name.len() > 200 {
            errors.push(ValidationError::TooLong {
                field: "name".to_string(),
                max: 200,
            });
        }
        if self.weight.milligrams() <= 0 {
            errors.push(ValidationError::MustBePositive {
                field: "weight".to_string(),
            });
        }
        if self.available_quantity < 0 {
            errors.push(ValidationError::MustNotBeNegative {
                field: "available_quantity".to_string(),
            });
        }

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_stock() {
        let now = Utc::now();
        let item = GoldItem {
            id: "i1".to_string(),
            name: "18k ring".to_string(),
            weight: Weight::from_milligrams(4500),
            available_quantity: 2,
            active: true,
            created_at: now,
            updated_at: now,
        };
        assert!(item.has_stock(2));
        assert!(!item.has_stock(3));

        let inactive = GoldItem {
            active: false,
            ..item
        };
        assert!(!inactive.has_stock(1));
    }

    #[test]
    fn test_new_item_validation() {
        let bad = NewGoldItem {
            name: "  ".to_string(),
            weight: Weight::zero(),
            available_quantity: -1,
        };
        let err = bad.validate().unwrap_err();
        assert_eq!(err.iter().count(), 3);

        let good = NewGoldItem {
            name: "18k chain 12.300g".to_string(),
            weight: Weight::from_milligrams(12300),
            available_quantity: 0,
        };
        good.validate().unwrap();
    }
}
