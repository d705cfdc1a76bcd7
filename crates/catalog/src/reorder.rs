use serde::{Deserialize, Serialize};

use stockflow_core::{ProductId, StockError, StockResult, WarehouseId};

/// Min/max replenishment rule for one product in one warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderRule {
    pub product: ProductId,
    pub warehouse: WarehouseId,
    pub min_quantity: i64,
    pub max_quantity: i64,
}

impl ReorderRule {
    pub fn new(
        product: ProductId,
        warehouse: WarehouseId,
        min_quantity: i64,
        max_quantity: i64,
    ) -> StockResult<Self> {
        if min_quantity < 0 {
            return Err(StockError::validation("reorder minimum cannot be negative"));
        }
        if max_quantity < min_quantity {
            return Err(StockError::validation(format!(
                "reorder maximum {max_quantity} is below minimum {min_quantity}"
            )));
        }
        Ok(Self {
            product,
            warehouse,
            min_quantity,
            max_quantity,
        })
    }

    /// Quantity to order for the given on-hand total, if it is below the minimum.
    pub fn suggestion(&self, on_hand: i64) -> Option<i64> {
        (on_hand < self.min_quantity).then(|| self.max_quantity.saturating_sub(on_hand))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_below_min_is_rejected() {
        let err = ReorderRule::new(ProductId::new(), WarehouseId::new(), 10, 5).unwrap_err();
        assert!(matches!(err, StockError::Validation(_)));
    }

    #[test]
    fn suggests_refill_to_max_only_below_min() {
        let rule = ReorderRule::new(ProductId::new(), WarehouseId::new(), 10, 50).unwrap();
        assert_eq!(rule.suggestion(4), Some(46));
        assert_eq!(rule.suggestion(10), None);
    }

    #[test]
    fn suggestion_saturates_instead_of_overflowing() {
        let rule = ReorderRule::new(ProductId::new(), WarehouseId::new(), 10, i64::MAX).unwrap();
        assert_eq!(rule.suggestion(-1), Some(i64::MAX));
    }
}
