use serde::Serialize;

use stockflow_core::{ProductId, WarehouseId};

/// A product at or below its low-stock threshold in one warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowStockAlert {
    pub product: ProductId,
    pub sku: String,
    pub warehouse: WarehouseId,
    pub on_hand: i64,
    pub threshold: i64,
    pub out_of_stock: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReorderSuggestion {
    pub product: ProductId,
    pub sku: String,
    pub warehouse: WarehouseId,
    pub on_hand: i64,
    pub min_quantity: i64,
    pub max_quantity: i64,
    /// Quantity that brings the warehouse back up to the rule maximum.
    pub suggested: i64,
}
