use serde::{Deserialize, Serialize};

use stockflow_core::{CategoryId, ProductId, StockError, StockResult};

pub const DEFAULT_UNIT_OF_MEASURE: &str = "Unit";

/// Product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub unit_of_measure: String,
    pub category: Option<CategoryId>,
    /// Low-stock alert fires when a warehouse total drops to this value or below.
    /// Zero disables the alert.
    pub low_stock_threshold: i64,
    /// Quantity a receipt line is pre-populated with.
    pub expected_quantity: i64,
    pub active: bool,
}

/// Input for `Catalog::create_product`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub unit_of_measure: Option<String>,
    pub category: Option<CategoryId>,
    pub low_stock_threshold: i64,
    pub expected_quantity: i64,
}

impl NewProduct {
    pub fn new(sku: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
            name: name.into(),
            unit_of_measure: None,
            category: None,
            low_stock_threshold: 0,
            expected_quantity: 0,
        }
    }

    pub fn with_expected_quantity(mut self, quantity: i64) -> Self {
        self.expected_quantity = quantity;
        self
    }

    pub fn with_low_stock_threshold(mut self, threshold: i64) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    pub fn with_category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_unit_of_measure(mut self, uom: impl Into<String>) -> Self {
        self.unit_of_measure = Some(uom.into());
        self
    }
}

/// Partial update of mutable product attributes. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub unit_of_measure: Option<String>,
    /// `Some(None)` clears the category.
    pub category: Option<Option<CategoryId>>,
    pub low_stock_threshold: Option<i64>,
    pub expected_quantity: Option<i64>,
}

pub(crate) fn non_blank(field: &str, value: &str) -> StockResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StockError::validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn non_negative(field: &str, value: i64) -> StockResult<i64> {
    if value < 0 {
        return Err(StockError::validation(format!(
            "{field} cannot be negative (got {value})"
        )));
    }
    Ok(value)
}
