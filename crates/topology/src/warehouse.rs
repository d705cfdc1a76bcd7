use serde::{Deserialize, Serialize};

use stockflow_core::{LocationId, WarehouseId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    /// Short unique code, e.g. `WH`.
    pub code: String,
    pub name: String,
    pub address: String,
}

/// Storage location. `warehouse` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub warehouse: WarehouseId,
    /// Unique within the warehouse, e.g. `STOCK1`.
    pub code: String,
    pub name: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWarehouse {
    pub code: String,
    pub name: String,
    pub address: String,
}

impl NewWarehouse {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            address: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLocation {
    pub code: String,
    pub name: String,
    pub is_default: bool,
}

impl NewLocation {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            is_default: false,
        }
    }

    pub fn default_location(mut self) -> Self {
        self.is_default = true;
        self
    }
}
