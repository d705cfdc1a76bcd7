use serde::{Deserialize, Serialize};

use stockflow_core::WarehouseId;

/// Actor role.
///
/// Staff carry their single bound warehouse in the role itself so a staff
/// actor without a binding cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Role {
    Manager,
    Staff { warehouse: WarehouseId },
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manager => "manager",
            Role::Staff { .. } => "staff",
        }
    }

    pub fn bound_warehouse(&self) -> Option<WarehouseId> {
        match self {
            Role::Manager => None,
            Role::Staff { warehouse } => Some(*warehouse),
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
