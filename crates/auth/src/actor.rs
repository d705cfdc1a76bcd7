use serde::{Deserialize, Serialize};

use stockflow_core::{ActorId, WarehouseId};

use crate::Role;

/// An authenticated actor as handed in by the identity layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub role: Role,
}

impl Actor {
    pub fn manager(id: ActorId) -> Self {
        Self {
            id,
            role: Role::Manager,
        }
    }

    pub fn staff(id: ActorId, warehouse: WarehouseId) -> Self {
        Self {
            id,
            role: Role::Staff { warehouse },
        }
    }

    pub fn is_manager(&self) -> bool {
        matches!(self.role, Role::Manager)
    }

    pub fn bound_warehouse(&self) -> Option<WarehouseId> {
        self.role.bound_warehouse()
    }
}
