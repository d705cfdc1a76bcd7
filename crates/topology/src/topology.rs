use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Serialize;

use stockflow_auth::Actor;
use stockflow_core::{ActorId, LocationId, StockError, StockResult, WarehouseId};

use crate::{Location, NewLocation, NewWarehouse, Warehouse};

/// Result of creating a warehouse: the warehouse plus the staff actor bound to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionedWarehouse {
    pub warehouse: Warehouse,
    pub staff: Actor,
}

#[derive(Debug, Default)]
struct TopologyState {
    warehouses: HashMap<WarehouseId, Warehouse>,
    locations: HashMap<LocationId, Location>,
    staff: HashMap<WarehouseId, Actor>,
}

/// In-memory warehouse/location registry.
#[derive(Debug, Default)]
pub struct Topology {
    state: RwLock<TopologyState>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a warehouse and provision its single staff binding.
    pub fn create_warehouse(&self, new: NewWarehouse) -> StockResult<ProvisionedWarehouse> {
        let code = required("warehouse code", &new.code)?;
        let name = required("warehouse name", &new.name)?;

        let mut state = self.state.write();
        if state.warehouses.values().any(|w| w.code == code) {
            return Err(StockError::validation(format!(
                "warehouse code '{code}' already exists"
            )));
        }

        let warehouse = Warehouse {
            id: WarehouseId::new(),
            code,
            name,
            address: new.address.trim().to_string(),
        };
        let staff = Actor::staff(ActorId::new(), warehouse.id);

        state.warehouses.insert(warehouse.id, warehouse.clone());
        state.staff.insert(warehouse.id, staff);
        tracing::info!(
            warehouse = %warehouse.id,
            code = %warehouse.code,
            staff = %staff.id,
            "warehouse provisioned"
        );

        Ok(ProvisionedWarehouse { warehouse, staff })
    }

    pub fn warehouse(&self, id: WarehouseId) -> StockResult<Warehouse> {
        self.state
            .read()
            .warehouses
            .get(&id)
            .cloned()
            .ok_or_else(|| StockError::not_found("warehouse", id))
    }

    /// All warehouses ordered by code.
    pub fn warehouses(&self) -> Vec<Warehouse> {
        let mut all: Vec<Warehouse> = self.state.read().warehouses.values().cloned().collect();
        all.sort_by(|a, b| a.code.cmp(&b.code));
        all
    }

    pub fn staff_for(&self, warehouse: WarehouseId) -> StockResult<Actor> {
        self.state
            .read()
            .staff
            .get(&warehouse)
            .copied()
            .ok_or_else(|| StockError::not_found("warehouse", warehouse))
    }

    /// Add a location. The first location of a warehouse becomes its default.
    pub fn create_location(
        &self,
        warehouse: WarehouseId,
        new: NewLocation,
    ) -> StockResult<Location> {
        let code = required("location code", &new.code)?;
        let name = required("location name", &new.name)?;

        let mut state = self.state.write();
        if !state.warehouses.contains_key(&warehouse) {
            return Err(StockError::not_found("warehouse", warehouse));
        }

        let siblings: Vec<&Location> = state
            .locations
            .values()
            .filter(|l| l.warehouse == warehouse)
            .collect();
        if siblings.iter().any(|l| l.code == code) {
            return Err(StockError::validation(format!(
                "location code '{code}' already exists in warehouse"
            )));
        }
        let is_default = new.is_default || siblings.is_empty();

        if is_default {
            for location in state.locations.values_mut() {
                if location.warehouse == warehouse {
                    location.is_default = false;
                }
            }
        }

        let location = Location {
            id: LocationId::new(),
            warehouse,
            code,
            name,
            is_default,
        };
        state.locations.insert(location.id, location.clone());
        Ok(location)
    }

    pub fn location(&self, id: LocationId) -> StockResult<Location> {
        self.state
            .read()
            .locations
            .get(&id)
            .cloned()
            .ok_or_else(|| StockError::invalid_location(id, "unknown location"))
    }

    /// Warehouse owning `location`.
    pub fn warehouse_of(&self, location: LocationId) -> StockResult<WarehouseId> {
        self.location(location).map(|l| l.warehouse)
    }

    /// Resolve `location` and require it to sit in `warehouse`.
    pub fn location_in(&self, location: LocationId, warehouse: WarehouseId) -> StockResult<Location> {
        let resolved = self.location(location)?;
        if resolved.warehouse != warehouse {
            return Err(StockError::invalid_location(
                location,
                format!("belongs to warehouse {}, expected {warehouse}", resolved.warehouse),
            ));
        }
        Ok(resolved)
    }

    /// Locations of one warehouse ordered by code.
    pub fn locations_in(&self, warehouse: WarehouseId) -> Vec<Location> {
        let mut found: Vec<Location> = self
            .state
            .read()
            .locations
            .values()
            .filter(|l| l.warehouse == warehouse)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.code.cmp(&b.code));
        found
    }

    pub fn default_location(&self, warehouse: WarehouseId) -> Option<Location> {
        self.locations_in(warehouse).into_iter().find(|l| l.is_default)
    }
}

fn required(field: &str, value: &str) -> StockResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StockError::validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creating_warehouse_provisions_exactly_one_staff_binding() {
        let topology = Topology::new();
        let provisioned = topology
            .create_warehouse(NewWarehouse::new("WH", "Main Warehouse"))
            .unwrap();

        assert_eq!(
            provisioned.staff.bound_warehouse(),
            Some(provisioned.warehouse.id)
        );
        assert_eq!(
            topology.staff_for(provisioned.warehouse.id).unwrap(),
            provisioned.staff
        );
    }

    #[test]
    fn warehouse_codes_are_unique() {
        let topology = Topology::new();
        topology.create_warehouse(NewWarehouse::new("WH", "A")).unwrap();
        assert!(topology.create_warehouse(NewWarehouse::new(" WH ", "B")).is_err());
    }

    #[test]
    fn first_location_becomes_default_and_later_default_replaces_it() {
        let topology = Topology::new();
        let wh = topology
            .create_warehouse(NewWarehouse::new("WH", "Main"))
            .unwrap()
            .warehouse;

        let first = topology.create_location(wh.id, NewLocation::new("STOCK1", "Stock 1")).unwrap();
        assert!(first.is_default);

        let second = topology
            .create_location(wh.id, NewLocation::new("STOCK2", "Stock 2").default_location())
            .unwrap();
        assert_eq!(topology.default_location(wh.id).unwrap().id, second.id);
        assert!(!topology.location(first.id).unwrap().is_default);
    }

    #[test]
    fn location_codes_only_clash_within_a_warehouse() {
        let topology = Topology::new();
        let a = topology.create_warehouse(NewWarehouse::new("A", "A")).unwrap().warehouse;
        let b = topology.create_warehouse(NewWarehouse::new("B", "B")).unwrap().warehouse;

        topology.create_location(a.id, NewLocation::new("STOCK", "s")).unwrap();
        assert!(topology.create_location(a.id, NewLocation::new("STOCK", "s")).is_err());
        assert!(topology.create_location(b.id, NewLocation::new("STOCK", "s")).is_ok());
    }

    #[test]
    fn location_in_rejects_foreign_warehouse() {
        let topology = Topology::new();
        let a = topology.create_warehouse(NewWarehouse::new("A", "A")).unwrap().warehouse;
        let b = topology.create_warehouse(NewWarehouse::new("B", "B")).unwrap().warehouse;
        let loc = topology.create_location(a.id, NewLocation::new("L1", "L1")).unwrap();

        assert!(topology.location_in(loc.id, a.id).is_ok());
        let err = topology.location_in(loc.id, b.id).unwrap_err();
        assert!(matches!(err, StockError::InvalidLocation { .. }));
    }

    #[test]
    fn unknown_location_is_invalid_location() {
        let topology = Topology::new();
        let err = topology.warehouse_of(LocationId::new()).unwrap_err();
        assert!(matches!(err, StockError::InvalidLocation { .. }));
    }
}
