//! Topology: warehouses and the locations inside them.

pub mod topology;
pub mod warehouse;

pub use topology::{ProvisionedWarehouse, Topology};
pub use warehouse::{Location, NewLocation, NewWarehouse, Warehouse};
