#![allow(dead_code)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use stockflow_auth::Actor;
use stockflow_catalog::{NewProduct, ProductUpdate};
use stockflow_core::{
    ActorId, DocumentKind, DocumentStatus, FixedClock, LocationId, ProductId, WarehouseId,
};
use stockflow_documents::{Document, LineInput, NewDocument};
use stockflow_engine::{EngineConfig, StockEngine};
use stockflow_topology::{NewLocation, NewWarehouse};

/// Two warehouses: A with L1/L2, B with B1. One product "ABC" expecting 50
/// units per receipt.
pub struct World {
    pub engine: StockEngine,
    pub clock: Arc<FixedClock>,
    pub manager: Actor,
    pub wh_a: WarehouseId,
    pub staff_a: Actor,
    pub l1: LocationId,
    pub l2: LocationId,
    pub wh_b: WarehouseId,
    pub staff_b: Actor,
    pub b1: LocationId,
    pub abc: ProductId,
}

pub fn world() -> World {
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
    ));
    let engine = StockEngine::new(EngineConfig::default(), clock.clone());
    let manager = Actor::manager(ActorId::new());

    let a = engine
        .create_warehouse(&manager, NewWarehouse::new("A", "Warehouse A"))
        .unwrap();
    let b = engine
        .create_warehouse(&manager, NewWarehouse::new("B", "Warehouse B"))
        .unwrap();
    let l1 = engine
        .create_location(&manager, a.warehouse.id, NewLocation::new("L1", "L1"))
        .unwrap()
        .id;
    let l2 = engine
        .create_location(&manager, a.warehouse.id, NewLocation::new("L2", "L2"))
        .unwrap()
        .id;
    let b1 = engine
        .create_location(&manager, b.warehouse.id, NewLocation::new("B1", "B1"))
        .unwrap()
        .id;
    let abc = engine
        .create_product(
            &manager,
            NewProduct::new("ABC", "Widget").with_expected_quantity(50),
        )
        .unwrap()
        .id;

    World {
        engine,
        clock,
        manager,
        wh_a: a.warehouse.id,
        staff_a: a.staff,
        l1,
        l2,
        wh_b: b.warehouse.id,
        staff_b: b.staff,
        b1,
        abc,
    }
}

impl World {
    /// Receive `quantity` units of `product` into `location` and validate.
    pub fn receive(&self, product: ProductId, location: LocationId, quantity: i64) -> Document {
        self.engine
            .update_product(&self.manager, product, ProductUpdate {
                expected_quantity: Some(quantity),
                ..ProductUpdate::default()
            })
            .unwrap();
        let warehouse = self.engine.topology().warehouse_of(location).unwrap();
        let doc = self
            .engine
            .create_document(
                &self.manager,
                NewDocument::new(DocumentKind::Receipt, warehouse, vec![LineInput::receipt(
                    product, location,
                )]),
            )
            .unwrap();
        self.engine
            .transition(&self.manager, doc.id_typed(), DocumentStatus::Done)
            .unwrap()
    }

    pub fn delivery(&self, actor: &Actor, location: LocationId, quantity: i64) -> Document {
        let warehouse = self.engine.topology().warehouse_of(location).unwrap();
        self.engine
            .create_document(
                actor,
                NewDocument::new(DocumentKind::Delivery, warehouse, vec![LineInput::delivery(
                    self.abc, location, quantity,
                )]),
            )
            .unwrap()
    }

    pub fn qty(&self, location: LocationId) -> i64 {
        self.engine
            .get_quantity(&self.manager, self.abc, location)
            .unwrap()
    }
}
