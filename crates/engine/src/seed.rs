//! Demo data: two warehouses, a handful of products and one document of each
//! kind, pushed through the engine the way an operator would.

use serde::Serialize;

use stockflow_auth::Actor;
use stockflow_catalog::{NewProduct, ReorderRule};
use stockflow_core::{ActorId, DocumentKind, DocumentStatus, StockResult};
use stockflow_documents::{Document, DocumentFilter, LineInput, NewDocument};
use stockflow_ledger::{MoveFilter, MoveRecord, StockFilter, StockLine};
use stockflow_topology::{NewLocation, NewWarehouse, Warehouse};

use crate::{LowStockAlert, ReorderSuggestion, StockEngine};

#[derive(Debug, Clone, Serialize)]
pub struct SeedReport {
    pub warehouses: Vec<Warehouse>,
    pub documents: Vec<Document>,
    pub stock: Vec<StockLine>,
    pub moves: Vec<MoveRecord>,
    pub low_stock: Vec<LowStockAlert>,
    pub reorder: Vec<ReorderSuggestion>,
}

pub fn run(engine: &StockEngine) -> StockResult<SeedReport> {
    let manager = Actor::manager(ActorId::new());

    let main = engine.create_warehouse(&manager, NewWarehouse::new("WH", "Main Warehouse"))?;
    let wh = main.warehouse.id;
    let stock1 = engine.create_location(&manager, wh, NewLocation::new("STOCK1", "Stock 1").default_location())?;
    let stock2 = engine.create_location(&manager, wh, NewLocation::new("STOCK2", "Stock 2"))?;

    let production = engine.create_warehouse(&manager, NewWarehouse::new("PROD", "Production"))?;
    engine.create_location(&manager, production.warehouse.id, NewLocation::new("RACK1", "Rack 1"))?;

    let raw = engine.create_category(&manager, "Raw Materials")?;
    let finished = engine.create_category(&manager, "Finished Goods")?;
    let packaging = engine.create_category(&manager, "Packaging")?;

    let steel = engine.create_product(
        &manager,
        NewProduct::new("STL-001", "Steel Rod")
            .with_category(raw.id)
            .with_unit_of_measure("kg")
            .with_expected_quantity(100)
            .with_low_stock_threshold(20),
    )?;
    let chair = engine.create_product(
        &manager,
        NewProduct::new("CHR-001", "Office Chair")
            .with_category(finished.id)
            .with_expected_quantity(20)
            .with_low_stock_threshold(5),
    )?;
    let boxes = engine.create_product(
        &manager,
        NewProduct::new("BOX-001", "Cardboard Box")
            .with_category(packaging.id)
            .with_expected_quantity(500)
            .with_low_stock_threshold(600),
    )?;

    // Staff of WH handle the day-to-day documents.
    let staff = main.staff;

    let receipt = engine.create_document(
        &staff,
        NewDocument::new(DocumentKind::Receipt, wh, vec![
            LineInput::receipt(steel.id, stock1.id),
            LineInput::receipt(boxes.id, stock1.id),
        ])
        .with_reference("WH/IN/0001")
        .with_contact("Acme Metals"),
    )?;
    engine.transition(&staff, receipt.id_typed(), DocumentStatus::Done)?;

    let delivery = engine.create_document(
        &staff,
        NewDocument::new(DocumentKind::Delivery, wh, vec![LineInput::delivery(chair.id, stock1.id, 15)])
            .with_reference("WH/OUT/0001")
            .with_contact("Northwind Offices"),
    )?;
    let delivery = engine.transition(&staff, delivery.id_typed(), DocumentStatus::Ready)?;
    tracing::info!(document = %delivery.id_typed(), status = %delivery.status(), "delivery confirmed");

    // Chairs arrive; the waiting delivery is promoted by the posting.
    let chairs_in = engine.create_document(
        &staff,
        NewDocument::new(DocumentKind::Receipt, wh, vec![LineInput::receipt(chair.id, stock1.id)])
            .with_reference("WH/IN/0002"),
    )?;
    engine.transition(&staff, chairs_in.id_typed(), DocumentStatus::Done)?;
    engine.transition(&staff, delivery.id_typed(), DocumentStatus::Done)?;

    engine.create_document(
        &staff,
        NewDocument::new(DocumentKind::InternalTransfer, wh, vec![LineInput::transfer(
            steel.id, stock1.id, stock2.id, 30,
        )])
        .scheduled(engine.today())
        .with_reference("WH/INT/0001"),
    )?;

    engine.set_reorder_rule(&manager, ReorderRule::new(boxes.id, wh, 600, 1000)?)?;

    Ok(SeedReport {
        warehouses: engine.topology().warehouses(),
        documents: engine.query_documents(&manager, DocumentFilter::default())?,
        stock: engine.query_stock(&manager, StockFilter::default())?.iter().collect(),
        moves: engine.query_moves(&manager, MoveFilter::default())?.iter().collect(),
        low_stock: engine.low_stock_alerts(&manager),
        reorder: engine.reorder_suggestions(&manager, wh)?,
    })
}
