mod common;

use stockflow_core::{DenialKind, DocumentKind, DocumentStatus, StockError};
use stockflow_documents::{DocumentFilter, LineInput, NewDocument};
use stockflow_ledger::{MoveFilter, StockFilter};
use stockflow_topology::NewWarehouse;

use common::{World, world};

fn denied(result: Result<impl core::fmt::Debug, StockError>) -> DenialKind {
    match result {
        Err(StockError::AccessDenied(denial)) => denial.kind,
        other => panic!("expected AccessDenied, got {other:?}"),
    }
}

/// A: 50 units at L1 plus a delivery. B: 30 units at B1 plus a delivery.
fn stocked() -> World {
    let w = world();
    w.receive(w.abc, w.l1, 50);
    w.receive(w.abc, w.b1, 30);
    w.delivery(&w.staff_a, w.l1, 5);
    w.delivery(&w.staff_b, w.b1, 5);
    w
}

#[test]
fn staff_reads_are_prefiltered_to_bound_warehouse() {
    let w = stocked();

    let stock: Vec<_> = w
        .engine
        .query_stock(&w.staff_a, StockFilter::default())
        .unwrap()
        .iter()
        .collect();
    assert_eq!(stock.len(), 1);
    assert!(stock.iter().all(|l| l.warehouse == w.wh_a));

    let moves: Vec<_> = w
        .engine
        .query_moves(&w.staff_a, MoveFilter::default())
        .unwrap()
        .iter()
        .collect();
    assert_eq!(moves.len(), 1);
    assert!(moves.iter().all(|m| m.warehouse == w.wh_a));

    let docs = w
        .engine
        .query_documents(&w.staff_a, DocumentFilter::default())
        .unwrap();
    assert!(docs.iter().all(|d| d.warehouse() == w.wh_a));
    assert_eq!(docs.len(), 2);

    // The manager sees both warehouses.
    let all = w
        .engine
        .query_stock(&w.manager, StockFilter::default())
        .unwrap()
        .iter()
        .count();
    assert_eq!(all, 2);
}

#[test]
fn naming_a_foreign_warehouse_is_denied_not_emptied() {
    let w = stocked();

    let by_warehouse = StockFilter {
        warehouse: Some(w.wh_b),
        ..StockFilter::default()
    };
    assert_eq!(denied(w.engine.query_stock(&w.staff_a, by_warehouse)), DenialKind::OutOfScope);

    let by_location = StockFilter {
        location: Some(w.b1),
        ..StockFilter::default()
    };
    assert_eq!(denied(w.engine.query_stock(&w.staff_a, by_location)), DenialKind::OutOfScope);

    let moves_at_b1 = MoveFilter {
        location: Some(w.b1),
        ..MoveFilter::default()
    };
    assert_eq!(denied(w.engine.query_moves(&w.staff_a, moves_at_b1)), DenialKind::OutOfScope);

    let docs_in_b = DocumentFilter {
        warehouse: Some(w.wh_b),
        ..DocumentFilter::default()
    };
    assert_eq!(denied(w.engine.query_documents(&w.staff_a, docs_in_b)), DenialKind::OutOfScope);

    assert_eq!(
        denied(w.engine.get_quantity(&w.staff_a, w.abc, w.b1)),
        DenialKind::OutOfScope
    );
    assert_eq!(
        denied(w.engine.reorder_suggestions(&w.staff_a, w.wh_b)),
        DenialKind::OutOfScope
    );
}

#[test]
fn staff_cannot_touch_foreign_documents() {
    let w = stocked();
    let foreign = w
        .engine
        .query_documents(&w.staff_b, DocumentFilter {
            kind: Some(DocumentKind::Delivery),
            ..DocumentFilter::default()
        })
        .unwrap()
        .remove(0);

    denied(w.engine.get_document(&w.staff_a, foreign.id_typed()));
    denied(w.engine.transition(&w.staff_a, foreign.id_typed(), DocumentStatus::Cancelled));
    denied(w.engine.edit_document(&w.staff_a, foreign.id_typed(), Default::default()));

    let untouched = w.engine.get_document(&w.staff_b, foreign.id_typed()).unwrap();
    assert_eq!(untouched.status(), DocumentStatus::Draft);
    assert_eq!(untouched, foreign);
}

#[test]
fn staff_cannot_create_outside_their_warehouse() {
    let w = stocked();

    let in_b = NewDocument::new(DocumentKind::Delivery, w.wh_b, vec![LineInput::delivery(
        w.abc, w.b1, 1,
    )]);
    denied(w.engine.create_document(&w.staff_a, in_b));

    // Document scoped to A but drawing from B's location.
    let sneaky = NewDocument::new(DocumentKind::Delivery, w.wh_a, vec![LineInput::delivery(
        w.abc, w.b1, 1,
    )]);
    denied(w.engine.create_document(&w.staff_a, sneaky));

    let transfer_out = NewDocument::new(DocumentKind::InternalTransfer, w.wh_a, vec![
        LineInput::transfer(w.abc, w.l1, w.b1, 1),
    ]);
    denied(w.engine.create_document(&w.staff_a, transfer_out));

    assert_eq!(w.engine.get_quantity(&w.manager, w.abc, w.b1).unwrap(), 30);
}

#[test]
fn master_data_is_manager_only() {
    let w = world();
    assert_eq!(
        denied(w.engine.create_warehouse(&w.staff_a, NewWarehouse::new("C", "C"))),
        DenialKind::ManagerOnly
    );
    assert_eq!(
        denied(w.engine.create_category(&w.staff_a, "Tools")),
        DenialKind::ManagerOnly
    );
    assert_eq!(
        denied(w.engine.set_product_active(&w.staff_a, w.abc, false)),
        DenialKind::ManagerOnly
    );
    assert!(w.engine.catalog().product(w.abc).unwrap().active);
}

#[test]
fn alerts_and_audit_respect_scope() {
    let w = world();
    w.engine
        .update_product(&w.manager, w.abc, stockflow_catalog::ProductUpdate {
            low_stock_threshold: Some(100),
            ..Default::default()
        })
        .unwrap();
    w.receive(w.abc, w.b1, 30);

    let alerts = w.engine.low_stock_alerts(&w.staff_a);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].warehouse, w.wh_a);
    assert!(alerts[0].out_of_stock);

    assert_eq!(w.engine.low_stock_alerts(&w.manager).len(), 2);
    assert!(w.engine.audit(&w.staff_a).is_empty());
}
