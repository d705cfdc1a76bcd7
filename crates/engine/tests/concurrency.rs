mod common;

use std::sync::Barrier;
use std::thread;

use proptest::prelude::*;

use stockflow_core::{DocumentKind, DocumentStatus, StockError};
use stockflow_documents::{LineInput, NewDocument};
use stockflow_ledger::{MoveFilter, StockFilter};

use common::world;

#[test]
fn two_deliveries_race_for_forty_units() {
    for _ in 0..20 {
        let w = world();
        w.receive(w.abc, w.l1, 40);

        let ids: Vec<_> = (0..2)
            .map(|_| {
                let d = w.delivery(&w.staff_a, w.l1, 30);
                let d = w
                    .engine
                    .transition(&w.staff_a, d.id_typed(), DocumentStatus::Ready)
                    .unwrap();
                assert_eq!(d.status(), DocumentStatus::Ready);
                d.id_typed()
            })
            .collect();

        let barrier = Barrier::new(ids.len());
        let results: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = ids
                .iter()
                .map(|&id| {
                    let (w, barrier) = (&w, &barrier);
                    s.spawn(move || {
                        barrier.wait();
                        w.engine.transition(&w.staff_a, id, DocumentStatus::Done)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let done = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(done, 1, "{results:?}");
        for result in &results {
            if let Err(err) = result {
                assert!(matches!(
                    err,
                    StockError::InsufficientStock { .. } | StockError::ConcurrencyConflict(_)
                ));
            }
        }
        assert_eq!(w.qty(w.l1), 10);
        assert!(w.engine.audit(&w.manager).is_empty());
    }
}

#[test]
fn one_document_posts_once_under_racing_validations() {
    let w = world();
    w.receive(w.abc, w.l1, 100);
    let d = w.delivery(&w.manager, w.l1, 10);
    w.engine
        .transition(&w.manager, d.id_typed(), DocumentStatus::Ready)
        .unwrap();

    let barrier = Barrier::new(8);
    let ok = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let (w, barrier) = (&w, &barrier);
                let id = d.id_typed();
                s.spawn(move || {
                    barrier.wait();
                    w.engine.transition(&w.manager, id, DocumentStatus::Done)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| r.is_ok())
            .count()
    });

    assert_eq!(ok, 1);
    assert_eq!(w.qty(w.l1), 90);

    // Posted moves and the Done status travel together.
    let posted = w
        .engine
        .query_moves(&w.manager, MoveFilter {
            document: Some(d.id_typed()),
            ..MoveFilter::default()
        })
        .unwrap()
        .iter()
        .count();
    assert_eq!(posted, 1);
    assert_eq!(
        w.engine.get_document(&w.manager, d.id_typed()).unwrap().status(),
        DocumentStatus::Done
    );
}

#[derive(Debug, Clone)]
enum Op {
    Receive { at_l1: bool, qty: i64 },
    Deliver { at_l1: bool, qty: i64 },
    Transfer { l1_to_l2: bool, qty: i64 },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<bool>(), 1i64..40).prop_map(|(at_l1, qty)| Op::Receive { at_l1, qty }),
        (any::<bool>(), 1i64..60).prop_map(|(at_l1, qty)| Op::Deliver { at_l1, qty }),
        (any::<bool>(), 1i64..60).prop_map(|(l1_to_l2, qty)| Op::Transfer { l1_to_l2, qty }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn document_traffic_keeps_ledger_consistent(ops in prop::collection::vec(op(), 1..25)) {
        let w = world();
        let mut received = 0i64;
        let mut delivered = 0i64;

        for op in ops {
            match op {
                Op::Receive { at_l1, qty } => {
                    w.receive(w.abc, if at_l1 { w.l1 } else { w.l2 }, qty);
                    received += qty;
                }
                Op::Deliver { at_l1, qty } => {
                    let d = w.delivery(&w.staff_a, if at_l1 { w.l1 } else { w.l2 }, qty);
                    let d = w.engine.transition(&w.staff_a, d.id_typed(), DocumentStatus::Ready).unwrap();
                    if d.status() == DocumentStatus::Ready {
                        w.engine.transition(&w.staff_a, d.id_typed(), DocumentStatus::Done).unwrap();
                        delivered += qty;
                    }
                }
                Op::Transfer { l1_to_l2, qty } => {
                    let (from, to) = if l1_to_l2 { (w.l1, w.l2) } else { (w.l2, w.l1) };
                    let doc = w.engine.create_document(
                        &w.staff_a,
                        NewDocument::new(DocumentKind::InternalTransfer, w.wh_a, vec![
                            LineInput::transfer(w.abc, from, to, qty),
                        ]),
                    ).unwrap();
                    match w.engine.transition(&w.staff_a, doc.id_typed(), DocumentStatus::Done) {
                        Ok(_) => {}
                        Err(StockError::InsufficientStock { .. }) => {}
                        Err(other) => prop_assert!(false, "unexpected {other:?}"),
                    }
                }
            }
        }

        let lines: Vec<_> = w.engine.query_stock(&w.manager, StockFilter::default()).unwrap().iter().collect();
        prop_assert!(lines.iter().all(|l| l.quantity >= 0));
        prop_assert_eq!(lines.iter().map(|l| l.quantity).sum::<i64>(), received - delivered);
        prop_assert!(w.engine.audit(&w.manager).is_empty());
    }
}
