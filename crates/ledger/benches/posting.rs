use std::sync::Arc;
use std::thread;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use stockflow_catalog::{Catalog, NewProduct};
use stockflow_core::{ActorId, DocumentId, DocumentKind, DocumentRef, LocationId, ProductId, SystemClock, WarehouseId};
use stockflow_ledger::{LedgerConfig, MoveRequest, StockLedger};
use stockflow_topology::{NewLocation, NewWarehouse, Topology};

struct Bench {
    ledger: Arc<StockLedger>,
    product: ProductId,
    warehouse: WarehouseId,
    locations: Vec<LocationId>,
}

fn setup(location_count: usize) -> Bench {
    let catalog = Arc::new(Catalog::new());
    let topology = Arc::new(Topology::new());
    let product = catalog
        .create_product(NewProduct::new("BENCH", "Bench item"))
        .expect("product")
        .id;
    let warehouse = topology
        .create_warehouse(NewWarehouse::new("WH", "Bench"))
        .expect("warehouse")
        .warehouse
        .id;
    let locations = (0..location_count)
        .map(|i| {
            topology
                .create_location(warehouse, NewLocation::new(format!("L{i}"), format!("L{i}")))
                .expect("location")
                .id
        })
        .collect();

    let ledger = Arc::new(StockLedger::new(
        catalog,
        topology,
        Arc::new(SystemClock),
        LedgerConfig::default(),
    ));
    Bench {
        ledger,
        product,
        warehouse,
        locations,
    }
}

fn receipt(bench: &Bench, location: LocationId) -> MoveRequest {
    MoveRequest {
        product: bench.product,
        from: None,
        to: Some(location),
        quantity: 1,
        warehouse: bench.warehouse,
        document: DocumentRef::new(DocumentId::new(), DocumentKind::Receipt),
        actor: ActorId::new(),
    }
}

fn bench_single_thread_posting(c: &mut Criterion) {
    let mut group = c.benchmark_group("posting/single_thread");
    group.throughput(Throughput::Elements(1));

    let bench = setup(1);
    let location = bench.locations[0];
    group.bench_function("receipt", |b| {
        b.iter(|| black_box(bench.ledger.post_move(receipt(&bench, location))))
    });
    group.finish();
}

fn bench_contended_posting(c: &mut Criterion) {
    let mut group = c.benchmark_group("posting/contended");

    for threads in [2usize, 4, 8] {
        group.throughput(Throughput::Elements(threads as u64 * 100));
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            let bench = Arc::new(setup(1));
            b.iter(|| {
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let bench = Arc::clone(&bench);
                        thread::spawn(move || {
                            let location = bench.locations[0];
                            for _ in 0..100 {
                                let _ = bench.ledger.post_move(receipt(&bench, location));
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    let _ = handle.join();
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_single_thread_posting, bench_contended_posting);
criterion_main!(benches);
