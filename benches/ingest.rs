use std::net::IpAddr;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use hostwatch::accumulator::Accumulator;
use hostwatch::models::domain::{PacketObservation, Protocol};
use hostwatch::store::AggregationStore;

fn ingest(c: &mut Criterion) {
    let host = IpAddr::from([192, 168, 0, 1]);
    let store = Arc::new(AggregationStore::new());
    let acc = Accumulator::new(store.clone(), host);
    let observations: Vec<_> = (0..1024u32)
        .map(|i| PacketObservation {
            source: host,
            destination: IpAddr::from([10, 0, (i >> 8) as u8, i as u8]),
            length: 1500,
            protocol: Protocol::ALL[(i % 4) as usize],
        })
        .collect();

    c.bench_function("ingest 1024 observations", |b| {
        b.iter(|| {
            for obs in &observations {
                black_box(acc.ingest(obs));
            }
        })
    });

    c.bench_function("snapshot 1024 peers", |b| b.iter(|| black_box(store.snapshot())));
}

criterion_group!(benches, ingest);
criterion_main!(benches);
