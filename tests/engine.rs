use std::net::IpAddr;
use std::sync::Arc;
use std::thread;

use hostwatch::accumulator::Accumulator;
use hostwatch::config::ResetPolicy;
use hostwatch::models::domain::{PacketObservation, Protocol};
use hostwatch::query::{TrafficQuery, TrafficReport};
use hostwatch::store::AggregationStore;

const HOST: [u8; 4] = [192, 168, 0, 1];

fn obs(src: IpAddr, dst: IpAddr, length: u64, protocol: Protocol) -> PacketObservation {
    PacketObservation {
        source: src,
        destination: dst,
        length,
        protocol,
    }
}

fn engine(policy: ResetPolicy) -> (Arc<AggregationStore>, Arc<Accumulator>, TrafficQuery) {
    let store = Arc::new(AggregationStore::new());
    let acc = Arc::new(Accumulator::new(store.clone(), IpAddr::from(HOST)));
    let query = TrafficQuery::new(store.clone(), policy);
    (store, acc, query)
}

#[test]
fn worked_example_json_shape() {
    let (_, acc, query) = engine(ResetPolicy::TimerDriven);
    let host = IpAddr::from(HOST);
    let peer: IpAddr = "10.0.0.5".parse().unwrap();
    acc.ingest(&obs(host, peer, 100, Protocol::Tcp));
    acc.ingest(&obs(peer, host, 40, Protocol::Tcp));

    let TrafficReport::Peers(peers) = query.current_traffic() else {
        panic!("expected traffic");
    };
    assert_eq!(
        serde_json::to_value(peers).unwrap(),
        serde_json::json!({
            "10.0.0.5": {
                "inbound": 40,
                "outbound": 100,
                "protocols": {
                    "TCP": {"inbound": 40, "outbound": 100},
                    "UDP": {"inbound": 0, "outbound": 0},
                    "ICMP": {"inbound": 0, "outbound": 0},
                    "OTHER": {"inbound": 0, "outbound": 0}
                }
            }
        })
    );
}

#[test]
fn concurrent_ingestion_loses_nothing() {
    const THREADS: u64 = 8;
    const PER_THREAD: u64 = 10_000;
    const BYTES: u64 = 60;

    let (store, acc, _) = engine(ResetPolicy::TimerDriven);
    let host = IpAddr::from(HOST);
    let peer = IpAddr::from([10, 0, 0, 5]);

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let acc = acc.clone();
            thread::spawn(move || {
                for _ in 0..PER_THREAD {
                    acc.ingest(&obs(peer, host, BYTES, Protocol::Udp));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let snap = store.snapshot();
    let counters = &snap.peers[&peer];
    assert_eq!(counters.inbound(), THREADS * PER_THREAD * BYTES);
    assert_eq!(counters.protocol(Protocol::Udp).inbound, THREADS * PER_THREAD * BYTES);
    assert_eq!(counters.outbound(), 0);
    assert_eq!(acc.ingested(), THREADS * PER_THREAD);
}

#[test]
fn totals_match_protocol_sums_under_mixed_load() {
    let (store, acc, _) = engine(ResetPolicy::TimerDriven);
    let host = IpAddr::from(HOST);

    let handles: Vec<_> = (0..4u8)
        .map(|t| {
            let acc = acc.clone();
            thread::spawn(move || {
                for i in 0..2_000u64 {
                    let peer = IpAddr::from([10, 0, t, (i % 7) as u8]);
                    let protocol = Protocol::ALL[(i % 4) as usize];
                    if i % 2 == 0 {
                        acc.ingest(&obs(host, peer, i, protocol));
                    } else {
                        acc.ingest(&obs(peer, host, i, protocol));
                    }
                }
            })
        })
        .collect();

    // readers running alongside writers must never see a torn peer
    for _ in 0..200 {
        for counters in store.snapshot().peers.values() {
            let inbound: u64 = counters.protocols().map(|(_, c)| c.inbound).sum();
            let outbound: u64 = counters.protocols().map(|(_, c)| c.outbound).sum();
            assert_eq!(counters.inbound(), inbound);
            assert_eq!(counters.outbound(), outbound);
        }
    }
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(store.peer_count(), 4 * 7);
}

#[test]
fn drain_concurrent_with_ingestion_counts_each_packet_once() {
    const PACKETS: u64 = 50_000;

    let (_, acc, query) = engine(ResetPolicy::ReadDriven);
    let host = IpAddr::from(HOST);
    let peer = IpAddr::from([10, 0, 0, 5]);

    let writer = {
        let acc = acc.clone();
        thread::spawn(move || {
            for _ in 0..PACKETS {
                acc.ingest(&obs(host, peer, 1, Protocol::Tcp));
            }
        })
    };

    let mut seen = 0;
    let drain = |seen: &mut u64| {
        if let TrafficReport::Peers(peers) = query.current_traffic() {
            *seen += peers["10.0.0.5"].outbound;
        }
    };
    while !writer.is_finished() {
        drain(&mut seen);
    }
    writer.join().unwrap();
    drain(&mut seen);

    assert_eq!(seen, PACKETS);
    assert!(query.current_traffic().is_empty());
}

#[test]
fn drain_law() {
    let (_, acc, query) = engine(ResetPolicy::ReadDriven);
    acc.ingest(&obs(IpAddr::from(HOST), IpAddr::from([8, 8, 8, 8]), 512, Protocol::Udp));

    let first = query.current_traffic();
    assert!(matches!(&first, TrafficReport::Peers(p) if p["8.8.8.8"].outbound == 512));
    assert_eq!(query.current_traffic(), TrafficReport::Empty);
}
