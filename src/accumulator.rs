use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::Receiver;
use tracing::{info, trace};

use crate::models::domain::{Direction, PacketObservation};
use crate::store::AggregationStore;

/// Works out which end of `observation` is the peer and which way the
/// bytes flowed. `None` when the host is on neither end.
pub fn classify(observation: &PacketObservation, host: IpAddr) -> Option<(IpAddr, Direction)> {
    if observation.source == host {
        Some((observation.destination, Direction::Outbound))
    } else if observation.destination == host {
        Some((observation.source, Direction::Inbound))
    } else {
        None
    }
}

/// Folds packet observations into an [`AggregationStore`].
pub struct Accumulator {
    store: Arc<AggregationStore>,
    host: IpAddr,
    ingested: AtomicU64,
    discarded: AtomicU64,
}

impl Accumulator {
    pub fn new(store: Arc<AggregationStore>, host: IpAddr) -> Self {
        Accumulator {
            store,
            host,
            ingested: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }

    /// Records one observation. Packets that do not involve the host are
    /// dropped without touching the store.
    pub fn ingest(&self, observation: &PacketObservation) -> Option<Direction> {
        let Some((peer, direction)) = classify(observation, self.host) else {
            self.discarded.fetch_add(1, Ordering::Relaxed);
            trace!(
                source = %observation.source,
                destination = %observation.destination,
                "discarding observation not involving host"
            );
            return None;
        };

        self.store
            .lock()
            .get_or_insert_zeroed(peer)
            .record(observation.protocol, direction, observation.length);
        self.ingested.fetch_add(1, Ordering::Relaxed);
        Some(direction)
    }

    /// Drains `rx` until every sender is gone.
    pub fn run(&self, rx: Receiver<PacketObservation>) {
        for observation in rx {
            self.ingest(&observation);
        }
        info!(
            ingested = self.ingested(),
            discarded = self.discarded(),
            "observation channel closed, ingestion stopped"
        );
    }

    pub fn ingested(&self) -> u64 {
        self.ingested.load(Ordering::Relaxed)
    }

    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }
}
