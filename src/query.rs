use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::ResetPolicy;
use crate::models::dto::PeerTrafficDTO;
use crate::store::{AggregationStore, Window};

/// Result of [`TrafficQuery::current_traffic`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrafficReport {
    /// No peer has been seen since the window opened.
    Empty,
    /// Keyed by the peer's textual address.
    Peers(BTreeMap<String, PeerTrafficDTO>),
}

impl TrafficReport {
    fn from_window(window: &Window) -> Self {
        if window.is_empty() {
            return TrafficReport::Empty;
        }
        TrafficReport::Peers(
            window
                .peers
                .iter()
                .map(|(peer, counters)| (peer.to_string(), counters.into()))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, TrafficReport::Empty)
    }
}

/// Read side of the engine handed to the HTTP layer.
#[derive(Debug, Clone)]
pub struct TrafficQuery {
    store: Arc<AggregationStore>,
    policy: ResetPolicy,
}

impl TrafficQuery {
    pub fn new(store: Arc<AggregationStore>, policy: ResetPolicy) -> Self {
        TrafficQuery { store, policy }
    }

    /// Under [`ResetPolicy::ReadDriven`] this also empties the store.
    pub fn current_traffic(&self) -> TrafficReport {
        let window = match self.policy {
            ResetPolicy::TimerDriven => self.store.snapshot(),
            ResetPolicy::ReadDriven => self.store.drain_snapshot(),
        };
        TrafficReport::from_window(&window)
    }
}
