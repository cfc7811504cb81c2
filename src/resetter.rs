use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

use crate::store::AggregationStore;

/// Clears the store once per window, for as long as the process runs.
pub struct WindowResetter {
    store: Arc<AggregationStore>,
    window: Duration,
}

impl WindowResetter {
    pub fn new(store: Arc<AggregationStore>, window: Duration) -> Self {
        WindowResetter { store, window }
    }

    pub fn reset_once(&self) -> usize {
        let cleared = self.store.clear();
        debug!(peers = cleared, "traffic window reset");
        cleared
    }

    /// Never returns. Takes `self` so a resetter can only be running once.
    pub async fn run(self) {
        let mut interval = time::interval_at(Instant::now() + self.window, self.window);
        // A late tick stretches the current window instead of firing twice.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            self.reset_once();
        }
    }
}
