// store the per-peer counters for the current window
// on window expiry or drain: swap in a fresh window

use std::collections::HashMap;
use std::mem;
use std::net::IpAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::models::domain::PeerCounters;

/// Counters accumulated since `started_at`.
#[derive(Debug, Clone)]
pub struct Window {
    pub started_at: DateTime<Utc>,
    pub peers: HashMap<IpAddr, PeerCounters>,
}

impl Window {
    fn new() -> Self {
        Window {
            started_at: Utc::now(),
            peers: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

/// The single shared mutable resource of the engine.
///
/// Every read and write goes through one mutex. Writers hold it for one
/// observation, readers for one full copy; nothing blocks under it.
#[derive(Debug)]
pub struct AggregationStore {
    window: Mutex<Window>,
}

/// Exclusive access to the current window.
pub struct StoreGuard<'a> {
    window: MutexGuard<'a, Window>,
}

impl StoreGuard<'_> {
    pub fn get_or_insert_zeroed(&mut self, peer: IpAddr) -> &mut PeerCounters {
        self.window.peers.entry(peer).or_default()
    }
}

impl AggregationStore {
    pub fn new() -> Self {
        AggregationStore {
            window: Mutex::new(Window::new()),
        }
    }

    // `PeerCounters::record` cannot panic, so a poisoned lock still guards
    // consistent counters.
    fn window(&self) -> MutexGuard<'_, Window> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn lock(&self) -> StoreGuard<'_> {
        StoreGuard {
            window: self.window(),
        }
    }

    pub fn snapshot(&self) -> Window {
        self.window().clone()
    }

    /// Returns the number of peers that were dropped.
    pub fn clear(&self) -> usize {
        let mut window = self.window();
        let cleared = window.peers.len();
        *window = Window::new();
        cleared
    }

    /// Copy-then-clear as one critical section.
    pub fn drain_snapshot(&self) -> Window {
        mem::replace(&mut *self.window(), Window::new())
    }

    pub fn peer_count(&self) -> usize {
        self.window().peers.len()
    }

    pub fn window_started_at(&self) -> DateTime<Utc> {
        self.window().started_at
    }
}

impl Default for AggregationStore {
    fn default() -> Self {
        Self::new()
    }
}
