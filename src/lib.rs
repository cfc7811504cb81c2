//! Host traffic monitor: captures packets to and from one host, keeps
//! per-peer, per-protocol byte counters for a fixed window and serves
//! them to a dashboard.

pub mod accumulator;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod netdetect;
pub mod query;
pub mod resetter;
pub mod sniff;
pub mod store;
