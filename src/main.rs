use std::error::Error;
use std::sync::Arc;
use std::thread;

use clap::Parser;
use crossbeam_channel::unbounded;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use hostwatch::accumulator::Accumulator;
use hostwatch::config::{Cli, Config, ResetPolicy};
use hostwatch::dashboard::{self, DashboardState};
use hostwatch::netdetect;
use hostwatch::query::TrafficQuery;
use hostwatch::resetter::WindowResetter;
use hostwatch::sniff::{CaptureConfig, Sniffer};
use hostwatch::store::AggregationStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let (host, interface) = netdetect::resolve(cli.host, cli.interface.clone())?;
    let config = Arc::new(Config::from_cli(cli, host, interface));
    info!(
        host = %config.host,
        interface = config.interface.as_deref().unwrap_or("default"),
        window_secs = config.window_secs,
        reset_policy = ?config.reset_policy,
        "starting hostwatch"
    );

    // Opened here so that a missing device or permission error stops startup.
    let sniffer = Sniffer::open(&CaptureConfig {
        interface: config.interface.clone(),
        host: config.host,
        snaplen: config.snaplen,
    })?;

    let store = Arc::new(AggregationStore::new());
    let accumulator = Arc::new(Accumulator::new(store.clone(), config.host));
    let (tx, rx) = unbounded();

    thread::Builder::new()
        .name("capture".into())
        .spawn(move || {
            let interface = sniffer.interface().to_string();
            if let Err(e) = sniffer.run(tx) {
                error!(%interface, error = %e, "packet capture stopped");
            }
        })?;

    let ingest = accumulator.clone();
    thread::Builder::new()
        .name("ingest".into())
        .spawn(move || ingest.run(rx))?;

    if config.reset_policy == ResetPolicy::TimerDriven {
        tokio::spawn(WindowResetter::new(store.clone(), config.window()).run());
    }

    let state = DashboardState {
        query: TrafficQuery::new(store.clone(), config.reset_policy),
        store,
        accumulator,
        config,
    };
    dashboard::serve(state).await?;
    Ok(())
}
