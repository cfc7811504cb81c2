use std::net::SocketAddr;

use thiserror::Error;

/// Errors raised while opening or reading the packet capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no capture device available: {0}")]
    NoDevice(#[source] pcap::Error),

    #[error("failed to open capture on {interface}: {source}")]
    Open {
        interface: String,
        #[source]
        source: pcap::Error,
    },

    #[error("invalid capture filter {filter:?}: {source}")]
    Filter {
        filter: String,
        #[source]
        source: pcap::Error,
    },

    #[error("capture on {interface} failed: {source}")]
    Read {
        interface: String,
        #[source]
        source: pcap::Error,
    },
}

impl CaptureError {
    pub fn open(interface: impl Into<String>, source: pcap::Error) -> Self {
        Self::Open {
            interface: interface.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not enumerate capture devices: {0}")]
    DeviceList(#[source] pcap::Error),

    #[error("interface {0:?} does not exist")]
    UnknownInterface(String),
}

/// Errors from the dashboard HTTP server.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to bind dashboard to {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: hyper::Error,
    },

    #[error("dashboard server failed: {0}")]
    Serve(#[source] hyper::Error),
}
