//! Command line / environment configuration.
//!
//! A `.env` file is loaded before parsing so every flag can also come from
//! there (see the `env` names below).

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::Serialize;

/// When the window's counters are thrown away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResetPolicy {
    /// A background timer clears the window every `window_secs`.
    #[default]
    #[value(name = "timer")]
    TimerDriven,
    /// Every query drains the window.
    #[value(name = "read")]
    ReadDriven,
}

/// What `/traffic` answers when no peer has been seen in the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyResponse {
    /// `{}`
    #[default]
    Object,
    /// `{"message": "..."}`
    Message,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "hostwatch", version, about = "Per-peer host traffic monitor")]
pub struct Cli {
    /// Address of this host; auto-detected when omitted
    #[arg(long, env = "HOSTWATCH_HOST")]
    pub host: Option<IpAddr>,

    /// Interface to capture on; auto-detected when omitted
    #[arg(long, env = "HOSTWATCH_INTERFACE")]
    pub interface: Option<String>,

    /// Length of one aggregation window in seconds
    #[arg(
        long,
        env = "HOSTWATCH_WINDOW_SECS",
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub window_secs: u64,

    #[arg(
        long,
        env = "HOSTWATCH_RESET_POLICY",
        value_enum,
        default_value_t = ResetPolicy::TimerDriven
    )]
    pub reset_policy: ResetPolicy,

    /// Dashboard API listen address
    #[arg(long, env = "HOSTWATCH_LISTEN", default_value = "0.0.0.0:5000")]
    pub listen: SocketAddr,

    #[arg(
        long,
        env = "HOSTWATCH_EMPTY_RESPONSE",
        value_enum,
        default_value_t = EmptyResponse::Object
    )]
    pub empty_response: EmptyResponse,

    /// Bytes captured per packet (only headers are decoded)
    #[arg(long, env = "HOSTWATCH_SNAPLEN", default_value_t = 65535)]
    pub snaplen: i32,
}

/// Fully resolved settings, after host/interface detection.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub host: IpAddr,
    pub interface: Option<String>,
    pub window_secs: u64,
    pub reset_policy: ResetPolicy,
    pub listen: SocketAddr,
    pub empty_response: EmptyResponse,
    pub snaplen: i32,
}

impl Config {
    pub fn from_cli(cli: Cli, host: IpAddr, interface: Option<String>) -> Self {
        Config {
            host,
            interface,
            window_secs: cli.window_secs,
            reset_policy: cli.reset_policy,
            listen: cli.listen,
            empty_response: cli.empty_response,
            snaplen: cli.snaplen,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}
