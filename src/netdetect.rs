//! Host address and capture interface detection.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use pcap::Device;
use tracing::{info, warn};

use crate::error::ConfigError;

/// Any routable address works; no packet is ever sent to it.
const PROBE_TARGET: (Ipv4Addr, u16) = (Ipv4Addr::new(8, 8, 8, 8), 80);

/// Address of the interface carrying the default route, found by
/// "connecting" a UDP socket and reading back its local address.
/// Falls back to loopback when the host has no route out.
pub fn detect_host_address() -> IpAddr {
    match probe_local_address() {
        Ok(addr) => addr,
        Err(e) => {
            warn!(error = %e, "could not detect host address, falling back to 127.0.0.1");
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
    }
}

fn probe_local_address() -> std::io::Result<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.connect(PROBE_TARGET)?;
    Ok(socket.local_addr()?.ip())
}

/// Name of the first interface that owns `host`.
pub fn interface_for<'a, I>(host: IpAddr, interfaces: I) -> Option<String>
where
    I: IntoIterator<Item = (&'a str, Vec<IpAddr>)>,
{
    interfaces
        .into_iter()
        .find(|(_, addrs)| addrs.contains(&host))
        .map(|(name, _)| name.to_string())
}

/// Fills in whatever the user did not specify. An explicit interface must exist.
pub fn resolve(
    host: Option<IpAddr>,
    interface: Option<String>,
) -> Result<(IpAddr, Option<String>), ConfigError> {
    let host = match host {
        Some(host) => host,
        None => {
            let detected = detect_host_address();
            info!(host = %detected, "detected host address");
            detected
        }
    };

    let devices = Device::list().map_err(ConfigError::DeviceList)?;
    let listing = || {
        devices.iter().map(|d| {
            (
                d.name.as_str(),
                d.addresses.iter().map(|a| a.addr).collect::<Vec<_>>(),
            )
        })
    };

    let interface = match interface {
        Some(name) => {
            if !devices.iter().any(|d| d.name == name) {
                return Err(ConfigError::UnknownInterface(name));
            }
            Some(name)
        }
        None => match interface_for(host, listing()) {
            Some(name) => {
                info!(interface = %name, "detected capture interface");
                Some(name)
            }
            None => {
                warn!(
                    host = %host,
                    "no interface owns the host address, using the default capture device"
                );
                None
            }
        },
    };

    Ok((host, interface))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_interface_owning_host() {
        let host = IpAddr::from([192, 168, 0, 10]);
        let interfaces = vec![
            ("lo", vec![IpAddr::from([127, 0, 0, 1])]),
            ("eth0", vec!["fe80::1".parse().unwrap(), host]),
            ("eth1", vec![host]),
        ];
        assert_eq!(interface_for(host, interfaces).as_deref(), Some("eth0"));
    }

    #[test]
    fn no_owner_means_none() {
        let interfaces = vec![("lo", vec![IpAddr::from([127, 0, 0, 1])])];
        assert_eq!(interface_for(IpAddr::from([10, 0, 0, 1]), interfaces), None);
    }

    #[test]
    fn detected_address_is_ipv4() {
        // either a real route or the loopback fallback
        assert!(detect_host_address().is_ipv4());
    }
}
