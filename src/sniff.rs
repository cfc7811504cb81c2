// src/sniff.rs
use std::net::IpAddr;

use crossbeam_channel::Sender;
use etherparse::{EtherType, NetSlice, SlicedPacket, TransportSlice};
use pcap::{Active, Capture, Device};
use tracing::{debug, info, warn};

use crate::error::CaptureError;
use crate::models::domain::{PacketObservation, Protocol};

const SLL2_HEADER_LEN: usize = 20;
const NULL_HEADER_LEN: usize = 4;

/// Read timeout so the capture loop never parks forever inside libpcap.
const READ_TIMEOUT_MS: i32 = 500;

/// Everything the capture thread needs; no detection happens in here.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub interface: Option<String>,
    pub host: IpAddr,
    pub snaplen: i32,
}

impl CaptureConfig {
    /// BPF predicate that keeps only traffic to or from the host.
    pub fn filter(&self) -> String {
        format!("host {}", self.host)
    }
}

/// Link-layer framing of captured packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    Ethernet,
    RawIp,
    LinuxCooked,
    LinuxCookedV2,
    Loopback,
}

impl FrameFormat {
    /// `None` for datalink types that can't carry IP.
    pub fn from_datalink(dlt: i32) -> Option<Self> {
        match dlt {
            1 => Some(FrameFormat::Ethernet),
            12 | 14 | 101 | 228 | 229 => Some(FrameFormat::RawIp),
            113 => Some(FrameFormat::LinuxCooked),
            276 => Some(FrameFormat::LinuxCookedV2),
            0 | 108 => Some(FrameFormat::Loopback),
            _ => None,
        }
    }
}

/// An opened, filtered capture handle.
pub struct Sniffer {
    cap: Capture<Active>,
    interface: String,
    format: FrameFormat,
}

impl Sniffer {
    /// Opens the capture. Fails fast: a monitor without packets is useless.
    pub fn open(config: &CaptureConfig) -> Result<Self, CaptureError> {
        let (mut cap, interface) = create_capture(config)?;
        configure_capture(&mut cap, config)?;

        let datalink = cap.get_datalink();
        let format = FrameFormat::from_datalink(datalink.0).unwrap_or_else(|| {
            warn!(datalink = datalink.0, "unknown datalink type, assuming Ethernet framing");
            FrameFormat::Ethernet
        });

        info!(interface = %interface, filter = %config.filter(), ?format, "capture opened");
        Ok(Sniffer {
            cap,
            interface,
            format,
        })
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Pumps decoded packets into `sender` until the capture fails or the
    /// receiving side goes away.
    pub fn run(mut self, sender: Sender<PacketObservation>) -> Result<(), CaptureError> {
        loop {
            let packet = match self.cap.next_packet() {
                Ok(packet) => packet,
                Err(pcap::Error::TimeoutExpired) => continue,
                Err(pcap::Error::NoMorePackets) => return Ok(()),
                Err(source) => {
                    return Err(CaptureError::Read {
                        interface: self.interface,
                        source,
                    })
                }
            };

            let Some(observation) =
                decode_frame(self.format, packet.data, u64::from(packet.header.len))
            else {
                continue;
            };

            if sender.send(observation).is_err() {
                debug!(interface = %self.interface, "ingestion side closed, stopping capture");
                return Ok(());
            }
        }
    }
}

fn create_capture(config: &CaptureConfig) -> Result<(Capture<Active>, String), CaptureError> {
    let device = match &config.interface {
        Some(name) => Device::from(name.as_str()),
        None => Device::lookup()
            .map_err(CaptureError::NoDevice)?
            .ok_or(CaptureError::NoDevice(pcap::Error::PcapError(
                "no default capture device".into(),
            )))?,
    };
    let interface = device.name.clone();

    let cap = Capture::from_device(device)
        .and_then(|inactive| {
            inactive
                .promisc(false)
                .snaplen(config.snaplen)
                .timeout(READ_TIMEOUT_MS)
                .immediate_mode(true)
                .open()
        })
        .map_err(|e| CaptureError::open(interface.as_str(), e))?;

    Ok((cap, interface))
}

fn configure_capture(
    cap: &mut Capture<Active>,
    config: &CaptureConfig,
) -> Result<(), CaptureError> {
    let filter = config.filter();
    cap.filter(&filter, true)
        .map_err(|source| CaptureError::Filter { filter, source })
}

/// Decodes one captured frame. `wire_len` is what gets counted, so a
/// short snaplen does not shrink the totals.
pub fn decode_frame(format: FrameFormat, data: &[u8], wire_len: u64) -> Option<PacketObservation> {
    let packet = match format {
        FrameFormat::Ethernet => SlicedPacket::from_ethernet(data).ok()?,
        FrameFormat::RawIp => SlicedPacket::from_ip(data).ok()?,
        FrameFormat::LinuxCooked => SlicedPacket::from_linux_sll(data).ok()?,
        FrameFormat::LinuxCookedV2 => {
            // SLL2 opens with the ether type of its payload
            let header = data.get(..SLL2_HEADER_LEN)?;
            let ether_type = EtherType::from(u16::from_be_bytes([header[0], header[1]]));
            SlicedPacket::from_ether_type(ether_type, &data[SLL2_HEADER_LEN..]).ok()?
        }
        FrameFormat::Loopback => SlicedPacket::from_ip(data.get(NULL_HEADER_LEN..)?).ok()?,
    };

    let (source, destination) = match packet.net? {
        NetSlice::Ipv4(ip) => (
            IpAddr::V4(ip.header().source_addr()),
            IpAddr::V4(ip.header().destination_addr()),
        ),
        NetSlice::Ipv6(ip) => (
            IpAddr::V6(ip.header().source_addr()),
            IpAddr::V6(ip.header().destination_addr()),
        ),
    };

    Some(PacketObservation {
        source,
        destination,
        length: wire_len,
        protocol: transport_protocol(packet.transport.as_ref()),
    })
}

/// IPv6 extension headers are already skipped by the slicer, so this sees
/// the real upper-layer protocol.
fn transport_protocol(transport: Option<&TransportSlice<'_>>) -> Protocol {
    match transport {
        Some(TransportSlice::Tcp(_)) => Protocol::Tcp,
        Some(TransportSlice::Udp(_)) => Protocol::Udp,
        Some(TransportSlice::Icmpv4(_)) | Some(TransportSlice::Icmpv6(_)) => Protocol::Icmp,
        _ => Protocol::Other,
    }
}
