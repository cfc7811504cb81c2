pub mod domain {
    use std::net::IpAddr;

    use serde::Serialize;

    /// Transport protocol tag of an observed packet.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum Protocol {
        Tcp,
        Udp,
        Icmp,
        Other,
    }

    impl Protocol {
        pub const ALL: [Protocol; 4] =
            [Protocol::Tcp, Protocol::Udp, Protocol::Icmp, Protocol::Other];

        /// Unknown labels become `Other`; this never fails.
        pub fn from_label(label: &str) -> Self {
            match label.trim().to_ascii_uppercase().as_str() {
                "TCP" => Protocol::Tcp,
                "UDP" => Protocol::Udp,
                "ICMP" | "ICMPV6" => Protocol::Icmp,
                _ => Protocol::Other,
            }
        }

        fn index(self) -> usize {
            match self {
                Protocol::Tcp => 0,
                Protocol::Udp => 1,
                Protocol::Icmp => 2,
                Protocol::Other => 3,
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Direction {
        /// peer -> host
        Inbound,
        /// host -> peer
        Outbound,
    }

    /// One decoded packet as delivered by the capture layer.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct PacketObservation {
        pub source: IpAddr,
        pub destination: IpAddr,
        pub length: u64,
        pub protocol: Protocol,
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct DirectionCounters {
        pub inbound: u64,
        pub outbound: u64,
    }

    impl DirectionCounters {
        fn add(&mut self, direction: Direction, bytes: u64) {
            match direction {
                Direction::Inbound => self.inbound = self.inbound.saturating_add(bytes),
                Direction::Outbound => self.outbound = self.outbound.saturating_add(bytes),
            }
        }
    }

    /// Byte totals for a single peer within the current window.
    ///
    /// The top-level totals always equal the sum of the per-protocol totals;
    /// `record` is the only mutator and updates both together.
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct PeerCounters {
        totals: DirectionCounters,
        protocols: [DirectionCounters; 4],
    }

    impl PeerCounters {
        pub fn record(&mut self, protocol: Protocol, direction: Direction, bytes: u64) {
            self.totals.add(direction, bytes);
            self.protocols[protocol.index()].add(direction, bytes);
        }

        pub fn inbound(&self) -> u64 {
            self.totals.inbound
        }

        pub fn outbound(&self) -> u64 {
            self.totals.outbound
        }

        pub fn protocol(&self, protocol: Protocol) -> DirectionCounters {
            self.protocols[protocol.index()]
        }

        pub fn protocols(&self) -> impl Iterator<Item = (Protocol, DirectionCounters)> + '_ {
            Protocol::ALL.iter().map(move |&p| (p, self.protocol(p)))
        }
    }
}

pub mod dto {
    use std::collections::BTreeMap;

    use serde::Serialize;

    use super::domain::{DirectionCounters, PeerCounters, Protocol};

    #[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
    pub struct DirectionTotalsDTO {
        pub inbound: u64,
        pub outbound: u64,
    }

    impl From<DirectionCounters> for DirectionTotalsDTO {
        fn from(counters: DirectionCounters) -> Self {
            DirectionTotalsDTO {
                inbound: counters.inbound,
                outbound: counters.outbound,
            }
        }
    }

    /// Plain-data view of one peer, shaped for the dashboard.
    #[derive(Debug, Serialize, Clone, PartialEq, Eq)]
    pub struct PeerTrafficDTO {
        pub inbound: u64,
        pub outbound: u64,
        pub protocols: BTreeMap<Protocol, DirectionTotalsDTO>,
    }

    impl From<&PeerCounters> for PeerTrafficDTO {
        fn from(counters: &PeerCounters) -> Self {
            PeerTrafficDTO {
                inbound: counters.inbound(),
                outbound: counters.outbound(),
                protocols: counters
                    .protocols()
                    .map(|(protocol, totals)| (protocol, totals.into()))
                    .collect(),
            }
        }
    }
}
