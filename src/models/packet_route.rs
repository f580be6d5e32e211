//! Evidence types attached to firewall verdicts.
//!
//! A positive or uncertain "allows" answer carries [`PacketRoute`] values
//! describing which destination IP/port/protocol combinations the decision
//! covers. Compliance checks report [`IPPort`] violation records instead.

use crate::models::{ips_equal, ports_equal, AzureIPv4, AzurePort};
use crate::models::{IPCollection, PortCollection};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;

/// Protocol of a security rule. Azure's `"*"` protocol maps to [`Protocol::All`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    #[default]
    Unknown,
    All,
    Tcp,
    Udp,
}

impl Protocol {
    pub fn from_azure(az: &str) -> Protocol {
        match az.to_lowercase().as_str() {
            "udp" => Protocol::Udp,
            "tcp" => Protocol::Tcp,
            // Azure uses "*" in rule JSON; our snapshots use "tcp/udp".
            "" | "*" | "tcp/udp" => Protocol::All,
            _ => Protocol::Unknown,
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
            Protocol::All => "TCP/UDP",
            Protocol::Unknown => "Unknown",
        };
        write!(f, "{s}")
    }
}

impl Serialize for Protocol {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        let s = match self {
            Protocol::Udp => "udp",
            Protocol::Tcp => "tcp",
            Protocol::All => "tcp/udp",
            Protocol::Unknown => "?",
        };
        serializer.serialize_str(s)
    }
}

impl<'de> Deserialize<'de> for Protocol {
    fn deserialize<D>(deserializer: D) -> Result<Protocol, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Old snapshots carried the protocol in integer form.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(u8),
            Str(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Num(0) => Ok(Protocol::Unknown),
            Raw::Num(1) => Ok(Protocol::All),
            Raw::Num(2) => Ok(Protocol::Tcp),
            Raw::Num(3) => Ok(Protocol::Udp),
            Raw::Num(n) => Err(de::Error::custom(format!("invalid protocol value: {n}"))),
            Raw::Str(s) => match s.to_lowercase().as_str() {
                "udp" => Ok(Protocol::Udp),
                "tcp" => Ok(Protocol::Tcp),
                "" | "tcp/udp" => Ok(Protocol::All),
                _ => Ok(Protocol::Unknown),
            },
        }
    }
}

/// A potential inbound route through a firewall: which destination IPs and
/// ports a given source may reach, over which protocol.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PacketRoute {
    pub ips: IPCollection,
    pub ports: PortCollection,
    pub protocol: Protocol,
}

impl PacketRoute {
    /// The maximally permissive route: any IP, any port, any protocol.
    /// Returned when a firewall allows traffic but cannot narrow the target.
    pub fn allows_all() -> PacketRoute {
        PacketRoute {
            ips: vec![AzureIPv4::from_azure("*")],
            ports: vec![AzurePort::from_azure("*")],
            protocol: Protocol::All,
        }
    }

    pub fn allows_all_routes() -> Vec<PacketRoute> {
        vec![PacketRoute::allows_all()]
    }
}

/// Equality is set based: same protocol, same IP membership and same port
/// membership regardless of order. One route being a subset of another is
/// not equality.
impl PartialEq for PacketRoute {
    fn eq(&self, other: &PacketRoute) -> bool {
        if self.protocol != other.protocol {
            return false;
        }
        if self.ips.len() != other.ips.len() || self.ports.len() != other.ports.len() {
            return false;
        }
        for ip in &self.ips {
            if !other.ips.iter().any(|o| ips_equal(ip, o).is_true()) {
                return false;
            }
        }
        for port in &self.ports {
            if !other.ports.iter().any(|o| ports_equal(port, o)) {
                return false;
            }
        }
        true
    }
}

/// A single IP and port combination, used as violation evidence by the
/// allowlist compliance checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IPPort {
    pub ip: AzureIPv4,
    pub port: AzurePort,
}

impl IPPort {
    /// The `*:*` record used when a firewall exposes everything.
    pub fn all() -> IPPort {
        IPPort {
            ip: AzureIPv4::from_azure("*"),
            port: AzurePort::from_azure("*"),
        }
    }

    pub fn all_vec() -> Vec<IPPort> {
        vec![IPPort::all()]
    }

    /// Presentation order for violation lists: special tags first, then
    /// singles by address (and port when both are single), then ranges by
    /// their starting address, with raw set size as the tiebreaker.
    pub fn evidence_order(&self, other: &IPPort) -> Ordering {
        if self.ip.is_special() || other.ip.is_special() {
            return match (self.ip.is_special(), other.ip.is_special()) {
                (true, true) => self.ip.to_string().cmp(&other.ip.to_string()),
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => unreachable!(),
            };
        }
        if let (Some(a), Some(b)) = (self.ip.as_u32(), other.ip.as_u32()) {
            if let (Some(ap), Some(bp)) = (self.port.as_u16(), other.port.as_u16()) {
                return a.cmp(&b).then(ap.cmp(&bp));
            }
            return a.cmp(&b);
        }
        let (a_cont, a_begin, _) = self.ip.continuous_range_u32();
        let (b_cont, b_begin, _) = other.ip.continuous_range_u32();
        if a_cont.is_true() && b_cont.is_true() {
            return a_begin.cmp(&b_begin);
        }
        self.ip.size().cmp(&other.ip.size())
    }
}

impl PartialEq for IPPort {
    fn eq(&self, other: &IPPort) -> bool {
        ips_equal(&self.ip, &other.ip).is_true() && ports_equal(&self.port, &other.port)
    }
}

impl std::fmt::Display for IPPort {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}
