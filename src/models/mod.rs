//! Core value types for firewall analysis.
//!
//! This module contains the data structures every evaluator builds on:
//! - [`UnknownBool`] - tri-state boolean with `Unknown` and `NotApplicable`
//! - [`AzureIPv4`] - Azure firewall IP values and their set arithmetic
//! - [`AzurePort`] - the same shape over the 16 bit port space
//! - [`PacketRoute`] and [`IPPort`] - evidence attached to verdicts

mod ipv4;
mod packet_route;
mod port;
mod unknown_bool;

// Re-export public types
pub use ipv4::{
    comma_join_ips, ip_contains, ip_in_list, ip_is_rfc1918_private, ips_equal, AzureIPv4,
    IPCollection, IpTag, Ipv4Iter,
};
pub use packet_route::{IPPort, PacketRoute, Protocol};
pub use port::{port_contains, ports_equal, ports_equal_ub, AzurePort, PortCollection, PortIter};
pub use unknown_bool::UnknownBool;
