//! The firewall capability contract and its per-resource evaluators.
//!
//! Every Azure resource kind guards itself with a structurally different
//! rule set. Each one implements [`Firewall`] so reachability questions can
//! be asked uniformly:
//! - [`rules`] - flat range lists (`FirewallRules`), shared by SQL-style
//!   resources
//! - [`nsg`] - priority ordered network security groups
//! - [`redis`], [`keyvault`], [`datalake`], [`cosmosdb`], [`webapp`] - the
//!   resource specific shapes with their own default policies
//! - [`allowlist`] - the organization supplied reference set used by
//!   compliance checks

mod allowlist;
mod cosmosdb;
mod datalake;
mod keyvault;
mod nsg;
mod redis;
mod rules;
mod webapp;

pub use allowlist::FirewallAllowlist;
pub use cosmosdb::{CosmosDBAccount, CosmosDBFirewall};
pub use datalake::{DataLakeFirewall, DataLakeStore};
pub use keyvault::{KeyVault, KeyVaultFirewall};
pub use nsg::{NetworkSecurityGroup, SecurityRule};
pub use redis::{RedisFirewall, RedisServer};
pub use rules::{FirewallRule, FirewallRules, SqlServer};
pub use webapp::{WebApp, WebAppIPFirewall, WebAppIPRestriction};

use crate::models::{
    ip_in_list, port_contains, AzureIPv4, AzurePort, IPPort, PacketRoute, UnknownBool,
};
use thiserror::Error;

/// Failures of the firewall layer. Uncertainty is never an error: an
/// undeterminable answer comes back as [`UnknownBool::Unknown`] data. These
/// variants mark broken invariants and bad user input only.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FirewallError {
    /// A compliance check was asked against an allowlist with no `"*"`
    /// entry. An error return carries no verdict: callers must treat the
    /// question as undetermined, never as allowed or denied.
    #[error("allowlist was malformed: missing the \"*\" entry")]
    BadAllowlist,
    /// A reachability check against an absent firewall reference.
    #[error("firewall reference was absent")]
    NilFirewall,
    #[error("{0} is not a valid Azure IP")]
    MalformedIpv4(String),
    #[error("{0} is not a valid port")]
    MalformedPort(String),
}

/// Verdict plus the evidence routes backing it.
pub type FirewallVerdict = (UnknownBool, Vec<PacketRoute>);

/// Verdict plus the IP/port combinations that violated the allowlist.
pub type AllowlistVerdict = (UnknownBool, Vec<IPPort>);

/// Anything that has rules to allow or disallow specific IPs to communicate
/// with specific ports.
///
/// A `NotApplicable` verdict means the firewall has no opinion on the
/// question; callers must surface it as such and never fold it into a
/// plain yes or no.
pub trait Firewall {
    /// May the given address reach any protected target, on any port? On
    /// `True` the routes list every known reachable destination; a bare
    /// `*`/`*` route is used when the target cannot be narrowed.
    fn allows_ip(&self, ip: &AzureIPv4) -> Result<FirewallVerdict, FirewallError>;

    /// Same question restricted to one destination port.
    fn allows_ip_to_port(
        &self,
        ip: &AzureIPv4,
        port: &AzurePort,
    ) -> Result<FirewallVerdict, FirewallError>;

    /// Does every address this firewall lets through also appear in the
    /// allowlist? Blocking all traffic trivially respects any allowlist.
    /// Port agnostic firewalls answer `NotApplicable` when the allowlist
    /// carries per-port restrictions, since that granularity is meaningless
    /// to them.
    fn respects_allowlist(
        &self,
        allowlist: &FirewallAllowlist,
    ) -> Result<AllowlistVerdict, FirewallError>;

    /// String convenience form of [`Firewall::allows_ip`]. Parse failures
    /// are returned errors, never panics.
    fn allows_ip_str(&self, ip: &str) -> Result<FirewallVerdict, FirewallError> {
        let ip = AzureIPv4::checked_from_azure(ip)?;
        self.allows_ip(&ip)
    }

    /// String convenience form of [`Firewall::allows_ip_to_port`].
    fn allows_ip_to_port_str(&self, ip: &str, port: &str) -> Result<FirewallVerdict, FirewallError> {
        let ip = AzureIPv4::checked_from_azure(ip)?;
        let port = AzurePort::checked_from_azure(port)?;
        self.allows_ip_to_port(&ip, &port)
    }
}

/// Filters a firewall's [`Firewall::allows_ip`] answer down to one
/// destination. Routes that cover `dst` are regrouped by protocol with the
/// destination substituted in.
pub fn firewall_allows_ip_to_ip(
    fw: Option<&dyn Firewall>,
    src: &AzureIPv4,
    dst: &AzureIPv4,
) -> Result<FirewallVerdict, FirewallError> {
    let fw = fw.ok_or(FirewallError::NilFirewall)?;
    let (allows, routes) = fw.allows_ip(src)?;
    if allows.is_na() || !(allows.is_true() || allows.is_unknown()) {
        return Ok((allows, Vec::new()));
    }
    let mut verdict = UnknownBool::False;
    let mut out: Vec<PacketRoute> = Vec::new();
    for route in &routes {
        let reaches = ip_in_list(dst, &route.ips);
        if reaches.is_false() {
            continue;
        }
        if reaches.is_true() && allows.is_true() {
            verdict = UnknownBool::True;
        } else if !verdict.is_true() {
            verdict = UnknownBool::Unknown;
        }
        match out.iter_mut().find(|p| p.protocol == route.protocol) {
            Some(into) => into.ports.extend(route.ports.iter().cloned()),
            None => out.push(PacketRoute {
                ips: vec![dst.clone()],
                ports: route.ports.clone(),
                protocol: route.protocol,
            }),
        }
    }
    // An uncertain answer with no route naming the destination is still
    // uncertain; only a definite allow can be narrowed down to a no.
    if out.is_empty() && allows.is_unknown() {
        return Ok((UnknownBool::Unknown, Vec::new()));
    }
    Ok((verdict, out))
}

/// Checks whether `src` can reach the `dst:port` combination through the
/// given firewall.
pub fn firewall_allows_ip_to_ip_port(
    fw: Option<&dyn Firewall>,
    src: &AzureIPv4,
    dst: &AzureIPv4,
    port: &AzurePort,
) -> Result<FirewallVerdict, FirewallError> {
    let (allows, routes) = firewall_allows_ip_to_ip(fw, src, dst)?;
    if allows.is_na() || allows.is_false() {
        return Ok((allows, Vec::new()));
    }
    let mut verdict = UnknownBool::False;
    let mut out: Vec<PacketRoute> = Vec::new();
    for route in &routes {
        if !route.ports.iter().any(|p| port_contains(p, port)) {
            continue;
        }
        if allows.is_true() {
            verdict = UnknownBool::True;
        } else if !verdict.is_true() {
            verdict = UnknownBool::Unknown;
        }
        if !out.iter().any(|p: &PacketRoute| p.protocol == route.protocol) {
            out.push(PacketRoute {
                ips: vec![dst.clone()],
                ports: vec![port.clone()],
                protocol: route.protocol,
            });
        }
    }
    if out.is_empty() && allows.is_unknown() {
        return Ok((UnknownBool::Unknown, Vec::new()));
    }
    Ok((verdict, out))
}

/// An empty `IPCollection` comes up often in Azure as "no restrictions
/// configured", so the collection itself acts as a default-allow firewall.
/// Make sure that convention actually suits the resource before reusing it.
impl Firewall for Vec<AzureIPv4> {
    fn allows_ip(&self, ip: &AzureIPv4) -> Result<FirewallVerdict, FirewallError> {
        if self.is_empty() {
            return Ok((UnknownBool::True, PacketRoute::allows_all_routes()));
        }
        let ub = ip_in_list(ip, self);
        if ub.is_true() {
            Ok((UnknownBool::True, PacketRoute::allows_all_routes()))
        } else if ub.is_unknown() {
            Ok((UnknownBool::Unknown, PacketRoute::allows_all_routes()))
        } else {
            Ok((UnknownBool::False, Vec::new()))
        }
    }

    /// Equivalent to `allows_ip`: a plain address list knows nothing about
    /// ports.
    fn allows_ip_to_port(
        &self,
        ip: &AzureIPv4,
        _port: &AzurePort,
    ) -> Result<FirewallVerdict, FirewallError> {
        self.allows_ip(ip)
    }

    /// An empty collection allows everything, which can never respect an
    /// allowlist; the violation evidence is the full `*:*` space.
    fn respects_allowlist(
        &self,
        allowlist: &FirewallAllowlist,
    ) -> Result<AllowlistVerdict, FirewallError> {
        let all_ports = allowlist.require_all_ports()?;
        if allowlist.has_port_restrictions() {
            return Ok((UnknownBool::NotApplicable, Vec::new()));
        }
        if self.is_empty() {
            return Ok((UnknownBool::False, IPPort::all_vec()));
        }
        let mut failed = false;
        let mut failed_uncertain = false;
        let mut extras: Vec<IPPort> = Vec::new();
        for ip in self {
            let contains = ip_in_list(ip, all_ports);
            if contains.is_false() {
                failed = true;
                extras.push(IPPort {
                    ip: ip.clone(),
                    port: AzurePort::from_azure("*"),
                });
            } else if contains.is_unknown() {
                failed_uncertain = true;
                extras.push(IPPort {
                    ip: ip.clone(),
                    port: AzurePort::from_azure("*"),
                });
            }
        }
        if !failed && !failed_uncertain {
            Ok((UnknownBool::True, Vec::new()))
        } else if failed_uncertain {
            Ok((UnknownBool::Unknown, extras))
        } else {
            Ok((UnknownBool::False, extras))
        }
    }
}
