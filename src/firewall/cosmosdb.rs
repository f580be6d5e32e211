//! Cosmos DB firewalls.

use crate::firewall::{
    AllowlistVerdict, Firewall, FirewallAllowlist, FirewallError, FirewallVerdict,
};
use crate::models::{
    ip_contains, ip_in_list, AzureIPv4, AzurePort, IPCollection, IPPort, PacketRoute, UnknownBool,
};
use serde::{Deserialize, Serialize};

/// A Cosmos DB account firewall. With no explicit IP rules the decision
/// falls through the public-network-access flag and then the VNet filter,
/// all of which are tri-state because the provider may not report them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CosmosDBFirewall {
    #[serde(default)]
    pub ips: IPCollection,
    #[serde(default)]
    pub public_network_allowed: UnknownBool,
    #[serde(default)]
    pub azure_can_bypass: UnknownBool,
    #[serde(default)]
    pub allowed_resources: Vec<String>,
    #[serde(default)]
    pub vnet_enabled: UnknownBool,
    #[serde(default)]
    pub vnet_rules: Vec<String>,
}

impl Firewall for CosmosDBFirewall {
    fn allows_ip(&self, ip: &AzureIPv4) -> Result<FirewallVerdict, FirewallError> {
        if self.ips.is_empty() {
            // Public access switched off closes the front door no matter
            // what the VNet filter says about internal traffic.
            if self.public_network_allowed.is_false() {
                return Ok((UnknownBool::False, Vec::new()));
            }
            if self.vnet_enabled.is_false() {
                return Ok((UnknownBool::True, PacketRoute::allows_all_routes()));
            }
            if !self.vnet_rules.is_empty() {
                // We can't tell whether the address sits in one of those
                // subnets.
                return Ok((UnknownBool::Unknown, PacketRoute::allows_all_routes()));
            }
            if self.vnet_enabled.is_unknown() || self.public_network_allowed.is_unknown() {
                return Ok((UnknownBool::Unknown, PacketRoute::allows_all_routes()));
            }
            return Ok((UnknownBool::True, PacketRoute::allows_all_routes()));
        }
        let mut had_uncertainty = false;
        for allowed in &self.ips {
            let contains = ip_contains(allowed, ip);
            if contains.is_true() {
                return Ok((UnknownBool::True, PacketRoute::allows_all_routes()));
            }
            if contains.is_unknown() {
                had_uncertainty = true;
            }
        }
        if had_uncertainty {
            Ok((UnknownBool::Unknown, Vec::new()))
        } else {
            Ok((UnknownBool::False, Vec::new()))
        }
    }

    /// No port specifications with Cosmos.
    fn allows_ip_to_port(
        &self,
        ip: &AzureIPv4,
        _port: &AzurePort,
    ) -> Result<FirewallVerdict, FirewallError> {
        self.allows_ip(ip)
    }

    fn respects_allowlist(
        &self,
        allowlist: &FirewallAllowlist,
    ) -> Result<AllowlistVerdict, FirewallError> {
        let all_ports = allowlist.require_all_ports()?;
        if allowlist.has_port_restrictions() {
            return Ok((UnknownBool::NotApplicable, Vec::new()));
        }
        if self.ips.is_empty() {
            if self.public_network_allowed.is_false() {
                return Ok((UnknownBool::True, Vec::new()));
            }
            if self.vnet_enabled.is_true() {
                return Ok((UnknownBool::Unknown, IPPort::all_vec()));
            }
            // Everything is allowed, so nothing is being respected.
            return Ok((UnknownBool::False, IPPort::all_vec()));
        }
        let mut failed = false;
        let mut failed_uncertain = false;
        let mut extras: Vec<IPPort> = Vec::new();
        for allowed in &self.ips {
            let contains = ip_in_list(allowed, all_ports);
            if contains.is_false() {
                failed = true;
                extras.push(IPPort {
                    ip: allowed.clone(),
                    port: AzurePort::from_azure("*"),
                });
            } else if contains.is_unknown() {
                failed_uncertain = true;
                extras.push(IPPort {
                    ip: allowed.clone(),
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

/// A Cosmos DB account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CosmosDBAccount {
    pub name: String,
    #[serde(default)]
    pub firewall: CosmosDBFirewall,
}
