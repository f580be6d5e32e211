//! Data Lake store firewalls.

use crate::firewall::{
    AllowlistVerdict, Firewall, FirewallAllowlist, FirewallError, FirewallRules, FirewallVerdict,
};
use crate::models::{AzureIPv4, AzurePort, IPPort, PacketRoute, UnknownBool};
use serde::{Deserialize, Serialize};

/// A Data Lake firewall wraps a plain rule list behind two switches: the
/// firewall can be disabled outright, and first-party Azure traffic can be
/// waved through wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataLakeFirewall {
    #[serde(default)]
    pub enabled: UnknownBool,
    #[serde(default)]
    pub allow_azure: UnknownBool,
    #[serde(default)]
    pub rules: FirewallRules,
}

impl Firewall for DataLakeFirewall {
    /// A disabled firewall allows everything regardless of its rule list.
    fn allows_ip(&self, ip: &AzureIPv4) -> Result<FirewallVerdict, FirewallError> {
        if self.enabled.is_false() {
            return Ok((UnknownBool::True, PacketRoute::allows_all_routes()));
        }
        self.rules.allows_ip(ip)
    }

    fn allows_ip_to_port(
        &self,
        ip: &AzureIPv4,
        port: &AzurePort,
    ) -> Result<FirewallVerdict, FirewallError> {
        if self.enabled.is_false() {
            return Ok((UnknownBool::True, PacketRoute::allows_all_routes()));
        }
        self.rules.allows_ip_to_port(ip, port)
    }

    fn respects_allowlist(
        &self,
        allowlist: &FirewallAllowlist,
    ) -> Result<AllowlistVerdict, FirewallError> {
        if self.enabled.is_false() {
            return Ok((UnknownBool::False, IPPort::all_vec()));
        }
        self.rules.respects_allowlist(allowlist)
    }
}

/// A Data Lake store account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataLakeStore {
    pub name: String,
    #[serde(default)]
    pub firewall: DataLakeFirewall,
}
