//! Azure Redis cache firewalls.

use crate::firewall::{
    AllowlistVerdict, Firewall, FirewallAllowlist, FirewallError, FirewallRule, FirewallRules,
    FirewallVerdict,
};
use crate::models::{AzureIPv4, AzurePort, IPPort, PacketRoute, UnknownBool};
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

/// The range-list firewall of a Redis cache. Unlike [`FirewallRules`], an
/// empty Redis firewall allows traffic from everywhere.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedisFirewall(pub Vec<FirewallRule>);

impl Deref for RedisFirewall {
    type Target = Vec<FirewallRule>;

    fn deref(&self) -> &Vec<FirewallRule> {
        &self.0
    }
}

impl DerefMut for RedisFirewall {
    fn deref_mut(&mut self) -> &mut Vec<FirewallRule> {
        &mut self.0
    }
}

impl RedisFirewall {
    fn as_rules(&self) -> FirewallRules {
        FirewallRules(self.0.clone())
    }
}

impl Firewall for RedisFirewall {
    /// Traffic is allowed by default from everywhere when no rules are
    /// present.
    fn allows_ip(&self, ip: &AzureIPv4) -> Result<FirewallVerdict, FirewallError> {
        if self.is_empty() {
            return Ok((UnknownBool::True, PacketRoute::allows_all_routes()));
        }
        self.as_rules().allows_ip(ip)
    }

    fn allows_ip_to_port(
        &self,
        ip: &AzureIPv4,
        _port: &AzurePort,
    ) -> Result<FirewallVerdict, FirewallError> {
        self.allows_ip(ip)
    }

    /// Port agnostic like [`FirewallRules`], with one difference: an empty
    /// rule list exposes everything, so it can never respect an allowlist.
    fn respects_allowlist(
        &self,
        allowlist: &FirewallAllowlist,
    ) -> Result<AllowlistVerdict, FirewallError> {
        allowlist.require_all_ports()?;
        if allowlist.has_port_restrictions() {
            return Ok((UnknownBool::NotApplicable, Vec::new()));
        }
        if self.is_empty() {
            return Ok((UnknownBool::False, IPPort::all_vec()));
        }
        self.as_rules().respects_allowlist(allowlist)
    }
}

/// An Azure Redis cache: the name and the firewall guarding it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedisServer {
    pub name: String,
    #[serde(default)]
    pub firewall: RedisFirewall,
}
