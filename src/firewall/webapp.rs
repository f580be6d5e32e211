//! Web App IP restriction firewalls.

use crate::firewall::{
    AllowlistVerdict, Firewall, FirewallAllowlist, FirewallError, FirewallRule, FirewallVerdict,
};
use crate::models::{
    ip_contains, ip_in_list, AzureIPv4, AzurePort, IPPort, PacketRoute, UnknownBool,
};
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

/// One Web App IP restriction: a range plus a priority and an allow/deny
/// action. Like NSG rules, a lower priority number takes precedence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebAppIPRestriction {
    #[serde(flatten)]
    pub rule: FirewallRule,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub allow: UnknownBool,
}

/// The collection of a Web App's IP restrictions. Precedence based like an
/// NSG, but keyed only by explicit rules: an empty list denies everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebAppIPFirewall(pub Vec<WebAppIPRestriction>);

impl Deref for WebAppIPFirewall {
    type Target = Vec<WebAppIPRestriction>;

    fn deref(&self) -> &Vec<WebAppIPRestriction> {
        &self.0
    }
}

impl DerefMut for WebAppIPFirewall {
    fn deref_mut(&mut self) -> &mut Vec<WebAppIPRestriction> {
        &mut self.0
    }
}

impl Firewall for WebAppIPFirewall {
    /// Every rule has to be inspected before a valid decision can be made:
    /// the highest-precedence allow and deny that definitely cover the
    /// address are compared at the end. Any uncertain containment along the
    /// way makes the whole answer `Unknown` immediately.
    ///
    /// The returned route is a bare `*`/`*`: the firewall protects one web
    /// app whose own address space is not modeled here.
    fn allows_ip(&self, ip: &AzureIPv4) -> Result<FirewallVerdict, FirewallError> {
        let mut allow_precedent = i32::MAX;
        let mut deny_precedent = i32::MAX;
        for restriction in self.iter() {
            let contains = ip_contains(&restriction.rule.ip_range, ip);
            if contains.is_true() {
                if restriction.allow.is_false() {
                    deny_precedent = deny_precedent.min(restriction.priority);
                } else if restriction.allow.is_true() {
                    allow_precedent = allow_precedent.min(restriction.priority);
                } else if restriction.allow.is_na() {
                    continue;
                } else {
                    return Ok((UnknownBool::Unknown, Vec::new()));
                }
            } else if contains.is_unknown() {
                return Ok((UnknownBool::Unknown, Vec::new()));
            }
        }
        // Ties (including the no-match case where both sit at i32::MAX)
        // fall to deny.
        if deny_precedent <= allow_precedent {
            return Ok((UnknownBool::False, Vec::new()));
        }
        Ok((UnknownBool::True, PacketRoute::allows_all_routes()))
    }

    /// Web App restrictions carry no port specifications.
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
        if self.is_empty() {
            return Ok((UnknownBool::False, IPPort::all_vec()));
        }
        let mut failed = false;
        let mut failed_uncertain = false;
        let mut extras: Vec<IPPort> = Vec::new();
        for restriction in self.iter() {
            if !restriction.allow.is_true() {
                continue;
            }
            let contains = ip_in_list(&restriction.rule.ip_range, all_ports);
            if contains.is_false() {
                failed = true;
                extras.push(IPPort {
                    ip: restriction.rule.ip_range.clone(),
                    port: AzurePort::from_azure("*"),
                });
            } else if contains.is_unknown() {
                failed_uncertain = true;
                extras.push(IPPort {
                    ip: restriction.rule.ip_range.clone(),
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

/// An Azure Web App and the firewalls on its main and SCM sites.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebApp {
    pub name: String,
    #[serde(default)]
    pub firewall: WebAppIPFirewall,
    #[serde(default)]
    pub scm_firewall: WebAppIPFirewall,
}
