//! Key Vault network ACL firewalls.

use crate::firewall::{
    AllowlistVerdict, Firewall, FirewallAllowlist, FirewallError, FirewallVerdict,
};
use crate::models::{
    ip_contains, ip_in_list, AzureIPv4, AzurePort, IPCollection, IPPort, PacketRoute, UnknownBool,
};
use serde::{Deserialize, Serialize};

/// A Key Vault network ACL. `default_allow` carries the ACL's default
/// action; a vault with no ACL configured at all is gathered as
/// `default_allow == True` since Azure lets everything in then.
///
/// VNet rules are stored as raw subnet names. We know nothing about those
/// subnets here, so their presence makes otherwise-deny answers uncertain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyVaultFirewall {
    #[serde(default)]
    pub ip_rules: IPCollection,
    #[serde(default)]
    pub default_allow: UnknownBool,
    #[serde(default)]
    pub vnet_rules: Vec<String>,
}

impl Firewall for KeyVaultFirewall {
    fn allows_ip(&self, chk: &AzureIPv4) -> Result<FirewallVerdict, FirewallError> {
        if self.default_allow.is_true() {
            return Ok((UnknownBool::True, PacketRoute::allows_all_routes()));
        }
        if self.ip_rules.is_empty() {
            if !self.vnet_rules.is_empty() {
                return Ok((UnknownBool::Unknown, Vec::new()));
            }
            if self.default_allow.is_false() {
                return Ok((UnknownBool::False, Vec::new()));
            }
            return Ok((UnknownBool::Unknown, Vec::new()));
        }
        let mut uncertain = false;
        for ip in &self.ip_rules {
            let contains = ip_contains(ip, chk);
            if contains.is_true() {
                return Ok((UnknownBool::True, PacketRoute::allows_all_routes()));
            }
            if contains.is_unknown() {
                uncertain = true;
            }
        }
        if uncertain {
            Ok((UnknownBool::Unknown, Vec::new()))
        } else {
            Ok((UnknownBool::False, Vec::new()))
        }
    }

    /// Key Vault ACLs know nothing about ports.
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
        if self.default_allow.is_true() {
            return Ok((UnknownBool::False, IPPort::all_vec()));
        }
        let all_ports = allowlist.require_all_ports()?;
        if allowlist.has_port_restrictions() {
            return Ok((UnknownBool::NotApplicable, Vec::new()));
        }
        if self.ip_rules.is_empty() {
            // We can't resolve what the referenced subnets hold, so VNet
            // rules leave the question open.
            if !self.vnet_rules.is_empty() {
                return Ok((UnknownBool::Unknown, Vec::new()));
            }
            if self.default_allow.is_false() {
                return Ok((UnknownBool::True, Vec::new()));
            }
            return Ok((UnknownBool::Unknown, Vec::new()));
        }
        let mut failed = false;
        let mut failed_uncertain = false;
        let mut extras: Vec<IPPort> = Vec::new();
        for ip in &self.ip_rules {
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

/// An Azure Key Vault.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyVault {
    pub name: String,
    #[serde(default)]
    pub firewall: KeyVaultFirewall,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> AzureIPv4 {
        AzureIPv4::from_azure(s)
    }

    #[test]
    fn test_default_allow_lets_everything_in() {
        let fw = KeyVaultFirewall {
            default_allow: UnknownBool::True,
            ..Default::default()
        };
        let (allows, routes) = fw.allows_ip(&ip("8.8.8.8")).expect("should not error");
        assert!(allows.is_true());
        assert_eq!(routes, PacketRoute::allows_all_routes());
    }

    #[test]
    fn test_default_deny_with_no_rules() {
        let fw = KeyVaultFirewall {
            default_allow: UnknownBool::False,
            ..Default::default()
        };
        let (allows, _) = fw.allows_ip(&ip("8.8.8.8")).expect("should not error");
        assert!(allows.is_false());
    }

    #[test]
    fn test_vnet_rules_make_answer_uncertain() {
        let fw = KeyVaultFirewall {
            default_allow: UnknownBool::False,
            vnet_rules: vec!["prod-subnet".to_string()],
            ..Default::default()
        };
        let (allows, _) = fw.allows_ip(&ip("10.0.0.1")).expect("should not error");
        assert!(
            allows.is_unknown(),
            "an unresolved subnet reference leaves the question open"
        );
    }

    #[test]
    fn test_ip_rules_decide() {
        let fw = KeyVaultFirewall {
            default_allow: UnknownBool::False,
            ip_rules: vec![ip("203.0.113.0/24")],
            ..Default::default()
        };
        let (allows, _) = fw.allows_ip(&ip("203.0.113.77")).expect("should not error");
        assert!(allows.is_true());
        let (allows, _) = fw.allows_ip(&ip("198.51.100.1")).expect("should not error");
        assert!(allows.is_false());
    }

    #[test]
    fn test_respects_allowlist() {
        let wl = FirewallAllowlist::new(vec![ip("203.0.113.0/24")]);

        // Deny-all trivially respects.
        let deny_all = KeyVaultFirewall {
            default_allow: UnknownBool::False,
            ..Default::default()
        };
        let (res, _) = deny_all.respects_allowlist(&wl).expect("should not error");
        assert!(res.is_true());

        // Allow-all never respects.
        let allow_all = KeyVaultFirewall {
            default_allow: UnknownBool::True,
            ..Default::default()
        };
        let (res, extras) = allow_all.respects_allowlist(&wl).expect("should not error");
        assert!(res.is_false());
        assert_eq!(extras.len(), 1);

        // Rules outside the allowlist are violations.
        let fw = KeyVaultFirewall {
            default_allow: UnknownBool::False,
            ip_rules: vec![ip("203.0.113.5"), ip("192.0.2.1")],
            ..Default::default()
        };
        let (res, extras) = fw.respects_allowlist(&wl).expect("should not error");
        assert!(res.is_false());
        assert_eq!(extras.len(), 1);
        assert_eq!(extras[0].ip.to_string(), "192.0.2.1");
    }

    #[test]
    fn test_respects_allowlist_port_map_is_na() {
        let mut wl = FirewallAllowlist::new(vec![ip("10.0.0.0/8")]);
        wl.add_port_entry("443", vec![ip("10.0.0.1")]);
        let fw = KeyVaultFirewall {
            default_allow: UnknownBool::False,
            ip_rules: vec![ip("10.0.0.1")],
            ..Default::default()
        };
        let (res, _) = fw.respects_allowlist(&wl).expect("should not error");
        assert!(res.is_na());
    }
}
