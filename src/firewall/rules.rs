//! Simple range-list firewalls shared by SQL-style resources.

use crate::firewall::{AllowlistVerdict, Firewall, FirewallAllowlist, FirewallError, FirewallVerdict};
use crate::models::{ip_contains, ip_in_list, AzureIPv4, AzurePort, IPPort, PacketRoute, UnknownBool};
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

/// A simple firewall rule allowing a range of IP addresses. It does not
/// specify ports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FirewallRule {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ip_range: AzureIPv4,
    /// Azure documents `0.0.0.0-0.0.0.0` as a sentinel granting access to
    /// every first-party Azure service, including other tenants' VMs. The
    /// set of Azure service IPs is not enumerable here, so a sentinel rule
    /// contributes `Unknown` (never `True`) to containment checks. It is a
    /// security finding in its own right.
    #[serde(default)]
    pub allows_all_azure: UnknownBool,
}

impl FirewallRule {
    /// Builds a rule for port-agnostic resource kinds where the sentinel is
    /// captured by the wrapping type instead.
    pub fn from_range(name: &str, begin: &str, end: &str) -> FirewallRule {
        FirewallRule {
            name: name.to_string(),
            ip_range: AzureIPv4::from_range(begin, end),
            allows_all_azure: UnknownBool::NotApplicable,
        }
    }

    /// Builds a rule for resource kinds that use the `0.0.0.0-0.0.0.0`
    /// all-Azure sentinel, detecting it from the bounds.
    pub fn from_range_detect_azure(name: &str, begin: &str, end: &str) -> FirewallRule {
        let ip_range = AzureIPv4::from_range(begin, end);
        let (is, range_begin, range_end) = ip_range.continuous_range_u32();
        let allows_all_azure =
            UnknownBool::from_bool(is.is_true() && range_begin == 0 && range_end == 0);
        FirewallRule {
            name: name.to_string(),
            ip_range,
            allows_all_azure,
        }
    }
}

/// A flat list of [`FirewallRule`]s. The default state allows nothing: an
/// empty list denies every IP.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FirewallRules(pub Vec<FirewallRule>);

impl Deref for FirewallRules {
    type Target = Vec<FirewallRule>;

    fn deref(&self) -> &Vec<FirewallRule> {
        &self.0
    }
}

impl DerefMut for FirewallRules {
    fn deref_mut(&mut self) -> &mut Vec<FirewallRule> {
        &mut self.0
    }
}

impl From<Vec<FirewallRule>> for FirewallRules {
    fn from(rules: Vec<FirewallRule>) -> FirewallRules {
        FirewallRules(rules)
    }
}

impl Firewall for FirewallRules {
    fn allows_ip(&self, ip: &AzureIPv4) -> Result<FirewallVerdict, FirewallError> {
        let mut had_uncertainty = false;
        for rule in self.iter() {
            let contains = ip_contains(&rule.ip_range, ip);
            if contains.is_true() {
                return Ok((UnknownBool::True, PacketRoute::allows_all_routes()));
            }
            // An all-Azure sentinel is an uncertain result: we have no way
            // to enumerate every potential Azure address.
            if contains.is_unknown() || rule.allows_all_azure.is_true() {
                had_uncertainty = true;
            }
        }
        if had_uncertainty {
            Ok((UnknownBool::Unknown, Vec::new()))
        } else {
            Ok((UnknownBool::False, Vec::new()))
        }
    }

    fn allows_ip_to_port(
        &self,
        ip: &AzureIPv4,
        _port: &AzurePort,
    ) -> Result<FirewallVerdict, FirewallError> {
        self.allows_ip(ip)
    }

    /// Port agnostic: an allowlist with a port map gives `NotApplicable`,
    /// and one without the `"*"` entry is an error.
    fn respects_allowlist(
        &self,
        allowlist: &FirewallAllowlist,
    ) -> Result<AllowlistVerdict, FirewallError> {
        let all_ports = allowlist.require_all_ports()?;
        if allowlist.has_port_restrictions() {
            return Ok((UnknownBool::NotApplicable, Vec::new()));
        }
        let mut failed = false;
        let mut failed_uncertain = false;
        let mut extras: Vec<IPPort> = Vec::new();
        for rule in self.iter() {
            let contains = ip_in_list(&rule.ip_range, all_ports);
            if contains.is_false() {
                failed = true;
                extras.push(IPPort {
                    ip: rule.ip_range.clone(),
                    port: AzurePort::from_azure("*"),
                });
            } else if contains.is_unknown() {
                failed_uncertain = true;
                extras.push(IPPort {
                    ip: rule.ip_range.clone(),
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

/// A SQL-style server: just a name and the range-list firewall guarding it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SqlServer {
    pub name: String,
    #[serde(default)]
    pub firewall: FirewallRules,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, range: &str) -> FirewallRule {
        FirewallRule {
            name: name.to_string(),
            ip_range: AzureIPv4::from_azure(range),
            allows_all_azure: UnknownBool::False,
        }
    }

    #[test]
    fn test_empty_rules_deny() {
        let fw = FirewallRules::default();
        let (allows, routes) = fw
            .allows_ip(&AzureIPv4::from_azure("10.0.0.1"))
            .expect("allows_ip should not error");
        assert!(allows.is_false(), "no rules means no IPs are known allowed");
        assert!(routes.is_empty());
    }

    #[test]
    fn test_rule_allows_with_route() {
        let fw = FirewallRules(vec![rule("Test", "10.0.0.0-10.0.0.255")]);
        let (allows, routes) = fw
            .allows_ip(&AzureIPv4::from_azure("10.0.0.12"))
            .expect("allows_ip should not error");
        assert!(allows.is_true());
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0], PacketRoute::allows_all());
    }

    #[test]
    fn test_special_query_is_uncertain() {
        let fw = FirewallRules(vec![rule("Test", "10.0.0.0")]);
        let (allows, routes) = fw
            .allows_ip(&AzureIPv4::from_azure("VirtualNetwork"))
            .expect("allows_ip should not error");
        assert!(allows.is_unknown());
        assert!(routes.is_empty());
    }

    #[test]
    fn test_all_azure_sentinel_is_uncertain() {
        let fw = FirewallRules(vec![FirewallRule::from_range_detect_azure(
            "AllowAllWindowsAzureIps",
            "0.0.0.0",
            "0.0.0.0",
        )]);
        assert!(fw[0].allows_all_azure.is_true(), "sentinel should be detected");
        let (allows, _) = fw
            .allows_ip(&AzureIPv4::from_azure("10.0.0.12"))
            .expect("allows_ip should not error");
        assert!(
            allows.is_unknown(),
            "the sentinel covers an unenumerable Azure IP space"
        );
    }

    #[test]
    fn test_sentinel_not_detected_for_real_ranges() {
        let r = FirewallRule::from_range_detect_azure("Test", "10.0.0.0", "10.0.0.255");
        assert!(r.allows_all_azure.is_false());
        let r = FirewallRule::from_range("Test", "0.0.0.0", "0.0.0.0");
        assert!(
            r.allows_all_azure.is_na(),
            "port-agnostic kinds capture the sentinel in the wrapping type"
        );
    }

    #[test]
    fn test_respects_allowlist_na_with_port_map() {
        let mut wl = FirewallAllowlist::new(vec![AzureIPv4::from_azure("10.0.0.0")]);
        wl.add_port_entry("1337", vec![AzureIPv4::from_azure("10.0.0.0")]);
        let fw = FirewallRules(vec![rule("Test", "0.0.0.0")]);
        let (res, extras) = fw
            .respects_allowlist(&wl)
            .expect("respects_allowlist should not error");
        assert!(res.is_na(), "port restrictions are meaningless to this firewall");
        assert!(extras.is_empty());
    }

    #[test]
    fn test_respects_allowlist_missing_all_ports() {
        let fw = FirewallRules(vec![rule("Test", "10.0.0.0")]);
        let err = fw
            .respects_allowlist(&FirewallAllowlist::default())
            .expect_err("missing AllPorts should error");
        assert_eq!(err, FirewallError::BadAllowlist);
    }

    #[test]
    fn test_respects_allowlist_respects() {
        let wl = FirewallAllowlist::new(vec![AzureIPv4::from_azure("10.0.0.0/8")]);
        let fw = FirewallRules(vec![
            rule("Test1", "10.0.0.0"),
            rule("Test2", "10.255.255.255"),
        ]);
        let (res, extras) = fw
            .respects_allowlist(&wl)
            .expect("respects_allowlist should not error");
        assert!(res.is_true());
        assert!(extras.is_empty());
    }

    #[test]
    fn test_respects_allowlist_violation_evidence() {
        let wl = FirewallAllowlist::new(vec![AzureIPv4::from_azure("10.0.0.0/8")]);
        let fw = FirewallRules(vec![
            rule("Test1", "10.0.0.0"),
            rule("Test2", "192.168.1.2"),
        ]);
        let (res, extras) = fw
            .respects_allowlist(&wl)
            .expect("respects_allowlist should not error");
        assert!(res.is_false());
        assert_eq!(extras.len(), 1);
        assert_eq!(extras[0].ip.to_string(), "192.168.1.2");
        assert!(extras[0].port.is_star());
    }

    #[test]
    fn test_empty_rules_trivially_respect() {
        let wl = FirewallAllowlist::new(vec![AzureIPv4::from_azure("10.0.0.0/8")]);
        let fw = FirewallRules::default();
        let (res, extras) = fw
            .respects_allowlist(&wl)
            .expect("respects_allowlist should not error");
        assert!(res.is_true(), "blocking all traffic respects any allowlist");
        assert!(extras.is_empty());
    }

    #[test]
    fn test_rule_json_round_trip() {
        let r = FirewallRule {
            name: "ClientAccess".to_string(),
            ip_range: AzureIPv4::from_azure("192.0.2.0/24"),
            allows_all_azure: UnknownBool::False,
        };
        let json = serde_json::to_string(&r).expect("Error serializing FirewallRule");
        let back: FirewallRule =
            serde_json::from_str(&json).expect("Error deserializing FirewallRule");
        assert_eq!(back, r);
    }
}
