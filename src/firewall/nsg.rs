//! Network security group evaluation.
//!
//! NSG rules carry a priority where a lower number means higher precedence,
//! and the first rule that definitely matches a packet decides its fate.
//! The difficulty is that rule sources can be symbolic tags: a rule that
//! *might* match can neither be skipped nor taken, so the walk has to carry
//! that uncertainty forward without ever collapsing it into a yes or no.
//!
//! <https://docs.microsoft.com/en-us/azure/virtual-network/security-overview>

use crate::firewall::{
    AllowlistVerdict, Firewall, FirewallAllowlist, FirewallError, FirewallVerdict,
};
use crate::models::{
    ip_contains, port_contains, AzureIPv4, AzurePort, IPCollection, IPPort, IpTag, PacketRoute,
    PortCollection, Protocol, UnknownBool,
};
use serde::{Deserialize, Serialize};

/// A single rule in a [`NetworkSecurityGroup`]. Lower `priority` numbers
/// are evaluated first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityRule {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub allows: bool,
    #[serde(default)]
    pub inbound: bool,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub protocol: Protocol,
    #[serde(default)]
    pub source_ips: IPCollection,
    #[serde(default)]
    pub dest_ips: IPCollection,
    #[serde(default)]
    pub source_ports: PortCollection,
    #[serde(default)]
    pub dest_ports: PortCollection,
}

impl PacketRoute {
    /// Builds evidence from the destination portions of a security rule.
    /// The IP and port values are copied so routes stay independent of the
    /// rule set they came from.
    pub fn from_rule_dests(rule: &SecurityRule) -> PacketRoute {
        PacketRoute {
            ips: rule.dest_ips.clone(),
            ports: rule.dest_ports.clone(),
            protocol: rule.protocol,
        }
    }
}

/// A network security group: priority ordered inbound and outbound rules,
/// plus the subnets and network interfaces it is attached to.
///
/// NSGs belong to a resource group but can be applied to resources in
/// different resource groups; the attachment lists here are the raw
/// resource names the gather layer handed us.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkSecurityGroup {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub inbound_rules: Vec<SecurityRule>,
    #[serde(default)]
    pub outbound_rules: Vec<SecurityRule>,
    #[serde(default)]
    pub subnets: Vec<String>,
    #[serde(default)]
    pub network_interfaces: Vec<String>,
}

impl NetworkSecurityGroup {
    /// Inbound rules in evaluation order. The stored rules are never
    /// mutated, so values can be shared across concurrent readers.
    fn sorted_inbound(&self) -> Vec<&SecurityRule> {
        let mut rules: Vec<&SecurityRule> =
            self.inbound_rules.iter().filter(|r| r.inbound).collect();
        rules.sort_by_key(|r| r.priority);
        rules
    }

    /// The shared walk behind `allows_ip` and `allows_ip_to_port`.
    ///
    /// Definite source containment resolves the question at that rule:
    /// allow wins immediately, deny wins unless a higher-precedence allow
    /// with uncertain containment is still pending, in which case that
    /// pending uncertainty is the answer. An uncertain deny is terminal
    /// (the analysis can prove neither access nor denial past it). If no
    /// rule matched at all the group's implicit default denies.
    fn evaluate(
        &self,
        check_ip: &AzureIPv4,
        check_port: Option<&AzurePort>,
    ) -> (UnknownBool, Vec<PacketRoute>) {
        let mut tentative: Vec<PacketRoute> = Vec::new();
        for rule in self.sorted_inbound() {
            if let Some(port) = check_port {
                if !rule.dest_ports.iter().any(|p| port_contains(p, port)) {
                    continue;
                }
            }
            for ip in &rule.source_ips {
                let contains = ip_contains(ip, check_ip);
                if contains.is_unknown() {
                    if !rule.allows {
                        return (UnknownBool::Unknown, Vec::new());
                    }
                    tentative.push(PacketRoute::from_rule_dests(rule));
                } else if contains.is_true() {
                    if rule.allows {
                        return (UnknownBool::True, vec![PacketRoute::from_rule_dests(rule)]);
                    }
                    if !tentative.is_empty() {
                        return (UnknownBool::Unknown, tentative);
                    }
                    return (UnknownBool::False, Vec::new());
                }
            }
        }
        if tentative.is_empty() {
            (UnknownBool::False, Vec::new())
        } else {
            (UnknownBool::Unknown, tentative)
        }
    }

    /// Fixes a destination port and enumerates which source IPs can reach
    /// it. Sources already covered by a higher-precedence deny rule are
    /// excluded from later allow rules; uncertain coverage escalates the
    /// verdict to `Unknown`.
    pub fn allows_to_port(&self, check_port: &AzurePort) -> Result<FirewallVerdict, FirewallError> {
        let mut allowed: Vec<PacketRoute> = Vec::new();
        let mut denied_sources: IPCollection = Vec::new();
        let mut had_uncertainty = false;

        for rule in self.sorted_inbound() {
            if !rule.dest_ports.iter().any(|p| port_contains(check_port, p)) {
                continue;
            }
            if rule.allows {
                let mut rule_allows: IPCollection = Vec::new();
                for ip in &rule.source_ips {
                    let mut excluded = false;
                    for denied in &denied_sources {
                        let contains = ip_contains(denied, ip);
                        if contains.is_true() {
                            excluded = true;
                            break;
                        }
                        if contains.is_unknown() {
                            had_uncertainty = true;
                            excluded = true;
                            break;
                        }
                    }
                    if !excluded {
                        rule_allows.push(ip.clone());
                    }
                }
                if !rule_allows.is_empty() {
                    allowed.push(PacketRoute {
                        ips: rule_allows,
                        ports: vec![check_port.clone()],
                        protocol: rule.protocol,
                    });
                }
            } else {
                // Rules arrive sorted, so every source denied here outranks
                // whatever allow rules follow.
                denied_sources.extend(rule.source_ips.iter().cloned());
            }
        }
        if allowed.is_empty() {
            if had_uncertainty {
                return Ok((UnknownBool::Unknown, Vec::new()));
            }
            return Ok((UnknownBool::False, Vec::new()));
        }
        if had_uncertainty {
            Ok((UnknownBool::Unknown, allowed))
        } else {
            Ok((UnknownBool::True, allowed))
        }
    }

    /// String convenience form of [`NetworkSecurityGroup::allows_to_port`].
    pub fn allows_to_port_str(&self, port: &str) -> Result<FirewallVerdict, FirewallError> {
        let port = AzurePort::checked_from_azure(port)?;
        self.allows_to_port(&port)
    }

    /// A deep copy with every `VirtualNetwork` tag in the inbound rules
    /// replaced by the given concrete range. This turns VNet-relative
    /// questions into concretely answerable ones when the caller knows the
    /// network's address space. The original group is unchanged.
    pub fn with_virtual_network(&self, vnet: &str) -> NetworkSecurityGroup {
        let mut copy = self.clone();
        for rule in &mut copy.inbound_rules {
            for ip in rule
                .source_ips
                .iter_mut()
                .chain(rule.dest_ips.iter_mut())
            {
                if ip.special_tag() == Some(IpTag::VirtualNetwork) {
                    *ip = AzureIPv4::from_azure(vnet);
                }
            }
        }
        copy
    }
}

impl Firewall for NetworkSecurityGroup {
    fn allows_ip(&self, ip: &AzureIPv4) -> Result<FirewallVerdict, FirewallError> {
        Ok(self.evaluate(ip, None))
    }

    fn allows_ip_to_port(
        &self,
        ip: &AzureIPv4,
        port: &AzurePort,
    ) -> Result<FirewallVerdict, FirewallError> {
        Ok(self.evaluate(ip, Some(port)))
    }

    /// NSGs are NOT port agnostic, so this never answers `NotApplicable`;
    /// the only error case is an allowlist defining neither `all_ports`
    /// nor per-port entries. Only allow rules matter: respecting an
    /// allowlist is a negative property of what gets through.
    fn respects_allowlist(
        &self,
        allowlist: &FirewallAllowlist,
    ) -> Result<AllowlistVerdict, FirewallError> {
        if allowlist.all_ports.is_none() && !allowlist.has_port_restrictions() {
            return Err(FirewallError::BadAllowlist);
        }
        let mut failed = false;
        let mut failed_uncertain = false;
        let mut extras: Vec<IPPort> = Vec::new();
        for rule in &self.inbound_rules {
            if !rule.allows {
                continue;
            }
            for allowed_ip in &rule.source_ips {
                // The star list covers every port, so it short-circuits the
                // per-port walk below.
                if allowlist.ip_passes_star(allowed_ip).is_true() {
                    continue;
                }
                for port in &rule.dest_ports {
                    let passes = allowlist.ip_passes_any(port, allowed_ip);
                    if passes.is_false() {
                        failed = true;
                        extras.push(IPPort {
                            ip: allowed_ip.clone(),
                            port: port.clone(),
                        });
                    } else if passes.is_unknown() {
                        failed_uncertain = true;
                        extras.push(IPPort {
                            ip: allowed_ip.clone(),
                            port: port.clone(),
                        });
                    }
                }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ips_equal, ports_equal};

    fn ips(list: &[&str]) -> IPCollection {
        list.iter().map(|s| AzureIPv4::from_azure(s)).collect()
    }

    fn ports(list: &[&str]) -> PortCollection {
        list.iter().map(|s| AzurePort::from_azure(s)).collect()
    }

    fn rule(
        allows: bool,
        priority: i32,
        source_ips: &[&str],
        dest_ports: &[&str],
    ) -> SecurityRule {
        SecurityRule {
            name: format!("rule-{priority}"),
            allows,
            inbound: true,
            priority,
            protocol: Protocol::All,
            source_ips: ips(source_ips),
            source_ports: ports(&["*"]),
            dest_ips: ips(&["192.168.1.1"]),
            dest_ports: ports(dest_ports),
            ..Default::default()
        }
    }

    fn nsg(rules: Vec<SecurityRule>) -> NetworkSecurityGroup {
        NetworkSecurityGroup {
            name: "test-nsg".to_string(),
            inbound_rules: rules,
            ..Default::default()
        }
    }

    fn check_allows(
        group: &NetworkSecurityGroup,
        ip: &str,
        port: &str,
        expected: UnknownBool,
        dests: &[PacketRoute],
    ) {
        let (got, routes) = group
            .allows_ip_to_port_str(ip, port)
            .expect("allows_ip_to_port_str should not error");
        assert_eq!(got, expected, "wrong verdict for {ip}:{port}");
        if expected.is_true() {
            assert_eq!(routes.len(), dests.len(), "route count mismatch");
            for (got_route, want_route) in routes.iter().zip(dests) {
                assert_eq!(got_route.protocol, want_route.protocol);
                for (g, w) in got_route.ips.iter().zip(&want_route.ips) {
                    assert!(ips_equal(g, w).is_true(), "expected {w} but got {g}");
                }
                for (g, w) in got_route.ports.iter().zip(&want_route.ports) {
                    assert!(ports_equal(g, w), "expected {w} but got {g}");
                }
            }
        }
    }

    #[test]
    fn test_lower_priority_number_wins_allow() {
        let group = nsg(vec![
            rule(true, 100, &["*"], &["80"]),
            rule(false, 101, &["*"], &["80"]),
        ]);
        let dests = vec![PacketRoute {
            ips: ips(&["192.168.1.1"]),
            ports: ports(&["80"]),
            protocol: Protocol::All,
        }];
        check_allows(&group, "*", "80", UnknownBool::True, &dests);
    }

    #[test]
    fn test_lower_priority_number_wins_deny() {
        let group = nsg(vec![
            rule(true, 102, &["*"], &["80"]),
            rule(false, 101, &["*"], &["80"]),
        ]);
        check_allows(&group, "*", "80", UnknownBool::False, &[]);
    }

    #[test]
    fn test_priority_wins_regardless_of_list_order() {
        // Same rules, shuffled into the list the other way around.
        let group = nsg(vec![
            rule(false, 101, &["*"], &["80"]),
            rule(true, 100, &["*"], &["80"]),
        ]);
        let dests = vec![PacketRoute {
            ips: ips(&["192.168.1.1"]),
            ports: ports(&["80"]),
            protocol: Protocol::All,
        }];
        check_allows(&group, "*", "80", UnknownBool::True, &dests);
    }

    #[test]
    fn test_no_port_match_is_default_deny() {
        let group = nsg(vec![rule(false, 102, &["*"], &["5888"])]);
        check_allows(&group, "*", "80", UnknownBool::False, &[]);
    }

    #[test]
    fn test_no_ip_match_is_default_deny() {
        let group = nsg(vec![rule(false, 102, &["10.0.0.0/8"], &["5888"])]);
        check_allows(&group, "192.168.1.2", "5888", UnknownBool::False, &[]);
        // And with no rules at all.
        let empty = nsg(Vec::new());
        check_allows(&empty, "10.0.0.1", "80", UnknownBool::False, &[]);
    }

    #[test]
    fn test_symbolic_tag_allow_is_uncertain() {
        let group = nsg(vec![rule(true, 103, &["VirtualNetwork"], &["5888"])]);
        check_allows(&group, "10.11.12.13", "5888", UnknownBool::Unknown, &[]);
    }

    #[test]
    fn test_symbolic_tag_deny_is_uncertain() {
        let group = nsg(vec![
            rule(false, 100, &["VirtualNetwork"], &["22"]),
            rule(true, 200, &["*"], &["22"]),
        ]);
        // The deny might apply; the later allow cannot make it concrete.
        check_allows(&group, "10.0.0.5", "22", UnknownBool::Unknown, &[]);
    }

    #[test]
    fn test_pending_uncertain_allow_beats_later_definite_deny() {
        let group = nsg(vec![
            rule(true, 100, &["VirtualNetwork"], &["443"]),
            rule(false, 200, &["*"], &["443"]),
        ]);
        let (got, routes) = group
            .allows_ip_to_port_str("10.0.0.5", "443")
            .expect("should not error");
        assert!(
            got.is_unknown(),
            "an ambiguous higher-precedence allow cannot be overridden"
        );
        assert_eq!(routes.len(), 1, "the pending route is the evidence");
    }

    #[test]
    fn test_outbound_rules_are_ignored() {
        let mut outbound = rule(true, 100, &["*"], &["80"]);
        outbound.inbound = false;
        let group = nsg(vec![outbound]);
        check_allows(&group, "*", "80", UnknownBool::False, &[]);
    }

    #[test]
    fn test_allows_ip_ignores_ports() {
        let group = nsg(vec![rule(true, 100, &["10.0.0.0/8"], &["8443"])]);
        let (got, routes) = group
            .allows_ip(&AzureIPv4::from_azure("10.1.2.3"))
            .expect("allows_ip should not error");
        assert!(got.is_true());
        assert_eq!(routes.len(), 1);
    }

    #[test]
    fn test_allows_to_port_enumerates_sources() {
        let group = nsg(vec![
            rule(false, 100, &["10.0.0.0/8"], &["8080"]),
            rule(true, 200, &["10.1.2.3", "172.16.0.1"], &["8080"]),
        ]);
        let (got, routes) = group
            .allows_to_port_str("8080")
            .expect("allows_to_port_str should not error");
        assert!(got.is_true());
        assert_eq!(routes.len(), 1);
        // 10.1.2.3 is swallowed by the earlier deny; 172.16.0.1 survives.
        assert_eq!(routes[0].ips.len(), 1);
        assert_eq!(routes[0].ips[0].to_string(), "172.16.0.1");
        assert_eq!(routes[0].ports[0].as_u16(), Some(8080));
    }

    #[test]
    fn test_allows_to_port_uncertain_denied_source() {
        let group = nsg(vec![
            rule(false, 100, &["VirtualNetwork"], &["8080"]),
            rule(true, 200, &["10.1.2.3"], &["8080"]),
        ]);
        let (got, _) = group
            .allows_to_port_str("8080")
            .expect("allows_to_port_str should not error");
        assert!(
            got.is_unknown(),
            "a tag-shaped deny may or may not cover the allowed source"
        );
    }

    #[test]
    fn test_with_virtual_network_makes_tag_concrete() {
        let group = nsg(vec![SecurityRule {
            name: "Test Rule".to_string(),
            allows: true,
            inbound: true,
            priority: 100,
            protocol: Protocol::All,
            source_ips: ips(&["VirtualNetwork"]),
            source_ports: ports(&["*"]),
            dest_ips: ips(&["VirtualNetwork"]),
            dest_ports: ports(&["8443"]),
            ..Default::default()
        }]);
        let in_vnet = "10.0.0.1";
        let (baseline, _) = group
            .allows_ip_to_port_str(in_vnet, "8443")
            .expect("baseline check should not error");
        assert!(
            !baseline.is_true(),
            "{in_vnet} shouldn't be definitely allowed in the baseline"
        );
        let resolved = group.with_virtual_network("10.0.0.0/24");
        let (got, _) = resolved
            .allows_ip_to_port_str(in_vnet, "8443")
            .expect("resolved check should not error");
        assert!(got.is_true(), "{in_vnet} should be allowed once the VNet is concrete");
        // The original group is untouched.
        assert_eq!(
            group.inbound_rules[0].source_ips[0].to_string(),
            "VirtualNetwork"
        );
    }

    #[test]
    fn test_respects_allowlist_only_allow_rules_matter() {
        let wl = FirewallAllowlist::new(vec![AzureIPv4::from_azure("10.0.0.0/8")]);
        let group = nsg(vec![
            rule(true, 100, &["10.1.0.0/16"], &["443"]),
            rule(false, 200, &["8.8.8.8"], &["443"]),
        ]);
        let (res, extras) = group
            .respects_allowlist(&wl)
            .expect("respects_allowlist should not error");
        assert!(res.is_true(), "deny rules never violate an allowlist");
        assert!(extras.is_empty());
    }

    #[test]
    fn test_respects_allowlist_per_port_entries() {
        let mut wl = FirewallAllowlist::new(Vec::new());
        wl.add_port_entry("443", vec![AzureIPv4::from_azure("198.51.100.7")]);
        let group = nsg(vec![
            rule(true, 100, &["198.51.100.7"], &["443"]),
            rule(true, 200, &["203.0.113.5"], &["443"]),
        ]);
        let (res, extras) = group
            .respects_allowlist(&wl)
            .expect("respects_allowlist should not error");
        assert!(res.is_false(), "NSGs check per-port entries, never NotApplicable");
        assert_eq!(extras.len(), 1);
        assert_eq!(extras[0].ip.to_string(), "203.0.113.5");
        assert_eq!(extras[0].port.as_u16(), Some(443));
    }

    #[test]
    fn test_respects_allowlist_needs_some_entries() {
        let group = nsg(vec![rule(true, 100, &["10.0.0.1"], &["443"])]);
        let err = group
            .respects_allowlist(&FirewallAllowlist::default())
            .expect_err("an allowlist with nothing defined is malformed");
        assert_eq!(err, FirewallError::BadAllowlist);
    }
}
