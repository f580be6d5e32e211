//! Organization supplied allowlists for compliance checking.

use crate::firewall::FirewallError;
use crate::models::{ip_in_list, port_contains, AzureIPv4, AzurePort, IPCollection, UnknownBool};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// A reference set of permitted IP/port combinations, ingested by
/// [`Firewall::respects_allowlist`](crate::firewall::Firewall::respects_allowlist).
///
/// The JSON input format is an object whose `"*"` key lists addresses
/// allowed on every port, and whose remaining keys are port strings or
/// ranges mapping to their own address lists:
///
/// ```json
/// { "*": ["10.0.0.0/8"], "443": ["198.51.100.7"], "8000-8100": ["10.1.0.0/16"] }
/// ```
///
/// An allowlist whose `all_ports` is `None` is malformed and fails every
/// compliance check with [`FirewallError::BadAllowlist`]. The deserializer
/// always produces `Some` (empty when the `"*"` key is missing), so `None`
/// only arises from hand-built values.
#[derive(Debug, Clone, Default)]
pub struct FirewallAllowlist {
    pub all_ports: Option<IPCollection>,
    pub port_map: HashMap<String, IPCollection>,
    // A lookup port may fall inside a *range* key rather than matching a
    // key verbatim, so the parsed forms of the keys are kept around.
    reverse_port_map: Vec<(AzurePort, String)>,
}

impl FirewallAllowlist {
    pub fn new(all_ports: IPCollection) -> FirewallAllowlist {
        FirewallAllowlist {
            all_ports: Some(all_ports),
            port_map: HashMap::new(),
            reverse_port_map: Vec::new(),
        }
    }

    /// The `all_ports` list, or `BadAllowlist` when it was never set.
    pub fn require_all_ports(&self) -> Result<&IPCollection, FirewallError> {
        self.all_ports.as_ref().ok_or(FirewallError::BadAllowlist)
    }

    /// Whether the allowlist restricts specific ports. Port agnostic
    /// firewalls answer `NotApplicable` when this is true.
    pub fn has_port_restrictions(&self) -> bool {
        !self.port_map.is_empty()
    }

    pub fn add_port_entry(&mut self, port: &str, ips: IPCollection) {
        self.port_map.insert(port.to_string(), ips);
        self.reverse_port_map
            .retain(|(_, key)| key != port);
        self.reverse_port_map
            .push((AzurePort::from_azure(port), port.to_string()));
    }

    pub fn remove_port_entry(&mut self, port: &str) {
        if self.port_map.remove(port).is_some() {
            self.reverse_port_map.retain(|(_, key)| key != port);
        }
    }

    pub fn reset(&mut self) {
        self.all_ports = Some(Vec::new());
        self.port_map.clear();
        self.reverse_port_map.clear();
    }

    /// Checks the all-ports list only. Use [`FirewallAllowlist::ip_passes_any`]
    /// to also consult per-port entries.
    pub fn ip_passes_star(&self, ip: &AzureIPv4) -> UnknownBool {
        match &self.all_ports {
            Some(list) => ip_in_list(ip, list),
            None => UnknownBool::False,
        }
    }

    /// Checks per-port entries only, including range keys that contain the
    /// lookup port.
    pub fn ip_passes_port(&self, port: &AzurePort, ip: &AzureIPv4) -> UnknownBool {
        if self.port_map.is_empty() {
            return UnknownBool::False;
        }
        let key = port.to_string();
        if let Some(ips) = self.port_map.get(&key) {
            return ip_in_list(ip, ips);
        }
        for (parsed, map_key) in &self.reverse_port_map {
            if port_contains(parsed, port) {
                if let Some(ips) = self.port_map.get(map_key) {
                    return ip_in_list(ip, ips);
                }
            }
        }
        UnknownBool::False
    }

    /// Whether the IP/port combination passes either the star list or a
    /// per-port entry.
    pub fn ip_passes_any(&self, port: &AzurePort, ip: &AzureIPv4) -> UnknownBool {
        self.ip_passes_star(ip).or(self.ip_passes_port(port, ip))
    }
}

impl<'de> Deserialize<'de> for FirewallAllowlist {
    fn deserialize<D>(deserializer: D) -> Result<FirewallAllowlist, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: HashMap<String, Vec<String>> = HashMap::deserialize(deserializer)?;
        let mut wl = FirewallAllowlist::new(Vec::new());
        for (key, ips) in raw {
            let parsed: IPCollection = ips.iter().map(|s| AzureIPv4::from_azure(s)).collect();
            if key == "*" {
                wl.all_ports = Some(parsed);
            } else {
                wl.add_port_entry(&key, parsed);
            }
        }
        Ok(wl)
    }
}
