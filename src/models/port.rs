//! The Azure firewall port value type.
//!
//! Mirrors the IP value type over the 16 bit port space: `"*"`, a single
//! port, a `begin-end` range, or a comma separated combination. Ports have
//! no symbolic tags, so containment answers are plain booleans.

use crate::firewall::FirewallError;
use crate::models::UnknownBool;
use serde::{Deserialize, Deserializer, Serialize};

const PORT_MAX: u16 = u16::MAX;

/// Port-set comparisons materialize sorted slices below this size and
/// stream above it.
const MAX_PORT_SLICE: u32 = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PortBlock {
    Single(u16),
    Range { begin: u16, end: u16 },
}

impl PortBlock {
    fn begin(&self) -> u16 {
        match *self {
            PortBlock::Single(v) => v,
            PortBlock::Range { begin, .. } => begin,
        }
    }

    fn end(&self) -> u16 {
        match *self {
            PortBlock::Single(v) => v,
            PortBlock::Range { end, .. } => end,
        }
    }

    fn contains(&self, port: u16) -> bool {
        self.begin() <= port && port <= self.end()
    }

    fn contains_range(&self, begin: u16, end: u16) -> bool {
        self.begin() <= begin && end <= self.end()
    }

    fn size(&self) -> u32 {
        u32::from(self.end()) - u32::from(self.begin()) + 1
    }

    fn from_member(s: &str) -> Option<PortBlock> {
        if let Ok(v) = s.parse::<u16>() {
            return Some(PortBlock::Single(v));
        }
        let (begin_s, end_s) = s.split_once('-')?;
        let begin: u16 = begin_s.parse().ok()?;
        let end: u16 = end_s.parse().ok()?;
        if begin <= end {
            Some(PortBlock::Range { begin, end })
        } else {
            Some(PortBlock::Range { begin: end, end: begin })
        }
    }
}

impl std::fmt::Display for PortBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            PortBlock::Single(v) => write!(f, "{v}"),
            PortBlock::Range { begin, end } => {
                if begin == 0 && end == PORT_MAX {
                    write!(f, "*")
                } else {
                    write!(f, "{begin}-{end}")
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
enum PortRepr {
    Unset,
    Block(PortBlock),
    Multiple(Vec<PortBlock>),
}

/// An immutable Azure firewall port value: unset, a single port, a range,
/// `"*"` (the full `0-65535` range), or a union of those.
#[derive(Debug, Clone)]
pub struct AzurePort {
    repr: PortRepr,
}

impl AzurePort {
    /// Parses a trusted Azure-format port string. Unparseable input leaves
    /// the value unset (size 0) rather than failing.
    pub fn from_azure(az: &str) -> AzurePort {
        if az == "*" {
            return AzurePort {
                repr: PortRepr::Block(PortBlock::Range { begin: 0, end: PORT_MAX }),
            };
        }
        if let Ok(v) = az.parse::<u16>() {
            return AzurePort {
                repr: PortRepr::Block(PortBlock::Single(v)),
            };
        }
        if az.contains(',') {
            let members: Option<Vec<PortBlock>> =
                az.split(',').map(PortBlock::from_member).collect();
            if let Some(blocks) = members {
                let mut blocks = blocks;
                blocks.sort_by_key(|b| (b.begin(), b.end()));
                return AzurePort {
                    repr: PortRepr::Multiple(blocks),
                };
            }
            return AzurePort { repr: PortRepr::Unset };
        }
        match PortBlock::from_member(az) {
            Some(block) => AzurePort {
                repr: PortRepr::Block(block),
            },
            None => AzurePort { repr: PortRepr::Unset },
        }
    }

    /// Parses a user-supplied string, failing where the trusted constructor
    /// would produce an unset value.
    pub fn checked_from_azure(az: &str) -> Result<AzurePort, FirewallError> {
        let p = AzurePort::from_azure(az);
        if p.size() == 0 {
            return Err(FirewallError::MalformedPort(az.to_string()));
        }
        Ok(p)
    }

    pub fn from_u16(v: u16) -> AzurePort {
        AzurePort {
            repr: PortRepr::Block(PortBlock::Single(v)),
        }
    }

    /// The single port value. `None` unless this holds exactly one
    /// explicitly-single port.
    pub fn as_u16(&self) -> Option<u16> {
        match self.repr {
            PortRepr::Block(PortBlock::Single(v)) => Some(v),
            _ => None,
        }
    }

    pub fn is_star(&self) -> bool {
        matches!(
            self.repr,
            PortRepr::Block(PortBlock::Range { begin: 0, end: PORT_MAX })
        )
    }

    /// How many ports this value holds, at most 65,536. Unset reports 0.
    pub fn size(&self) -> u32 {
        match &self.repr {
            PortRepr::Unset => 0,
            PortRepr::Block(b) => b.size(),
            PortRepr::Multiple(blocks) => blocks.iter().map(PortBlock::size).sum(),
        }
    }

    pub fn contains(&self, port: u16) -> bool {
        match &self.repr {
            PortRepr::Unset => false,
            PortRepr::Block(b) => b.contains(port),
            PortRepr::Multiple(blocks) => blocks.iter().any(|b| b.contains(port)),
        }
    }

    /// Whether one of this value's blocks covers the whole `[begin, end]`
    /// range.
    pub fn contains_range(&self, begin: u16, end: u16) -> bool {
        let (begin, end) = if begin <= end { (begin, end) } else { (end, begin) };
        match &self.repr {
            PortRepr::Unset => false,
            PortRepr::Block(b) => b.contains_range(begin, end),
            PortRepr::Multiple(blocks) => blocks.iter().any(|b| b.contains_range(begin, end)),
        }
    }

    pub fn continuous_range(&self) -> (bool, u16, u16) {
        match &self.repr {
            PortRepr::Block(b) => (true, b.begin(), b.end()),
            _ => (false, 0, 0),
        }
    }

    /// Every port in ascending order. See [`AzurePort::iter`] for the lazy
    /// form.
    pub fn all_ports(&self) -> Vec<u16> {
        self.iter().collect()
    }

    /// Lazy ascending enumeration; dropping the iterator cancels the walk.
    pub fn iter(&self) -> PortIter {
        let ranges: Vec<(u16, u16)> = match &self.repr {
            PortRepr::Unset => Vec::new(),
            PortRepr::Block(b) => vec![(b.begin(), b.end())],
            PortRepr::Multiple(blocks) => blocks.iter().map(|b| (b.begin(), b.end())).collect(),
        };
        PortIter {
            ranges: ranges.into_iter(),
            cur: None,
        }
    }

    fn set_equals(&self, other: &AzurePort) -> bool {
        if matches!(self.repr, PortRepr::Unset) || matches!(other.repr, PortRepr::Unset) {
            return matches!(self.repr, PortRepr::Unset) && matches!(other.repr, PortRepr::Unset);
        }
        let size = self.size();
        if size != other.size() {
            return false;
        }
        let (s_cont, s_begin, s_end) = self.continuous_range();
        let (o_cont, o_begin, o_end) = other.continuous_range();
        if s_cont && o_cont {
            return s_begin == o_begin && s_end == o_end;
        }
        if size < MAX_PORT_SLICE {
            let mut a = self.all_ports();
            let mut b = other.all_ports();
            a.sort_unstable();
            b.sort_unstable();
            return a == b;
        }
        let mut a = self.iter();
        let mut b = other.iter();
        loop {
            match (a.next(), b.next()) {
                (None, None) => return true,
                (Some(x), Some(y)) if x == y => {}
                _ => return false,
            }
        }
    }
}

impl PartialEq for AzurePort {
    fn eq(&self, other: &AzurePort) -> bool {
        self.set_equals(other)
    }
}

impl Default for AzurePort {
    fn default() -> AzurePort {
        AzurePort { repr: PortRepr::Unset }
    }
}

impl std::fmt::Display for AzurePort {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.repr {
            PortRepr::Unset => Ok(()),
            PortRepr::Block(b) => write!(f, "{b}"),
            PortRepr::Multiple(blocks) => {
                let joined = blocks
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                write!(f, "{joined}")
            }
        }
    }
}

impl Serialize for AzurePort {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AzurePort {
    fn deserialize<D>(deserializer: D) -> Result<AzurePort, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(AzurePort::from_azure(&s))
    }
}

/// Lazy ascending walk over the ports of an [`AzurePort`].
pub struct PortIter {
    ranges: std::vec::IntoIter<(u16, u16)>,
    cur: Option<(u16, u16)>,
}

impl Iterator for PortIter {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        loop {
            match self.cur {
                Some((v, end)) => {
                    self.cur = if v == end { None } else { Some((v + 1, end)) };
                    return Some(v);
                }
                None => match self.ranges.next() {
                    Some((begin, end)) => self.cur = Some((begin, end)),
                    None => return None,
                },
            }
        }
    }
}

/// A list of [`AzurePort`] values, serialized as a JSON array of canonical
/// strings.
pub type PortCollection = Vec<AzurePort>;

/// Does `within` contain every port of `find`?
pub fn port_contains(within: &AzurePort, find: &AzurePort) -> bool {
    if find.size() > within.size() {
        return false;
    }
    if find.size() == 1 {
        if let Some(v) = find.as_u16() {
            return within.contains(v);
        }
    }
    let (find_cont, find_begin, find_end) = find.continuous_range();
    if find_cont {
        return within.contains_range(find_begin, find_end);
    }
    if find.size() < 100 {
        return find.all_ports().iter().all(|p| within.contains(*p));
    }
    find.iter().all(|p| within.contains(p))
}

/// Representation-independent set equality for ports.
pub fn ports_equal(a: &AzurePort, b: &AzurePort) -> bool {
    a == b
}

/// `UnknownBool`-typed equality so port comparisons compose with the rest
/// of the tri-state algebra.
pub fn ports_equal_ub(a: &AzurePort, b: &AzurePort) -> UnknownBool {
    UnknownBool::from_bool(a == b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_port() {
        let p = AzurePort::from_azure("8080");
        assert_eq!(p.size(), 1);
        assert_eq!(p.as_u16(), Some(8080));
        assert!(p.contains(8080));
        assert!(!p.contains(8081));
        assert_eq!(p.to_string(), "8080");
        assert!(!p.is_star());
    }

    #[test]
    fn test_port_range() {
        let p = AzurePort::from_azure("1000-2000");
        assert_eq!(p.size(), 1001);
        assert!(p.contains(1000));
        assert!(p.contains(1500));
        assert!(p.contains(2000));
        assert!(!p.contains(999));
        assert!(!p.contains(2001));
        assert!(p.contains_range(1200, 1300));
        assert!(!p.contains_range(900, 1300));
        assert_eq!(p.to_string(), "1000-2000");
    }

    #[test]
    fn test_star_port() {
        let p = AzurePort::from_azure("*");
        assert!(p.is_star());
        assert_eq!(p.size(), 65536);
        assert!(p.contains(0));
        assert!(p.contains(65535));
        assert_eq!(p.to_string(), "*");
    }

    #[test]
    fn test_multiple_ports() {
        let p = AzurePort::from_azure("80,443,8000-8010");
        assert_eq!(p.size(), 13);
        assert!(p.contains(80));
        assert!(p.contains(443));
        assert!(p.contains(8005));
        assert!(!p.contains(81));
        assert_eq!(p.to_string(), "80,443,8000-8010");
        let (cont, _, _) = p.continuous_range();
        assert!(!cont, "multiple ports are not a continuous range");
    }

    #[test]
    fn test_unset_port() {
        let p = AzurePort::from_azure("not a port");
        assert_eq!(p.size(), 0);
        assert!(!p.contains(80));
        assert_eq!(p.to_string(), "");
        assert!(AzurePort::checked_from_azure("not a port").is_err());
        assert!(AzurePort::checked_from_azure("70000").is_err());
        assert!(AzurePort::checked_from_azure("443").is_ok());
    }

    #[test]
    fn test_port_contains() {
        let star = AzurePort::from_azure("*");
        let single = AzurePort::from_azure("5888");
        let range = AzurePort::from_azure("5000-6000");
        assert!(port_contains(&star, &single));
        assert!(port_contains(&star, &range));
        assert!(port_contains(&range, &single));
        assert!(!port_contains(&single, &range));
        assert!(port_contains(&single, &single));
        assert!(!port_contains(&range, &star));
    }

    #[test]
    fn test_ports_equal_across_representations() {
        let range = AzurePort::from_azure("80-82");
        let multi = AzurePort::from_azure("80,81,82");
        assert!(ports_equal(&range, &multi));
        assert!(ports_equal_ub(&multi, &range).is_true());
        let other = AzurePort::from_azure("80,81,83");
        assert!(!ports_equal(&range, &other));
        assert!(
            !ports_equal(&AzurePort::from_azure("80"), &AzurePort::from_azure("81")),
            "different ports should not be equal"
        );
    }

    #[test]
    fn test_iteration() {
        let p = AzurePort::from_azure("8000-8002,80");
        let got: Vec<u16> = p.iter().collect();
        assert_eq!(got, vec![80, 8000, 8001, 8002], "ascending iteration");
        let star = AzurePort::from_azure("*");
        let first: Vec<u16> = star.iter().take(3).collect();
        assert_eq!(first, vec![0, 1, 2]);
    }

    #[test]
    fn test_json_round_trip() {
        for s in ["443", "1000-2000", "80,443,8000-8010", "*", ""] {
            let p = AzurePort::from_azure(s);
            let json = serde_json::to_string(&p).expect("Error serializing AzurePort");
            let back: AzurePort =
                serde_json::from_str(&json).expect("Error deserializing AzurePort");
            assert_eq!(back, p, "round-trip mangled {s}");
        }
        let ports: PortCollection = vec![AzurePort::from_azure("80"), AzurePort::from_azure("*")];
        let json = serde_json::to_string(&ports).expect("Error serializing PortCollection");
        assert_eq!(json, r#"["80","*"]"#);
        let back: PortCollection =
            serde_json::from_str(&json).expect("Error deserializing PortCollection");
        assert_eq!(back, ports);
    }
}
