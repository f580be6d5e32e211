//! The Azure firewall IP value type and its set arithmetic.
//!
//! Azure firewall fields mix several shapes in one string: `"*"`, a single
//! dotted address, a `begin-end` range, CIDR notation, comma separated
//! combinations of those, and symbolic service tags such as `Internet` or
//! `VirtualNetwork`. [`AzureIPv4`] encapsulates all of them behind one
//! immutable value so containment, equality and enumeration stay correct no
//! matter which shape the provider handed us.
//!
//! Allowed formats:
//! - `10.0.0.0/8` - CIDR
//! - `10.0.0.1` - single IP
//! - `10.0.0.0-10.0.0.255` - range
//! - `10.0.0.3,10.0.1.2` - comma separated singles and/or CIDRs
//! - `*` - any
//! - service tags: <https://docs.microsoft.com/en-us/azure/virtual-network/security-overview#service-tags>

use crate::firewall::FirewallError;
use crate::models::UnknownBool;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::net::Ipv4Addr;
use std::str::FromStr;

const IP_MIN: u32 = 0;
const IP_MAX: u32 = u32::MAX;

/// Address-set comparisons materialize sorted slices below this size and
/// switch to streaming enumeration above it. Noncontinuous multi-valued
/// ranges can be astronomically large, so the bound keeps memory flat.
const MAX_SLICE_ALLOCATION: u64 = 512;

/// The two well known platform addresses behind the `AzureLoadBalancer`
/// service tag.
///
/// <https://docs.microsoft.com/en-us/azure/virtual-network/security-overview#azure-platform-considerations>
///
/// Azure offers no API to discover these, so the resolution is a fixed
/// table. If the platform ever moves them this mapping goes stale; see
/// DESIGN.md for why we still prefer concrete resolution over `Unknown`.
const AZURE_LOAD_BALANCER_IPS: [&str; 2] = ["168.63.129.16", "169.254.169.254"];

lazy_static! {
    static ref RANGE_RE: Regex =
        Regex::new(r"^(\d{1,3}(?:\.\d{1,3}){3})-(\d{1,3}(?:\.\d{1,3}){3})$")
            .expect("Invalid Regex?");
    static ref CIDR_RE: Regex =
        Regex::new(r"^(\d{1,3}(?:\.\d{1,3}){3})/(\d{1,2})$").expect("Invalid Regex?");
}

/// Symbolic service tags that survive parsing.
///
/// `AzureLoadBalancer` is absent: it resolves to concrete addresses at
/// construction time (see [`AZURE_LOAD_BALANCER_IPS`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpTag {
    Internet,
    VirtualNetwork,
    /// A tag we do not recognize, e.g. one Azure added after this tool was
    /// written. The trusted constructor keeps it around instead of failing.
    Unrecognized,
}

fn parse_single(s: &str) -> Option<u32> {
    Ipv4Addr::from_str(s).ok().map(u32::from)
}

fn ip_to_string(v: u32) -> String {
    Ipv4Addr::from(v).to_string()
}

/// One member of an address set: a single address or a contiguous range.
/// The `cidr` flag only controls canonical rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IpBlock {
    Single(u32),
    Range { begin: u32, end: u32, cidr: bool },
}

impl IpBlock {
    fn from_cidr(addr: &str, mask: u8) -> Option<IpBlock> {
        let ip = parse_single(addr)?;
        if mask > 32 {
            return None;
        }
        if mask == 32 {
            return Some(IpBlock::Single(ip));
        }
        let host_bits = 32 - u32::from(mask);
        let (begin, end) = if host_bits == 32 {
            (IP_MIN, IP_MAX)
        } else {
            let begin = (ip >> host_bits) << host_bits;
            (begin, begin | ((1u32 << host_bits) - 1))
        };
        Some(IpBlock::Range { begin, end, cidr: true })
    }

    /// Union members may only be singles or CIDR blocks.
    fn from_member(s: &str) -> Option<IpBlock> {
        if let Some(v) = parse_single(s) {
            return Some(IpBlock::Single(v));
        }
        let caps = CIDR_RE.captures(s)?;
        let mask: u8 = caps[2].parse().ok()?;
        IpBlock::from_cidr(&caps[1], mask)
    }

    fn begin(&self) -> u32 {
        match *self {
            IpBlock::Single(v) => v,
            IpBlock::Range { begin, .. } => begin,
        }
    }

    fn end(&self) -> u32 {
        match *self {
            IpBlock::Single(v) => v,
            IpBlock::Range { end, .. } => end,
        }
    }

    fn contains(&self, v: u32) -> bool {
        self.begin() <= v && v <= self.end()
    }

    fn contains_range(&self, begin: u32, end: u32) -> bool {
        self.begin() <= begin && end <= self.end()
    }

    fn size(&self) -> u64 {
        u64::from(self.end()) - u64::from(self.begin()) + 1
    }

    fn to_cidr_string(&self) -> String {
        match *self {
            IpBlock::Single(v) => format!("{}/32", ip_to_string(v)),
            IpBlock::Range { begin, end, .. } => {
                let mut diff = begin ^ end;
                let mut mask = 32;
                while diff > 0 {
                    mask -= 1;
                    diff >>= 1;
                }
                format!("{}/{}", ip_to_string(begin), mask)
            }
        }
    }
}

impl std::fmt::Display for IpBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            IpBlock::Single(v) => write!(f, "{}", ip_to_string(v)),
            IpBlock::Range { begin, end, cidr } => {
                if begin == IP_MIN && end == IP_MAX {
                    write!(f, "*")
                } else if cidr {
                    write!(f, "{}", self.to_cidr_string())
                } else {
                    write!(f, "{}-{}", ip_to_string(begin), ip_to_string(end))
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
enum IpRepr {
    Empty,
    Special(IpTag),
    Block(IpBlock),
    Multiple(Vec<IpBlock>),
}

/// An immutable Azure firewall IP value. See the module docs for the shapes
/// it can take. Construct it once with [`AzureIPv4::from_azure`] (trusted
/// provider data) or [`AzureIPv4::checked_from_azure`] (user input) and
/// share it freely afterwards.
///
/// # Examples
/// ```
/// use azure_firewall_audit::models::AzureIPv4;
///
/// let block = AzureIPv4::from_azure("10.1.2.0/24");
/// assert_eq!(block.size(), 256);
/// assert!(block.contains("10.1.2.17").is_true());
/// ```
#[derive(Debug, Clone)]
pub struct AzureIPv4 {
    raw: String,
    repr: IpRepr,
}

impl AzureIPv4 {
    /// An unset value. Contains nothing and is contained by nothing.
    pub fn empty() -> AzureIPv4 {
        AzureIPv4 {
            raw: String::new(),
            repr: IpRepr::Empty,
        }
    }

    /// Parses a trusted Azure-format string. This never fails: anything
    /// that does not match the grammar is kept as an unrecognized tag,
    /// which behaves as "unknown" in every containment question.
    pub fn from_azure(az: &str) -> AzureIPv4 {
        if az.is_empty() {
            return AzureIPv4::empty();
        }
        if az == "*" {
            return AzureIPv4 {
                raw: az.to_string(),
                repr: IpRepr::Block(IpBlock::Range {
                    begin: IP_MIN,
                    end: IP_MAX,
                    cidr: false,
                }),
            };
        }
        if let Some(v) = parse_single(az) {
            return AzureIPv4 {
                raw: az.to_string(),
                repr: IpRepr::Block(IpBlock::Single(v)),
            };
        }
        if let Some(caps) = RANGE_RE.captures(az) {
            if let (Some(begin), Some(end)) = (parse_single(&caps[1]), parse_single(&caps[2])) {
                return AzureIPv4 {
                    raw: az.to_string(),
                    repr: IpRepr::Block(IpBlock::Range { begin, end, cidr: false }),
                };
            }
        }
        if let Some(caps) = CIDR_RE.captures(az) {
            if let Some(block) = caps[2]
                .parse::<u8>()
                .ok()
                .and_then(|mask| IpBlock::from_cidr(&caps[1], mask))
            {
                return AzureIPv4 {
                    raw: az.to_string(),
                    repr: IpRepr::Block(block),
                };
            }
        }
        if az.contains(',') {
            let members: Option<Vec<IpBlock>> = az.split(',').map(IpBlock::from_member).collect();
            if let Some(blocks) = members {
                return AzureIPv4 {
                    raw: az.to_string(),
                    repr: normalize_multiple(blocks),
                };
            }
        }
        match az.to_lowercase().as_str() {
            "internet" => AzureIPv4 {
                raw: az.to_string(),
                repr: IpRepr::Special(IpTag::Internet),
            },
            "virtualnetwork" => AzureIPv4 {
                raw: az.to_string(),
                repr: IpRepr::Special(IpTag::VirtualNetwork),
            },
            "azureloadbalancer" => AzureIPv4::from_azure(&AZURE_LOAD_BALANCER_IPS.join(",")),
            _ => AzureIPv4 {
                raw: az.to_string(),
                repr: IpRepr::Special(IpTag::Unrecognized),
            },
        }
    }

    /// Parses a user-supplied string, failing on anything that would
    /// otherwise degrade to the unrecognized-tag state.
    pub fn checked_from_azure(az: &str) -> Result<AzureIPv4, FirewallError> {
        let ip = AzureIPv4::from_azure(az);
        if ip.special_tag() == Some(IpTag::Unrecognized) {
            return Err(FirewallError::MalformedIpv4(az.to_string()));
        }
        Ok(ip)
    }

    /// Builds a value from a begin/end address pair. A degenerate range
    /// collapses to a single address. Invalid input yields the empty value.
    pub fn from_range(begin: &str, end: &str) -> AzureIPv4 {
        match (parse_single(begin), parse_single(end)) {
            (Some(b), Some(e)) => {
                let repr = if b == e {
                    IpRepr::Block(IpBlock::Single(b))
                } else {
                    IpRepr::Block(IpBlock::Range { begin: b, end: e, cidr: false })
                };
                AzureIPv4 {
                    raw: String::new(),
                    repr,
                }
            }
            _ => AzureIPv4::empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.repr, IpRepr::Empty)
    }

    /// Whether this is a symbolic service tag. Special values answer
    /// `Unknown` to almost every containment question.
    pub fn is_special(&self) -> bool {
        matches!(self.repr, IpRepr::Special(_))
    }

    pub fn special_tag(&self) -> Option<IpTag> {
        match self.repr {
            IpRepr::Special(tag) => Some(tag),
            _ => None,
        }
    }

    /// The single address as a `u32`. `None` unless this value holds
    /// exactly one explicitly-single address.
    pub fn as_u32(&self) -> Option<u32> {
        match self.repr {
            IpRepr::Block(IpBlock::Single(v)) => Some(v),
            _ => None,
        }
    }

    /// How many addresses this value holds. `"*"` holds 2^32, which is why
    /// this is a `u64`. Special tags and the empty value report 0.
    pub fn size(&self) -> u64 {
        match &self.repr {
            IpRepr::Empty | IpRepr::Special(_) => 0,
            IpRepr::Block(b) => b.size(),
            IpRepr::Multiple(blocks) => blocks.iter().map(IpBlock::size).sum(),
        }
    }

    /// Containment of a single dotted-quad string. Anything that is not a
    /// single IPv4 address gives `Unknown`.
    pub fn contains(&self, other: &str) -> UnknownBool {
        // Empty doesn't contain anything and nothing contains empty
        if self.is_empty() || other.is_empty() {
            return UnknownBool::False;
        }
        if self.is_special() {
            return UnknownBool::Unknown;
        }
        match parse_single(other) {
            Some(v) => self.contains_u32(v),
            None => UnknownBool::Unknown,
        }
    }

    pub fn contains_u32(&self, v: u32) -> UnknownBool {
        match &self.repr {
            IpRepr::Empty => UnknownBool::False,
            IpRepr::Special(_) => UnknownBool::Unknown,
            IpRepr::Block(b) => UnknownBool::from_bool(b.contains(v)),
            IpRepr::Multiple(blocks) => {
                UnknownBool::from_bool(blocks.iter().any(|b| b.contains(v)))
            }
        }
    }

    pub fn contains_range(&self, begin: &str, end: &str) -> UnknownBool {
        if self.is_empty() {
            return UnknownBool::False;
        }
        if self.is_special() {
            return UnknownBool::Unknown;
        }
        match (parse_single(begin), parse_single(end)) {
            (Some(b), Some(e)) => self.contains_range_u32(b, e),
            _ => UnknownBool::False,
        }
    }

    /// Whether one of this value's blocks contains the whole `[begin, end]`
    /// range.
    pub fn contains_range_u32(&self, begin: u32, end: u32) -> UnknownBool {
        match &self.repr {
            IpRepr::Empty => UnknownBool::False,
            IpRepr::Special(_) => UnknownBool::Unknown,
            IpRepr::Block(b) => UnknownBool::from_bool(b.contains_range(begin, end)),
            IpRepr::Multiple(blocks) => {
                UnknownBool::from_bool(blocks.iter().any(|b| b.contains_range(begin, end)))
            }
        }
    }

    /// Whether the value is one contiguous `[begin, end]` block. A single
    /// address is a continuous range beginning and ending with itself.
    pub fn continuous_range_u32(&self) -> (UnknownBool, u32, u32) {
        match &self.repr {
            IpRepr::Special(_) => (UnknownBool::Unknown, 0, 0),
            IpRepr::Empty | IpRepr::Multiple(_) => (UnknownBool::False, 0, 0),
            IpRepr::Block(b) => (UnknownBool::True, b.begin(), b.end()),
        }
    }

    /// String form of [`AzureIPv4::continuous_range_u32`].
    pub fn continuous_range(&self) -> (UnknownBool, String, String) {
        let (is, begin, end) = self.continuous_range_u32();
        if is.is_true() {
            (is, ip_to_string(begin), ip_to_string(end))
        } else {
            (is, String::new(), String::new())
        }
    }

    /// Every address in ascending order. Use [`AzureIPv4::iter_u32`] for
    /// large ranges; this one allocates the whole set.
    pub fn all_ips_u32(&self) -> Vec<u32> {
        self.iter_u32().collect()
    }

    /// String forms of every address. Special tags yield their raw tag as
    /// the single element, mirroring how they print.
    pub fn all_ips(&self) -> Vec<String> {
        match &self.repr {
            IpRepr::Special(_) => vec![self.raw.clone()],
            IpRepr::Empty => Vec::new(),
            _ => self.iter_u32().map(ip_to_string).collect(),
        }
    }

    /// A lazy, ascending enumeration of every address in the set. Dropping
    /// the iterator cancels the walk, so arbitrarily large ranges can be
    /// inspected in bounded memory. Special tags and the empty value
    /// enumerate nothing.
    pub fn iter_u32(&self) -> Ipv4Iter {
        let ranges: Vec<(u32, u32)> = match &self.repr {
            IpRepr::Empty | IpRepr::Special(_) => Vec::new(),
            IpRepr::Block(b) => vec![(b.begin(), b.end())],
            IpRepr::Multiple(blocks) => blocks.iter().map(|b| (b.begin(), b.end())).collect(),
        };
        Ipv4Iter {
            ranges: ranges.into_iter(),
            cur: None,
        }
    }

    /// Like [`AzureIPv4::iter_u32`] but yielding dotted-quad strings.
    pub fn iter(&self) -> impl Iterator<Item = String> {
        self.iter_u32().map(ip_to_string)
    }

    /// Representation-independent set equality. Two values holding the same
    /// addresses compare equal no matter which grammar shape built them.
    fn set_equals(&self, other: &AzureIPv4) -> bool {
        match (&self.repr, &other.repr) {
            (IpRepr::Empty, IpRepr::Empty) => return true,
            (IpRepr::Special(_), IpRepr::Special(_)) => {
                return same_special(self, other);
            }
            (IpRepr::Empty, _) | (_, IpRepr::Empty) => return false,
            (IpRepr::Special(_), _) | (_, IpRepr::Special(_)) => return false,
            _ => {}
        }
        let size = self.size();
        if size != other.size() {
            return false;
        }
        // Continuous ranges compare by their bounds alone.
        let (s_cont, s_begin, s_end) = self.continuous_range_u32();
        let (o_cont, o_begin, o_end) = other.continuous_range_u32();
        if s_cont.is_true() && o_cont.is_true() {
            return s_begin == o_begin && s_end == o_end;
        }
        if size < MAX_SLICE_ALLOCATION {
            let mut a = self.all_ips_u32();
            let mut b = other.all_ips_u32();
            a.sort_unstable();
            b.sort_unstable();
            return a == b;
        }
        // Too big to materialize: stream both sides. Block lists are kept
        // sorted by starting address, so enumeration order lines up.
        let mut a = self.iter_u32();
        let mut b = other.iter_u32();
        loop {
            match (a.next(), b.next()) {
                (None, None) => return true,
                (Some(x), Some(y)) if x == y => {}
                _ => return false,
            }
        }
    }
}

impl PartialEq for AzureIPv4 {
    fn eq(&self, other: &AzureIPv4) -> bool {
        self.set_equals(other)
    }
}

impl Default for AzureIPv4 {
    fn default() -> AzureIPv4 {
        AzureIPv4::empty()
    }
}

impl std::fmt::Display for AzureIPv4 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.repr {
            IpRepr::Empty | IpRepr::Special(_) => write!(f, "{}", self.raw),
            IpRepr::Block(b) => write!(f, "{b}"),
            IpRepr::Multiple(blocks) => {
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

impl Serialize for AzureIPv4 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AzureIPv4 {
    fn deserialize<D>(deserializer: D) -> Result<AzureIPv4, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(AzureIPv4::from_azure(&s))
    }
}

/// Tag identity. The grammar is case insensitive, so two spellings of the
/// same recognized tag name the same set; unrecognized tags only match
/// their own text.
fn same_special(a: &AzureIPv4, b: &AzureIPv4) -> bool {
    match (a.special_tag(), b.special_tag()) {
        (Some(IpTag::Unrecognized), Some(IpTag::Unrecognized)) => {
            a.raw.eq_ignore_ascii_case(&b.raw)
        }
        (Some(ta), Some(tb)) => ta == tb,
        _ => false,
    }
}

/// Keeps union members sorted by starting address so enumeration is
/// ascending, and collapses an all-singles union into one contiguous range
/// when the sorted members form one.
fn normalize_multiple(mut blocks: Vec<IpBlock>) -> IpRepr {
    blocks.sort_by_key(|b| (b.begin(), b.end()));
    let all_single = blocks.iter().all(|b| matches!(b, IpBlock::Single(_)));
    if all_single && blocks.len() > 1 {
        // Strictly consecutive: duplicates must not collapse.
        let consecutive = blocks
            .windows(2)
            .all(|w| w[0].begin().checked_add(1) == Some(w[1].begin()));
        if consecutive {
            return IpRepr::Block(IpBlock::Range {
                begin: blocks[0].begin(),
                end: blocks[blocks.len() - 1].begin(),
                cidr: false,
            });
        }
    }
    IpRepr::Multiple(blocks)
}

/// Lazy ascending walk over the addresses of an [`AzureIPv4`]. Created by
/// [`AzureIPv4::iter_u32`].
pub struct Ipv4Iter {
    ranges: std::vec::IntoIter<(u32, u32)>,
    // (next value to yield, inclusive end of the current block)
    cur: Option<(u32, u32)>,
}

impl Iterator for Ipv4Iter {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
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

/// A list of [`AzureIPv4`] values. Serializes as a JSON array of canonical
/// strings. An empty collection means "everything is allowed" when used as
/// a firewall; see the `Firewall` impl in the firewall module.
pub type IPCollection = Vec<AzureIPv4>;

/// Renders an [`IPCollection`] the way Azure prints address lists.
pub fn comma_join_ips(list: &[AzureIPv4]) -> String {
    list.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Does `within` contain every address of `find`?
///
/// Symbolic tags are incomparable except by identity, with two carve-outs:
/// `"*"` contains everything (tags included), and nothing but `"*"`
/// contains `"*"`.
pub fn ip_contains(within: &AzureIPv4, find: &AzureIPv4) -> UnknownBool {
    // Empty can't contain anything and nothing can contain empty.
    if within.is_empty() || find.is_empty() {
        return UnknownBool::False;
    }

    if within.is_special() {
        if find.is_special() {
            return UnknownBool::from_bool(same_special(within, find));
        }
        // "*" is never inside a tag, whatever the tag turns out to mean.
        let (find_cont, find_begin, find_end) = find.continuous_range_u32();
        if find_cont.is_true() && find_begin == IP_MIN && find_end == IP_MAX {
            return UnknownBool::False;
        }
        return UnknownBool::Unknown;
    }

    let (within_cont, within_begin, within_end) = within.continuous_range_u32();
    if within_cont.is_true() && within_begin == IP_MIN && within_end == IP_MAX {
        return UnknownBool::True;
    }

    // A tag could easily sit inside 10.0.0.0/8 in some deployments. We just
    // don't have enough information to decide.
    if find.is_special() {
        return UnknownBool::Unknown;
    }

    if find.size() > within.size() {
        return UnknownBool::False;
    }
    if find.size() == 1 {
        if let Some(v) = find.as_u32() {
            return within.contains_u32(v);
        }
    }
    let (find_cont, find_begin, find_end) = find.continuous_range_u32();
    if find_cont.is_true() {
        // "*" would have been caught above; the container is smaller.
        if find_begin == IP_MIN && find_end == IP_MAX {
            return UnknownBool::False;
        }
        if within_cont.is_true() && within_begin <= find_begin && within_end >= find_end {
            return UnknownBool::True;
        }
        return within.contains_range_u32(find_begin, find_end);
    }
    if find.size() < MAX_SLICE_ALLOCATION {
        for ip in find.all_ips_u32() {
            let contains = within.contains_u32(ip);
            if !contains.is_true() {
                return contains;
            }
        }
        return UnknownBool::True;
    }
    for ip in find.iter_u32() {
        let contains = within.contains_u32(ip);
        if !contains.is_true() {
            return contains;
        }
    }
    UnknownBool::True
}

/// Set equality between two arbitrary representations. Always concrete for
/// values built by this crate; the `UnknownBool` return keeps the signature
/// aligned with the rest of the containment algebra.
pub fn ips_equal(a: &AzureIPv4, b: &AzureIPv4) -> UnknownBool {
    UnknownBool::from_bool(a == b)
}

/// Whether any entry of `list` contains `chk`. An empty list contains
/// nothing.
pub fn ip_in_list(chk: &AzureIPv4, list: &[AzureIPv4]) -> UnknownBool {
    if list.is_empty() {
        return UnknownBool::False;
    }
    let mut uncertain = false;
    for ip in list {
        let contains = ip_contains(ip, chk);
        if contains.is_true() {
            return UnknownBool::True;
        }
        if contains.is_unknown() {
            uncertain = true;
        }
    }
    if uncertain {
        UnknownBool::Unknown
    } else {
        UnknownBool::False
    }
}

lazy_static! {
    static ref RFC1918_PRIVATE_SPACES: [AzureIPv4; 3] = [
        AzureIPv4::from_azure("192.168.0.0/16"),
        AzureIPv4::from_azure("172.16.0.0/12"),
        AzureIPv4::from_azure("10.0.0.0/8"),
    ];
}

/// Whether the whole value sits inside one RFC 1918 private space.
pub fn ip_is_rfc1918_private(ip: &AzureIPv4) -> bool {
    let (is, begin, end) = ip.continuous_range_u32();
    if !is.is_true() {
        return false;
    }
    RFC1918_PRIVATE_SPACES
        .iter()
        .any(|private| private.contains_range_u32(begin, end).is_true())
}
