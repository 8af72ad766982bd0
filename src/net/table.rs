//! Snapshot types for links, addresses, and routes.
//!
//! Everything in this module is an immutable point-in-time view of kernel
//! state. Tables are built once per resolution call by a provider and only
//! read afterwards; nothing here mutates live network configuration.

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// IP address family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpFamily {
    /// IPv4.
    V4,
    /// IPv6.
    V6,
}

impl IpFamily {
    /// Returns the family of the given address.
    #[must_use]
    pub const fn of(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => Self::V4,
            IpAddr::V6(_) => Self::V6,
        }
    }

    /// Address width in bits for this family.
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::V4 => 32,
            Self::V6 => 128,
        }
    }
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4 => write!(f, "IPv4"),
            Self::V6 => write!(f, "IPv6"),
        }
    }
}

/// A network interface, identified by its stable kernel index and name.
///
/// Ordering is by index first so that table iteration is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Link {
    /// Kernel interface index.
    pub index: u32,
    /// Interface name (e.g., "eth0").
    pub name: String,
}

impl Link {
    /// Creates a link descriptor.
    #[must_use]
    pub fn new(index: u32, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.index)
    }
}

/// Error type for prefix construction and parsing.
#[derive(Debug, Error)]
pub enum PrefixError {
    /// The string was not in `address/length` form.
    #[error("Invalid prefix '{0}': expected 'address/length'")]
    Format(String),

    /// The address part failed to parse.
    #[error("Invalid prefix address '{0}'")]
    Address(String),

    /// The length part failed to parse or exceeds the family width.
    #[error("Invalid prefix length '{len}' for {family}")]
    Length {
        /// The offending length string.
        len: String,
        /// Family the length was checked against.
        family: IpFamily,
    },
}

/// A destination prefix: a network address plus prefix length.
///
/// The address/length pair is validated at construction, so a `Prefix` value
/// always has a length within its family's width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Prefix {
    addr: IpAddr,
    len: u8,
}

impl Prefix {
    /// Creates a prefix, validating the length against the address family.
    ///
    /// # Errors
    ///
    /// Returns [`PrefixError::Length`] if `len` exceeds the family width
    /// (32 for IPv4, 128 for IPv6).
    pub fn new(addr: IpAddr, len: u8) -> Result<Self, PrefixError> {
        let family = IpFamily::of(addr);
        if len > family.bits() {
            return Err(PrefixError::Length {
                len: len.to_string(),
                family,
            });
        }
        Ok(Self { addr, len })
    }

    /// The network address of this prefix.
    #[must_use]
    pub const fn addr(&self) -> IpAddr {
        self.addr
    }

    /// The prefix length.
    #[must_use]
    pub const fn len(&self) -> u8 {
        self.len
    }

    /// Returns true for a zero-length prefix, which matches its entire
    /// address family.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The address family of this prefix.
    #[must_use]
    pub const fn family(&self) -> IpFamily {
        IpFamily::of(self.addr)
    }

    /// Returns true if `ip` falls inside this prefix.
    ///
    /// A target of the other address family never matches.
    #[must_use]
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self.addr, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                let mask = if self.len == 0 {
                    0
                } else {
                    u32::MAX << (32 - self.len)
                };
                (u32::from(ip) & mask) == (u32::from(net) & mask)
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                let mask = if self.len == 0 {
                    0
                } else {
                    u128::MAX << (128 - self.len)
                };
                (u128::from(ip) & mask) == (u128::from(net) & mask)
            }
            _ => false,
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.len)
    }
}

impl FromStr for Prefix {
    type Err = PrefixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_part, len_part) = s
            .split_once('/')
            .ok_or_else(|| PrefixError::Format(s.to_string()))?;
        let addr: IpAddr = addr_part
            .parse()
            .map_err(|_| PrefixError::Address(addr_part.to_string()))?;
        let len: u8 = len_part.parse().map_err(|_| PrefixError::Length {
            len: len_part.to_string(),
            family: IpFamily::of(addr),
        })?;
        Self::new(addr, len)
    }
}

// Serialized as the canonical "address/length" string so prefixes read
// naturally in snapshot files and configs.
impl Serialize for Prefix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Prefix {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Provenance of a route: which subsystem installed it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RouteProtocol {
    /// Installed by the kernel during address configuration.
    Kernel,
    /// Installed at boot.
    Boot,
    /// Statically configured.
    Static,
    /// Learned from DHCP.
    Dhcp,
    /// Learned from an IPv6 router advertisement.
    Ra,
    /// Any other origin.
    #[default]
    Other,
}

impl RouteProtocol {
    /// Parses an iproute2-style protocol name; unknown names map to `Other`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "kernel" => Self::Kernel,
            "boot" => Self::Boot,
            "static" => Self::Static,
            "dhcp" => Self::Dhcp,
            "ra" => Self::Ra,
            _ => Self::Other,
        }
    }

    /// The iproute2-style name of this protocol.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Kernel => "kernel",
            Self::Boot => "boot",
            Self::Static => "static",
            Self::Dhcp => "dhcp",
            Self::Ra => "ra",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for RouteProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Serialized as the lowercase protocol name; unknown names deserialize to
// `Other` so captured tables from newer kernels keep loading.
impl Serialize for RouteProtocol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for RouteProtocol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from_name(&s))
    }
}

/// A single route: a destination prefix (or none for the default route),
/// the owning link's index, and the installing protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Destination prefix. `None` means this is a default route.
    #[serde(default)]
    pub dst: Option<Prefix>,
    /// Index of the link that carries traffic for this route.
    pub link_index: u32,
    /// Which subsystem installed the route.
    #[serde(default)]
    pub protocol: RouteProtocol,
}

impl Route {
    /// Creates a route toward a specific destination prefix.
    #[must_use]
    pub const fn to(dst: Prefix, link_index: u32, protocol: RouteProtocol) -> Self {
        Self {
            dst: Some(dst),
            link_index,
            protocol,
        }
    }

    /// Creates a default route owned by the given link.
    #[must_use]
    pub const fn default_via(link_index: u32, protocol: RouteProtocol) -> Self {
        Self {
            dst: None,
            link_index,
            protocol,
        }
    }

    /// Returns true if this is a default route.
    ///
    /// Both an absent destination (netlink nil) and an explicit zero-length
    /// prefix count as default.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.dst.is_none_or(|p| p.len() == 0)
    }
}

/// An IP address configured on a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// The address itself.
    pub ip: IpAddr,
    /// On-link prefix length.
    pub prefix_len: u8,
    /// Whether the preferred lifetime has expired (e.g., a rotated
    /// temporary IPv6 address).
    #[serde(default)]
    pub deprecated: bool,
}

impl Address {
    /// Creates a preferred (non-deprecated) address.
    #[must_use]
    pub const fn new(ip: IpAddr, prefix_len: u8) -> Self {
        Self {
            ip,
            prefix_len,
            deprecated: false,
        }
    }

    /// Creates an address whose preferred lifetime has already expired.
    #[must_use]
    pub const fn deprecated(ip: IpAddr, prefix_len: u8) -> Self {
        Self {
            ip,
            prefix_len,
            deprecated: true,
        }
    }

    /// The address family.
    #[must_use]
    pub const fn family(&self) -> IpFamily {
        IpFamily::of(self.ip)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ip, self.prefix_len)
    }
}

/// Mapping from link to its configured addresses, in configuration order.
///
/// Insertion order within a link is preserved; it is the tie-break among
/// equally valid addresses of the same family. Links iterate in ascending
/// index order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressTable {
    entries: BTreeMap<Link, Vec<Address>>,
}

impl AddressTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an address to a link's list, creating the entry if needed.
    pub fn push(&mut self, link: Link, address: Address) {
        self.entries.entry(link).or_default().push(address);
    }

    /// Looks up a link's addresses by interface index.
    #[must_use]
    pub fn for_index(&self, index: u32) -> Option<(&Link, &[Address])> {
        self.entries
            .iter()
            .find(|(link, _)| link.index == index)
            .map(|(link, addrs)| (link, addrs.as_slice()))
    }

    /// Iterates links and their addresses in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (&Link, &[Address])> {
        self.entries
            .iter()
            .map(|(link, addrs)| (link, addrs.as_slice()))
    }

    /// Number of links in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table holds no links.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops links not accepted by the predicate.
    pub fn retain_links(&mut self, mut keep: impl FnMut(&Link) -> bool) {
        self.entries.retain(|link, _| keep(link));
    }
}

/// Mapping from link index to its routes, in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    entries: BTreeMap<u32, Vec<Route>>,
}

impl RouteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a route under its owning link index.
    pub fn push(&mut self, route: Route) {
        self.entries.entry(route.link_index).or_default().push(route);
    }

    /// Routes owned by a given link index.
    #[must_use]
    pub fn for_index(&self, index: u32) -> Option<&[Route]> {
        self.entries.get(&index).map(Vec::as_slice)
    }

    /// Iterates every route across all links, ascending by link index.
    pub fn iter_routes(&self) -> impl Iterator<Item = &Route> {
        self.entries.values().flatten()
    }

    /// Number of links holding at least one route.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table holds no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops routes whose owning link index is not accepted by the predicate.
    pub fn retain_links(&mut self, mut keep: impl FnMut(u32) -> bool) {
        self.entries.retain(|index, _| keep(*index));
    }
}
