//! Predicate traits for addresses, routes, and links.
//!
//! The matcher, selector, and resolvers never hard-code validity policy.
//! They apply whatever predicate the caller supplies; the policy
//! implementations here ([`NodeAddressFilter`], [`ProtocolFilter`],
//! [`LinkFilterChain`]) are the defaults the surrounding tool wires in.

use std::collections::HashSet;
use std::net::IpAddr;

use regex::Regex;

use super::table::{Address, Link, Route, RouteProtocol};

/// Validity predicate over a single address.
///
/// # Thread Safety
///
/// Filters must be `Send + Sync` so resolutions can run concurrently.
pub trait AddressFilter: Send + Sync {
    /// Returns `true` if the address may be advertised.
    fn permits(&self, address: &Address) -> bool;
}

/// Predicate over a single route, applied while building the route table.
///
/// Allows excluding routes by provenance (e.g., drop router-advertisement
/// routes) before matching runs.
pub trait RouteFilter: Send + Sync {
    /// Returns `true` if the route should participate in matching.
    fn permits(&self, route: &Route) -> bool;
}

/// Matcher over a link, used to scope which interfaces are considered.
pub trait LinkFilter: Send + Sync {
    /// Returns `true` if the link matches.
    fn matches(&self, link: &Link) -> bool;
}

/// Adapts a closure into an [`AddressFilter`].
///
/// Handy for one-off predicates in tests and call sites that don't warrant
/// a named policy type.
pub struct FilterFn<F>(pub F);

impl<F> AddressFilter for FilterFn<F>
where
    F: Fn(&Address) -> bool + Send + Sync,
{
    fn permits(&self, address: &Address) -> bool {
        (self.0)(address)
    }
}

/// Adapts a closure into a [`RouteFilter`].
pub struct RouteFilterFn<F>(pub F);

impl<F> RouteFilter for RouteFilterFn<F>
where
    F: Fn(&Route) -> bool + Send + Sync,
{
    fn permits(&self, route: &Route) -> bool {
        (self.0)(route)
    }
}

// ============================================================================
// NodeAddressFilter - the standard "usable node address" policy
// ============================================================================

/// The standard validity policy for advertisable node addresses.
///
/// Rejects loopback addresses unconditionally. Link-local and deprecated
/// addresses are rejected by default but can be opted back in, which is
/// occasionally needed on hosts with only autoconfigured addressing.
///
/// # Examples
///
/// ```
/// use node_addr::net::filter::{AddressFilter, NodeAddressFilter};
/// use node_addr::net::Address;
///
/// let filter = NodeAddressFilter::default();
/// let usable = Address::new("10.0.0.5".parse().unwrap(), 24);
/// let loopback = Address::new("127.0.0.1".parse().unwrap(), 8);
///
/// assert!(filter.permits(&usable));
/// assert!(!filter.permits(&loopback));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeAddressFilter {
    /// Permit addresses whose preferred lifetime has expired.
    pub allow_deprecated: bool,
    /// Permit link-local addresses (169.254.0.0/16, fe80::/10).
    pub allow_link_local: bool,
}

impl NodeAddressFilter {
    /// Creates the default policy: no loopback, no link-local, no deprecated.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Permits deprecated addresses.
    #[must_use]
    pub const fn with_deprecated(mut self) -> Self {
        self.allow_deprecated = true;
        self
    }

    /// Permits link-local addresses.
    #[must_use]
    pub const fn with_link_local(mut self) -> Self {
        self.allow_link_local = true;
        self
    }
}

/// Returns true for 169.254.0.0/16 and fe80::/10.
fn is_link_local(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_link_local(),
        IpAddr::V6(v6) => (v6.segments()[0] & 0xffc0) == 0xfe80,
    }
}

impl AddressFilter for NodeAddressFilter {
    fn permits(&self, address: &Address) -> bool {
        if address.ip.is_loopback() {
            return false;
        }
        if !self.allow_link_local && is_link_local(address.ip) {
            return false;
        }
        if !self.allow_deprecated && address.deprecated {
            return false;
        }
        true
    }
}

// ============================================================================
// ProtocolFilter - route provenance exclusion
// ============================================================================

/// Excludes routes installed by any of the given protocols.
///
/// An empty exclusion set permits every route.
#[derive(Debug, Clone, Default)]
pub struct ProtocolFilter {
    excluded: HashSet<RouteProtocol>,
}

impl ProtocolFilter {
    /// Creates a filter excluding routes from the given protocols.
    #[must_use]
    pub fn excluding(protocols: impl IntoIterator<Item = RouteProtocol>) -> Self {
        Self {
            excluded: protocols.into_iter().collect(),
        }
    }

    /// Returns true if no protocols are excluded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.excluded.is_empty()
    }
}

impl RouteFilter for ProtocolFilter {
    fn permits(&self, route: &Route) -> bool {
        !self.excluded.contains(&route.protocol)
    }
}

// ============================================================================
// NameRegexFilter - pure matcher by interface name
// ============================================================================

/// Matches links by name pattern (pure matcher, no include/exclude
/// semantics). Use with [`LinkFilterChain`] to apply include/exclude logic.
///
/// # Examples
///
/// ```
/// use node_addr::net::filter::{LinkFilter, NameRegexFilter};
/// use node_addr::net::Link;
///
/// let filter = NameRegexFilter::new(r"^eth").unwrap();
///
/// assert!(filter.matches(&Link::new(1, "eth0")));
/// assert!(!filter.matches(&Link::new(2, "wlan0")));
/// ```
#[derive(Debug)]
pub struct NameRegexFilter {
    pattern: Regex,
}

impl NameRegexFilter {
    /// Creates a name filter with the given regex pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the regex pattern is invalid.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// Returns a reference to the compiled pattern.
    #[must_use]
    pub const fn pattern(&self) -> &Regex {
        &self.pattern
    }
}

impl LinkFilter for NameRegexFilter {
    fn matches(&self, link: &Link) -> bool {
        self.pattern.is_match(&link.name)
    }
}

// ============================================================================
// LinkFilterChain - include OR / exclude AND semantics
// ============================================================================

/// Link filter chain with include/exclude semantics.
///
/// Evaluation order:
/// 1. **Exclude filters (AND)**: any match rejects the link.
/// 2. **Include filters (OR)**: any match accepts; empty includes accept all.
#[derive(Default)]
pub struct LinkFilterChain {
    includes: Vec<Box<dyn LinkFilter>>,
    excludes: Vec<Box<dyn LinkFilter>>,
}

impl LinkFilterChain {
    /// Creates an empty chain (matches all links).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an include filter (OR semantics).
    #[must_use]
    pub fn include<F: LinkFilter + 'static>(mut self, filter: F) -> Self {
        self.includes.push(Box::new(filter));
        self
    }

    /// Adds an exclude filter (a link matching ANY exclude is rejected).
    #[must_use]
    pub fn exclude<F: LinkFilter + 'static>(mut self, filter: F) -> Self {
        self.excludes.push(Box::new(filter));
        self
    }

    /// Returns true if no filters are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.includes.is_empty() && self.excludes.is_empty()
    }
}

impl LinkFilter for LinkFilterChain {
    fn matches(&self, link: &Link) -> bool {
        if self.excludes.iter().any(|f| f.matches(link)) {
            return false;
        }
        self.includes.is_empty() || self.includes.iter().any(|f| f.matches(link))
    }
}

impl std::fmt::Debug for LinkFilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkFilterChain")
            .field("include_count", &self.includes.len())
            .field("exclude_count", &self.excludes.len())
            .finish()
    }
}

// Blanket implementations so filters compose behind references and boxes.
impl<T: AddressFilter + ?Sized> AddressFilter for &T {
    fn permits(&self, address: &Address) -> bool {
        (*self).permits(address)
    }
}

impl AddressFilter for Box<dyn AddressFilter> {
    fn permits(&self, address: &Address) -> bool {
        self.as_ref().permits(address)
    }
}

impl<T: RouteFilter + ?Sized> RouteFilter for &T {
    fn permits(&self, route: &Route) -> bool {
        (*self).permits(route)
    }
}

impl<T: LinkFilter + ?Sized> LinkFilter for &T {
    fn matches(&self, link: &Link) -> bool {
        (*self).matches(link)
    }
}
