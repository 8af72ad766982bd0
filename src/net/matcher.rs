//! Longest-prefix route matching.
//!
//! Standard routing-table semantics over a [`RouteTable`] snapshot: the most
//! specific prefix containing the target wins, and the default route is only
//! a fallback. A link holding just a default route loses to any link with a
//! specific prefix for the target, regardless of enumeration order.

use std::net::IpAddr;

use super::table::RouteTable;

/// The outcome of a successful route match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMatch {
    /// Index of the link that would carry traffic toward the target.
    pub link_index: u32,
    /// Prefix length of the winning route; `None` when only the default
    /// route matched.
    pub matched_prefix: Option<u8>,
}

/// Finds the route that the kernel would use to reach `target`.
///
/// Scans every route across all links. Among routes whose destination
/// contains the target (same family, target inside the prefix), the longest
/// prefix wins; on equal lengths the route seen first in ascending
/// link-index order wins. With no specific match, the first default route
/// wins regardless of which link owns it. Returns `None` when neither
/// exists.
#[must_use]
pub fn match_route(target: IpAddr, table: &RouteTable) -> Option<RouteMatch> {
    let mut best: Option<(u8, u32)> = None;
    let mut default_link: Option<u32> = None;

    for route in table.iter_routes() {
        if route.is_default() {
            if default_link.is_none() {
                default_link = Some(route.link_index);
            }
            continue;
        }
        // is_default() ruled out None above.
        let Some(dst) = route.dst else { continue };
        if !dst.contains(target) {
            continue;
        }
        if best.is_none_or(|(len, _)| dst.len() > len) {
            best = Some((dst.len(), route.link_index));
        }
    }

    if let Some((len, link_index)) = best {
        return Some(RouteMatch {
            link_index,
            matched_prefix: Some(len),
        });
    }
    default_link.map(|link_index| RouteMatch {
        link_index,
        matched_prefix: None,
    })
}
