//! Target-driven and default-route resolution.
//!
//! The two public operations of the crate. Both are pure queries over the
//! tables their providers return: build the route table, pick a link, then
//! delegate to address selection. Neither operation falls back to the other;
//! a caller wanting default-route behavior after a failed target match
//! invokes [`Resolver::default_route`] itself.

use std::net::IpAddr;

use thiserror::Error;

use super::filter::{AddressFilter, RouteFilter};
use super::matcher::match_route;
use super::provider::{AddressTableProvider, ProviderError, RouteTableProvider};
use super::selector::{NoValidAddress, select_addresses};
use super::table::IpFamily;

/// Error type for resolution failures.
///
/// Each failure condition is distinct and inspectable; resolution never
/// silently substitutes a different link or suppresses a target.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A table provider failed; propagated unchanged.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// None of the supplied targets matched any route.
    #[error("No route found to any of the targets {targets:?}")]
    NoRouteMatch {
        /// The targets that were tried, in order.
        targets: Vec<IpAddr>,
    },

    /// No link carries a default route.
    #[error("No default route found")]
    NoDefaultRoute,

    /// A link was matched but held no address passing the validity filter.
    #[error(transparent)]
    NoValidAddress(#[from] NoValidAddress),
}

/// Resolves which local addresses a host should advertise.
///
/// Holds the two injected table providers and an optional route pre-filter.
/// Each resolution call fetches fresh snapshots; nothing is cached, so
/// callers re-invoke to observe live changes.
pub struct Resolver<A, R> {
    addresses: A,
    routes: R,
    route_filter: Option<Box<dyn RouteFilter>>,
}

impl<A, R> Resolver<A, R>
where
    A: AddressTableProvider,
    R: RouteTableProvider,
{
    /// Creates a resolver over the given providers.
    #[must_use]
    pub const fn new(addresses: A, routes: R) -> Self {
        Self {
            addresses,
            routes,
            route_filter: None,
        }
    }

    /// Applies a route pre-filter (e.g., excluding routes by provenance)
    /// when building the route table.
    #[must_use]
    pub fn with_route_filter<F: RouteFilter + 'static>(mut self, filter: F) -> Self {
        self.route_filter = Some(Box::new(filter));
        self
    }

    /// Resolves the addresses to advertise for reaching the given targets.
    ///
    /// Targets are tried in order against the route table; the first one
    /// matching any route (specific or default) picks the link, and that
    /// target's family becomes the preferred family for selection.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::Provider`] if either table fetch fails.
    /// - [`ResolveError::NoRouteMatch`] if no target matches any route.
    /// - [`ResolveError::NoValidAddress`] if the matched link has no
    ///   address passing `filter`.
    pub fn by_targets(
        &self,
        targets: &[IpAddr],
        filter: &dyn AddressFilter,
    ) -> Result<Vec<IpAddr>, ResolveError> {
        let routes = self.routes.route_table(self.route_filter.as_deref())?;

        for &target in targets {
            let Some(matched) = match_route(target, &routes) else {
                tracing::debug!(%target, "no route toward target");
                continue;
            };
            match matched.matched_prefix {
                Some(len) => {
                    tracing::debug!(%target, link_index = matched.link_index, prefix_len = len, "specific route matched");
                }
                None => {
                    tracing::debug!(%target, link_index = matched.link_index, "default route matched");
                }
            }
            let table = self.addresses.address_table(Some(filter))?;
            let selected = select_addresses(
                matched.link_index,
                &table,
                filter,
                Some(IpFamily::of(target)),
            )?;
            return Ok(selected);
        }

        Err(ResolveError::NoRouteMatch {
            targets: targets.to_vec(),
        })
    }

    /// Resolves the addresses of whichever link owns the default route.
    ///
    /// No preferred family applies; IPv4 orders before IPv6.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::Provider`] if either table fetch fails.
    /// - [`ResolveError::NoDefaultRoute`] if no link carries a default
    ///   route.
    /// - [`ResolveError::NoValidAddress`] if the owning link has no
    ///   address passing `filter`.
    pub fn default_route(&self, filter: &dyn AddressFilter) -> Result<Vec<IpAddr>, ResolveError> {
        let routes = self.routes.route_table(self.route_filter.as_deref())?;

        let link_index = routes
            .iter_routes()
            .find(|route| route.is_default())
            .map(|route| route.link_index)
            .ok_or(ResolveError::NoDefaultRoute)?;
        tracing::debug!(link_index, "default route found");

        let table = self.addresses.address_table(Some(filter))?;
        let selected = select_addresses(link_index, &table, filter, None)?;
        Ok(selected)
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
