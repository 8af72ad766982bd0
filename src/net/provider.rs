//! Table provider traits and error types.
//!
//! Providers are the only I/O-adjacent collaborators of the resolution core.
//! Each resolution call invokes them once; there is no caching or retrying
//! here. Callers re-run resolution to observe live changes.

use thiserror::Error;

use super::filter::{AddressFilter, LinkFilter, RouteFilter};
use super::table::{AddressTable, RouteTable};

/// Error type for table-provider failures.
///
/// Describes what went wrong without dictating recovery strategy; resolution
/// propagates these unchanged to the caller.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Reading a snapshot file or spawning a query command failed.
    #[error("I/O error while {context}: {source}")]
    Io {
        /// What the provider was doing.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An external query command exited unsuccessfully.
    #[error("'{command}' failed: {detail}")]
    Command {
        /// The command that was run.
        command: String,
        /// Exit status and captured stderr.
        detail: String,
    },

    /// Provider output could not be deserialized.
    #[error("Failed to parse {context}: {source}")]
    Parse {
        /// What was being parsed.
        context: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The provider is not usable on this platform or configuration.
    #[error("Provider unavailable: {message}")]
    Unavailable {
        /// Why the provider cannot produce tables.
        message: String,
    },
}

/// Capability that yields the host's per-link address table.
///
/// # Design
///
/// Injected rather than called directly so tests can substitute fixed tables
/// for live system state. The optional filter lets providers drop addresses
/// during collection; implementations that collect eagerly may equally apply
/// it after the fact.
pub trait AddressTableProvider: Send + Sync {
    /// Produces the address table, optionally pre-filtered.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when live state cannot be fetched or parsed.
    fn address_table(
        &self,
        filter: Option<&dyn AddressFilter>,
    ) -> Result<AddressTable, ProviderError>;
}

/// Capability that yields the host's per-link route table.
pub trait RouteTableProvider: Send + Sync {
    /// Produces the route table, optionally pre-filtered.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when live state cannot be fetched or parsed.
    fn route_table(&self, filter: Option<&dyn RouteFilter>) -> Result<RouteTable, ProviderError>;
}

impl<T: AddressTableProvider + ?Sized> AddressTableProvider for &T {
    fn address_table(
        &self,
        filter: Option<&dyn AddressFilter>,
    ) -> Result<AddressTable, ProviderError> {
        (*self).address_table(filter)
    }
}

impl<T: RouteTableProvider + ?Sized> RouteTableProvider for &T {
    fn route_table(&self, filter: Option<&dyn RouteFilter>) -> Result<RouteTable, ProviderError> {
        (*self).route_table(filter)
    }
}

/// A provider decorator that scopes both tables to links accepted by a
/// [`LinkFilter`].
///
/// Address entries for rejected links are dropped, and so are their routes,
/// so an excluded interface can neither win route matching nor contribute
/// addresses. Routes owned by links that carry no addresses at all cannot be
/// named and pass through unfiltered.
#[derive(Debug)]
pub struct FilteredProvider<P, L> {
    inner: P,
    links: L,
}

impl<P, L> FilteredProvider<P, L> {
    /// Creates a filtered view over `inner`.
    #[must_use]
    pub const fn new(inner: P, links: L) -> Self {
        Self { inner, links }
    }

    /// Returns a reference to the wrapped provider.
    pub const fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P, L> AddressTableProvider for FilteredProvider<P, L>
where
    P: AddressTableProvider,
    L: LinkFilter,
{
    fn address_table(
        &self,
        filter: Option<&dyn AddressFilter>,
    ) -> Result<AddressTable, ProviderError> {
        let mut table = self.inner.address_table(filter)?;
        table.retain_links(|link| self.links.matches(link));
        Ok(table)
    }
}

impl<P, L> RouteTableProvider for FilteredProvider<P, L>
where
    P: AddressTableProvider + RouteTableProvider,
    L: LinkFilter,
{
    fn route_table(&self, filter: Option<&dyn RouteFilter>) -> Result<RouteTable, ProviderError> {
        // Route entries carry only link indexes; resolve names through the
        // unfiltered address table.
        let addresses = self.inner.address_table(None)?;
        let mut routes = self.inner.route_table(filter)?;
        routes.retain_links(|index| {
            addresses
                .for_index(index)
                .is_none_or(|(link, _)| self.links.matches(link))
        });
        Ok(routes)
    }
}
