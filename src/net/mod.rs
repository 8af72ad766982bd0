//! Routing-table introspection and address selection.
//!
//! This module answers two questions about a host:
//! - which local address would the kernel use to reach a given target IP
//!   ([`Resolver::by_targets`])
//! - which local address sits on the interface carrying the default route
//!   ([`Resolver::default_route`])
//!
//! Both operate purely over table snapshots obtained from injected
//! providers ([`AddressTableProvider`], [`RouteTableProvider`]); nothing
//! here mutates routing or addressing state.

pub mod filter;
mod matcher;
pub mod platform;
mod provider;
mod resolver;
mod selector;
pub mod snapshot;
mod table;

pub use matcher::{RouteMatch, match_route};
pub use provider::{AddressTableProvider, FilteredProvider, ProviderError, RouteTableProvider};
pub use resolver::{ResolveError, Resolver};
pub use selector::{NoValidAddress, select_addresses};
pub use snapshot::{Snapshot, SnapshotProvider};
pub use table::{
    Address, AddressTable, IpFamily, Link, Prefix, PrefixError, Route, RouteProtocol, RouteTable,
};
