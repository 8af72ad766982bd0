//! Table snapshots captured to a JSON document.
//!
//! A snapshot file holds both tables, letting the tool resolve offline
//! (captured from one host, queried on another) and giving tests a fully
//! deterministic provider for the whole binary path.
//!
//! # Format
//!
//! ```json
//! {
//!   "links": [
//!     {
//!       "index": 1,
//!       "name": "eth0",
//!       "addresses": [
//!         { "ip": "10.0.0.5", "prefix_len": 24 },
//!         { "ip": "fd00::5", "prefix_len": 64, "deprecated": false }
//!       ]
//!     }
//!   ],
//!   "routes": [
//!     { "dst": "10.0.0.0/24", "link_index": 1, "protocol": "kernel" },
//!     { "link_index": 1, "protocol": "dhcp" }
//!   ]
//! }
//! ```
//!
//! A route without a `dst` is the default route.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::filter::{AddressFilter, RouteFilter};
use super::provider::{AddressTableProvider, ProviderError, RouteTableProvider};
use super::table::{Address, AddressTable, Link, Route, RouteTable};

/// One link and its configured addresses, as stored in a snapshot file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkEntry {
    /// Kernel interface index.
    pub index: u32,
    /// Interface name.
    pub name: String,
    /// Addresses in configuration order.
    #[serde(default)]
    pub addresses: Vec<Address>,
}

/// A captured pair of address and route tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Links and their addresses.
    #[serde(default)]
    pub links: Vec<LinkEntry>,
    /// Routes across all links.
    #[serde(default)]
    pub routes: Vec<Route>,
}

impl Snapshot {
    /// Parses a snapshot from its JSON representation.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Parse`] on malformed JSON.
    pub fn from_json(json: &str) -> Result<Self, ProviderError> {
        serde_json::from_str(json).map_err(|source| ProviderError::Parse {
            context: "snapshot document".to_string(),
            source,
        })
    }

    /// Reads and parses a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Io`] if the file cannot be read and
    /// [`ProviderError::Parse`] if it is not a valid snapshot document.
    pub fn from_file(path: &Path) -> Result<Self, ProviderError> {
        let json = std::fs::read_to_string(path).map_err(|source| ProviderError::Io {
            context: format!("reading snapshot '{}'", path.display()),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Builds the address table, applying the optional pre-filter.
    #[must_use]
    pub fn address_table(&self, filter: Option<&dyn AddressFilter>) -> AddressTable {
        let mut table = AddressTable::new();
        for entry in &self.links {
            let link = Link::new(entry.index, entry.name.clone());
            for address in &entry.addresses {
                if filter.is_none_or(|f| f.permits(address)) {
                    table.push(link.clone(), address.clone());
                }
            }
        }
        table
    }

    /// Builds the route table, applying the optional pre-filter.
    #[must_use]
    pub fn route_table(&self, filter: Option<&dyn RouteFilter>) -> RouteTable {
        let mut table = RouteTable::new();
        for route in &self.routes {
            if filter.is_none_or(|f| f.permits(route)) {
                table.push(route.clone());
            }
        }
        table
    }
}

/// Source of the snapshot a [`SnapshotProvider`] serves.
#[derive(Debug, Clone)]
enum Source {
    /// Re-read from disk on every fetch, so edits between resolutions are
    /// picked up like live state would be.
    File(PathBuf),
    /// Served from memory.
    Fixed(Snapshot),
}

/// Provider backed by a captured snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotProvider {
    source: Source,
}

impl SnapshotProvider {
    /// Creates a provider that re-reads the given file on each fetch.
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::File(path.into()),
        }
    }

    /// Creates a provider over an in-memory snapshot.
    #[must_use]
    pub const fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            source: Source::Fixed(snapshot),
        }
    }

    fn load(&self) -> Result<Snapshot, ProviderError> {
        match &self.source {
            Source::File(path) => Snapshot::from_file(path),
            Source::Fixed(snapshot) => Ok(snapshot.clone()),
        }
    }
}

impl AddressTableProvider for SnapshotProvider {
    fn address_table(
        &self,
        filter: Option<&dyn AddressFilter>,
    ) -> Result<AddressTable, ProviderError> {
        Ok(self.load()?.address_table(filter))
    }
}

impl RouteTableProvider for SnapshotProvider {
    fn route_table(&self, filter: Option<&dyn RouteFilter>) -> Result<RouteTable, ProviderError> {
        Ok(self.load()?.route_table(filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::filter::NodeAddressFilter;
    use std::io::Write as _;

    const DOCUMENT: &str = r#"{
        "links": [
            {
                "index": 1,
                "name": "eth0",
                "addresses": [
                    { "ip": "10.0.0.5", "prefix_len": 24 },
                    { "ip": "fe80::1234", "prefix_len": 64 },
                    { "ip": "fd00::5", "prefix_len": 64 }
                ]
            },
            {
                "index": 2,
                "name": "eth1",
                "addresses": [
                    { "ip": "fd01::3", "prefix_len": 64, "deprecated": true }
                ]
            }
        ],
        "routes": [
            { "dst": "10.0.0.0/24", "link_index": 1, "protocol": "kernel" },
            { "link_index": 1, "protocol": "dhcp" },
            { "dst": "fd01::/64", "link_index": 2 }
        ]
    }"#;

    #[test]
    fn parses_links_addresses_and_routes() {
        let snapshot = Snapshot::from_json(DOCUMENT).unwrap();
        assert_eq!(snapshot.links.len(), 2);
        assert_eq!(snapshot.routes.len(), 3);
    }

    #[test]
    fn route_without_dst_is_default() {
        let snapshot = Snapshot::from_json(DOCUMENT).unwrap();
        let defaults: Vec<_> = snapshot
            .routes
            .iter()
            .filter(|r| r.is_default())
            .collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].link_index, 1);
    }

    #[test]
    fn omitted_protocol_parses_as_other() {
        let snapshot = Snapshot::from_json(DOCUMENT).unwrap();
        assert_eq!(
            snapshot.routes[2].protocol,
            crate::net::table::RouteProtocol::Other
        );
    }

    #[test]
    fn address_table_applies_filter() {
        let snapshot = Snapshot::from_json(DOCUMENT).unwrap();
        let filter = NodeAddressFilter::default();
        let table = snapshot.address_table(Some(&filter));

        // fe80:: and the deprecated fd01::3 are rejected.
        let (_, eth0_addrs) = table.for_index(1).unwrap();
        assert_eq!(eth0_addrs.len(), 2);
        assert!(table.for_index(2).is_none());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = Snapshot::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ProviderError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Snapshot::from_file(Path::new("/nonexistent/tables.json")).unwrap_err();
        assert!(matches!(err, ProviderError::Io { .. }));
    }

    #[test]
    fn file_provider_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DOCUMENT.as_bytes()).unwrap();

        let provider = SnapshotProvider::from_path(file.path());
        let table = provider.address_table(None).unwrap();
        assert!(table.for_index(1).is_some());

        let routes = provider.route_table(None).unwrap();
        assert_eq!(routes.iter_routes().count(), 3);
    }

    #[test]
    fn fixed_provider_serves_in_memory_tables() {
        let snapshot = Snapshot::from_json(DOCUMENT).unwrap();
        let provider = SnapshotProvider::from_snapshot(snapshot);
        assert_eq!(provider.route_table(None).unwrap().iter_routes().count(), 3);
    }
}
