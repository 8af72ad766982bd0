//! Live tables from iproute2's JSON output.
//!
//! Shells out to `ip -j address show`, `ip -j link show`, and
//! `ip -j [-4|-6] route show`, then deserializes the JSON into the snapshot
//! types. Parsing is pure string-to-table conversion so it can be exercised
//! against captured fixtures without a live system.

use std::collections::HashMap;
use std::net::IpAddr;
use std::process::Command;

use serde::Deserialize;

use crate::net::filter::{AddressFilter, RouteFilter};
use crate::net::provider::{AddressTableProvider, ProviderError, RouteTableProvider};
use crate::net::table::{
    Address, AddressTable, IpFamily, Link, Prefix, Route, RouteProtocol, RouteTable,
};

/// One entry of `ip -j address show` / `ip -j link show`.
///
/// iproute2 emits many more fields; serde ignores what we don't model.
#[derive(Debug, Deserialize)]
struct RawLink {
    ifindex: u32,
    ifname: String,
    #[serde(default)]
    addr_info: Vec<RawAddrInfo>,
}

/// One `addr_info` element.
#[derive(Debug, Deserialize)]
struct RawAddrInfo {
    /// Absent for some tunnel configurations.
    local: Option<IpAddr>,
    #[serde(default)]
    prefixlen: u8,
    /// Set when the preferred lifetime has expired.
    #[serde(default)]
    deprecated: bool,
    /// Seconds of preferred lifetime left; 0 also means deprecated.
    preferred_life_time: Option<u64>,
}

impl RawAddrInfo {
    fn is_deprecated(&self) -> bool {
        self.deprecated || self.preferred_life_time == Some(0)
    }
}

/// One entry of `ip -j route show`.
#[derive(Debug, Deserialize)]
struct RawRoute {
    dst: String,
    /// Absent for blackhole/unreachable routes.
    dev: Option<String>,
    protocol: Option<String>,
}

fn parse_error(context: &str, source: serde_json::Error) -> ProviderError {
    ProviderError::Parse {
        context: context.to_string(),
        source,
    }
}

/// Converts `ip -j address show` output into an address table.
fn parse_address_table(
    json: &str,
    filter: Option<&dyn AddressFilter>,
) -> Result<AddressTable, ProviderError> {
    let raw: Vec<RawLink> =
        serde_json::from_str(json).map_err(|e| parse_error("address listing", e))?;

    let mut table = AddressTable::new();
    for entry in raw {
        let link = Link::new(entry.ifindex, entry.ifname);
        for info in entry.addr_info {
            let Some(ip) = info.local else { continue };
            let address = Address {
                ip,
                prefix_len: info.prefixlen,
                deprecated: info.is_deprecated(),
            };
            if filter.is_none_or(|f| f.permits(&address)) {
                table.push(link.clone(), address);
            }
        }
    }
    Ok(table)
}

/// Builds the interface-name-to-index map from `ip -j link show` output.
fn parse_link_indexes(json: &str) -> Result<HashMap<String, u32>, ProviderError> {
    let raw: Vec<RawLink> =
        serde_json::from_str(json).map_err(|e| parse_error("link listing", e))?;
    Ok(raw
        .into_iter()
        .map(|entry| (entry.ifname, entry.ifindex))
        .collect())
}

/// Converts a `dst` field into our prefix representation.
///
/// iproute2 prints `default` for the default route, `net/len` for ordinary
/// prefixes, and a bare address for host routes.
fn parse_destination(dst: &str) -> Option<Option<Prefix>> {
    if dst == "default" {
        return Some(None);
    }
    if dst.contains('/') {
        return dst.parse().ok().map(Some);
    }
    let ip: IpAddr = dst.parse().ok()?;
    let prefix = Prefix::new(ip, IpFamily::of(ip).bits()).ok()?;
    Some(Some(prefix))
}

/// Converts one family's `ip -j route show` output into routes, appending
/// them to `table`.
fn parse_routes_into(
    json: &str,
    links: &HashMap<String, u32>,
    filter: Option<&dyn RouteFilter>,
    table: &mut RouteTable,
) -> Result<(), ProviderError> {
    let raw: Vec<RawRoute> =
        serde_json::from_str(json).map_err(|e| parse_error("route listing", e))?;

    for entry in raw {
        // Routes without an output device (blackhole, unreachable) cannot
        // carry node traffic.
        let Some(dev) = entry.dev else { continue };
        let Some(&link_index) = links.get(&dev) else {
            tracing::debug!(dev = %dev, "route references unknown link, skipping");
            continue;
        };
        let Some(dst) = parse_destination(&entry.dst) else {
            tracing::debug!(dst = %entry.dst, "unparseable route destination, skipping");
            continue;
        };
        let protocol = entry
            .protocol
            .as_deref()
            .map_or(RouteProtocol::Other, RouteProtocol::from_name);
        let route = Route {
            dst,
            link_index,
            protocol,
        };
        if filter.is_none_or(|f| f.permits(&route)) {
            table.push(route);
        }
    }
    Ok(())
}

/// Live provider that queries iproute2.
///
/// Each fetch runs `ip` afresh, so consecutive resolutions observe live
/// routing changes.
#[derive(Debug, Clone)]
pub struct Iproute2Provider {
    command: String,
}

impl Default for Iproute2Provider {
    fn default() -> Self {
        Self {
            command: "ip".to_string(),
        }
    }
}

impl Iproute2Provider {
    /// Creates a provider invoking the `ip` binary from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the `ip` binary path.
    #[must_use]
    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<String, ProviderError> {
        let rendered = format!("{} {}", self.command, args.join(" "));
        let output = Command::new(&self.command)
            .args(args)
            .output()
            .map_err(|source| ProviderError::Io {
                context: format!("running '{rendered}'"),
                source,
            })?;
        if !output.status.success() {
            return Err(ProviderError::Command {
                command: rendered,
                detail: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl AddressTableProvider for Iproute2Provider {
    fn address_table(
        &self,
        filter: Option<&dyn AddressFilter>,
    ) -> Result<AddressTable, ProviderError> {
        let json = self.run(&["-j", "address", "show"])?;
        parse_address_table(&json, filter)
    }
}

impl RouteTableProvider for Iproute2Provider {
    fn route_table(&self, filter: Option<&dyn RouteFilter>) -> Result<RouteTable, ProviderError> {
        let links = parse_link_indexes(&self.run(&["-j", "link", "show"])?)?;

        let mut table = RouteTable::new();
        let v4 = self.run(&["-j", "-4", "route", "show"])?;
        parse_routes_into(&v4, &links, filter, &mut table)?;
        let v6 = self.run(&["-j", "-6", "route", "show"])?;
        parse_routes_into(&v6, &links, filter, &mut table)?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::filter::{NodeAddressFilter, ProtocolFilter};

    // Captured (and trimmed) from `ip -j address show` on a dual-stack host.
    const ADDRESS_JSON: &str = r#"[
        {
            "ifindex": 1,
            "ifname": "lo",
            "flags": ["LOOPBACK", "UP", "LOWER_UP"],
            "addr_info": [
                { "family": "inet", "local": "127.0.0.1", "prefixlen": 8,
                  "scope": "host", "valid_life_time": 4294967295,
                  "preferred_life_time": 4294967295 },
                { "family": "inet6", "local": "::1", "prefixlen": 128,
                  "scope": "host", "valid_life_time": 4294967295,
                  "preferred_life_time": 4294967295 }
            ]
        },
        {
            "ifindex": 2,
            "ifname": "eth0",
            "flags": ["BROADCAST", "MULTICAST", "UP", "LOWER_UP"],
            "addr_info": [
                { "family": "inet", "local": "10.0.0.5", "prefixlen": 24,
                  "scope": "global", "dynamic": true,
                  "valid_life_time": 86117, "preferred_life_time": 86117 },
                { "family": "inet6", "local": "fd00::1234", "prefixlen": 64,
                  "scope": "global", "dynamic": true, "mngtmpaddr": true,
                  "temporary": true, "deprecated": true,
                  "valid_life_time": 6437, "preferred_life_time": 0 },
                { "family": "inet6", "local": "fd00::5", "prefixlen": 64,
                  "scope": "global", "valid_life_time": 4294967295,
                  "preferred_life_time": 4294967295 },
                { "family": "inet6", "local": "fe80::1", "prefixlen": 64,
                  "scope": "link", "valid_life_time": 4294967295,
                  "preferred_life_time": 4294967295 }
            ]
        }
    ]"#;

    const LINK_JSON: &str = r#"[
        { "ifindex": 1, "ifname": "lo", "flags": ["LOOPBACK", "UP"], "mtu": 65536 },
        { "ifindex": 2, "ifname": "eth0", "flags": ["BROADCAST", "UP"], "mtu": 1500 }
    ]"#;

    const ROUTE_V4_JSON: &str = r#"[
        { "dst": "default", "gateway": "10.0.0.1", "dev": "eth0",
          "protocol": "dhcp", "metric": 100, "flags": [] },
        { "dst": "10.0.0.0/24", "dev": "eth0", "protocol": "kernel",
          "scope": "link", "prefsrc": "10.0.0.5", "flags": [] },
        { "dst": "192.0.2.1", "dev": "eth0", "protocol": "static", "flags": [] },
        { "dst": "198.51.100.0/24", "type": "blackhole", "flags": [] }
    ]"#;

    const ROUTE_V6_JSON: &str = r#"[
        { "dst": "fd00::/64", "dev": "eth0", "protocol": "kernel",
          "metric": 256, "flags": [] },
        { "dst": "default", "gateway": "fe80::1", "dev": "eth0",
          "protocol": "ra", "metric": 1024, "flags": [] }
    ]"#;

    #[test]
    fn parses_addresses_with_lifetimes() {
        let table = parse_address_table(ADDRESS_JSON, None).unwrap();

        let (link, addrs) = table.for_index(2).unwrap();
        assert_eq!(link.name, "eth0");
        assert_eq!(addrs.len(), 4);
        // Deprecated via preferred_life_time 0 and the explicit flag.
        assert!(addrs[1].deprecated);
        assert!(!addrs[2].deprecated);
    }

    #[test]
    fn address_filter_applies_during_parse() {
        let filter = NodeAddressFilter::default();
        let table = parse_address_table(ADDRESS_JSON, Some(&filter)).unwrap();

        assert!(table.for_index(1).is_none());
        let (_, addrs) = table.for_index(2).unwrap();
        let ips: Vec<String> = addrs.iter().map(|a| a.ip.to_string()).collect();
        assert_eq!(ips, vec!["10.0.0.5", "fd00::5"]);
    }

    #[test]
    fn parses_link_indexes() {
        let links = parse_link_indexes(LINK_JSON).unwrap();
        assert_eq!(links.get("eth0"), Some(&2));
        assert_eq!(links.get("lo"), Some(&1));
    }

    #[test]
    fn parses_both_route_families() {
        let links = parse_link_indexes(LINK_JSON).unwrap();
        let mut table = RouteTable::new();
        parse_routes_into(ROUTE_V4_JSON, &links, None, &mut table).unwrap();
        parse_routes_into(ROUTE_V6_JSON, &links, None, &mut table).unwrap();

        // The blackhole route has no device and is skipped.
        let routes = table.for_index(2).unwrap();
        assert_eq!(routes.len(), 5);
        assert_eq!(routes.iter().filter(|r| r.is_default()).count(), 2);
    }

    #[test]
    fn bare_host_destination_becomes_full_length_prefix() {
        let links = parse_link_indexes(LINK_JSON).unwrap();
        let mut table = RouteTable::new();
        parse_routes_into(ROUTE_V4_JSON, &links, None, &mut table).unwrap();

        let host_route = table
            .for_index(2)
            .unwrap()
            .iter()
            .find(|r| r.protocol == RouteProtocol::Static)
            .unwrap();
        assert_eq!(host_route.dst.unwrap().len(), 32);
    }

    #[test]
    fn route_filter_applies_during_parse() {
        let links = parse_link_indexes(LINK_JSON).unwrap();
        let filter = ProtocolFilter::excluding([RouteProtocol::Ra]);
        let mut table = RouteTable::new();
        parse_routes_into(ROUTE_V6_JSON, &links, Some(&filter), &mut table).unwrap();

        let routes = table.for_index(2).unwrap();
        assert_eq!(routes.len(), 1);
        assert!(!routes[0].is_default());
    }

    #[test]
    fn unknown_device_routes_are_skipped() {
        let links = HashMap::new();
        let mut table = RouteTable::new();
        parse_routes_into(ROUTE_V4_JSON, &links, None, &mut table).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn malformed_output_is_a_parse_error() {
        assert!(matches!(
            parse_address_table("not json", None).unwrap_err(),
            ProviderError::Parse { .. }
        ));
        assert!(matches!(
            parse_link_indexes("[{]").unwrap_err(),
            ProviderError::Parse { .. }
        ));
    }
}
