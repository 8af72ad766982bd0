//! node-addr: node address resolution
//!
//! A library for determining which local IP address(es) a host should
//! advertise, using real routing-table semantics: longest-prefix match
//! toward reachability targets, default-route fallback, family-preference
//! ordering, and caller-supplied validity filtering.

pub mod config;
pub mod net;
