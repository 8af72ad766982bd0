//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::net::RouteProtocol;

/// node-addr: node address resolution
///
/// Determines which local IP address(es) this host should advertise,
/// either toward specific reachability targets or from the interface
/// carrying the default route.
#[derive(Debug, Parser)]
#[command(name = "node-addr")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Reachability target IP, tried in order (can be specified multiple times);
    /// without targets, the default-route interface is used
    #[arg(long = "target", value_name = "IP")]
    pub targets: Vec<String>,

    /// Resolve against a captured JSON table snapshot instead of the live system
    #[arg(long, value_name = "PATH")]
    pub snapshot: Option<PathBuf>,

    /// Regex pattern for interfaces to include (can be specified multiple times)
    #[arg(long = "include-interface", value_name = "PATTERN")]
    pub include_interfaces: Vec<String>,

    /// Regex pattern for interfaces to exclude (can be specified multiple times)
    #[arg(long = "exclude-interface", value_name = "PATTERN")]
    pub exclude_interfaces: Vec<String>,

    /// Ignore routes installed by this protocol (can be specified multiple times)
    #[arg(long = "exclude-route-protocol", value_enum, value_name = "PROTOCOL")]
    pub exclude_route_protocols: Vec<RouteProtocolArg>,

    /// Permit addresses whose preferred lifetime has expired
    #[arg(long = "allow-deprecated")]
    pub allow_deprecated: bool,

    /// Permit link-local addresses
    #[arg(long = "allow-link-local")]
    pub allow_link_local: bool,

    /// Print the result as a JSON array
    #[arg(long)]
    pub json: bool,

    /// Re-resolve on an interval and log when the result changes
    #[arg(long)]
    pub watch: bool,

    /// Watch interval in seconds
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Path to configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,
}

impl Cli {
    /// Parses arguments from the process command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Subcommands for node-addr
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = "node-addr.toml")]
        output: PathBuf,
    },
}

/// Route protocol argument for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RouteProtocolArg {
    /// Routes installed by the kernel during address configuration
    Kernel,
    /// Routes installed at boot
    Boot,
    /// Statically configured routes
    Static,
    /// Routes learned from DHCP
    Dhcp,
    /// Routes learned from IPv6 router advertisements
    Ra,
}

impl From<RouteProtocolArg> for RouteProtocol {
    fn from(arg: RouteProtocolArg) -> Self {
        match arg {
            RouteProtocolArg::Kernel => Self::Kernel,
            RouteProtocolArg::Boot => Self::Boot,
            RouteProtocolArg::Static => Self::Static,
            RouteProtocolArg::Dhcp => Self::Dhcp,
            RouteProtocolArg::Ra => Self::Ra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn defaults_to_no_targets() {
        let cli = parse(&["node-addr"]);
        assert!(cli.targets.is_empty());
        assert!(cli.command.is_none());
        assert!(!cli.watch);
    }

    #[test]
    fn repeatable_targets_keep_order() {
        let cli = parse(&["node-addr", "--target", "10.0.0.2", "--target", "fd00::2"]);
        assert_eq!(cli.targets, vec!["10.0.0.2", "fd00::2"]);
    }

    #[test]
    fn parses_interface_patterns() {
        let cli = parse(&[
            "node-addr",
            "--include-interface",
            "^eth",
            "--exclude-interface",
            "^docker",
        ]);
        assert_eq!(cli.include_interfaces, vec!["^eth"]);
        assert_eq!(cli.exclude_interfaces, vec!["^docker"]);
    }

    #[test]
    fn parses_route_protocol_values() {
        let cli = parse(&["node-addr", "--exclude-route-protocol", "ra"]);
        assert_eq!(cli.exclude_route_protocols, vec![RouteProtocolArg::Ra]);
    }

    #[test]
    fn rejects_unknown_route_protocol() {
        assert!(Cli::try_parse_from(["node-addr", "--exclude-route-protocol", "ospf"]).is_err());
    }

    #[test]
    fn parses_init_subcommand() {
        let cli = parse(&["node-addr", "init", "--output", "custom.toml"]);
        match cli.command {
            Some(Command::Init { output }) => {
                assert_eq!(output, PathBuf::from("custom.toml"));
            }
            _ => panic!("expected init subcommand"),
        }
    }
}
