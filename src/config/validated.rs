//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::net::RouteProtocol;
use crate::net::filter::{LinkFilterChain, NameRegexFilter, NodeAddressFilter, ProtocolFilter};

use super::cli::Cli;
use super::defaults;
use super::error::ConfigError;
use super::toml::{TomlConfig, default_config_template};

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::load`] to build from CLI args (loading the TOML
/// file they may point at), or [`ValidatedConfig::from_raw`] when the TOML
/// config has already been parsed. CLI arguments take precedence over TOML
/// values.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Reachability targets, tried in order; empty means default-route
    /// resolution
    pub targets: Vec<IpAddr>,

    /// Snapshot file to resolve against instead of the live system
    pub snapshot: Option<PathBuf>,

    /// Interface scoping (include/exclude name patterns)
    pub link_filter: LinkFilterChain,

    /// Address validity policy
    pub address_filter: NodeAddressFilter,

    /// Route provenance exclusions
    pub route_filter: ProtocolFilter,

    /// Whether to keep re-resolving on an interval
    pub watch: bool,

    /// Watch-mode re-resolution interval
    pub interval: Duration,

    /// Print results as a JSON array
    pub json: bool,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let targets: Vec<String> = self.targets.iter().map(ToString::to_string).collect();
        let source = self
            .snapshot
            .as_ref()
            .map_or_else(|| "live".to_string(), |p| p.display().to_string());

        write!(
            f,
            "Config {{ targets: [{}], source: {}, watch: {}, interval: {}s }}",
            targets.join(", "),
            source,
            self.watch,
            self.interval.as_secs(),
        )
    }
}

impl ValidatedConfig {
    /// Builds the configuration from CLI arguments, loading the TOML file
    /// they reference (if any).
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed, or if
    /// any merged value fails validation.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        match &cli.config {
            Some(path) => {
                let toml = TomlConfig::from_file(path)?;
                Self::from_raw(cli, Some(&toml))
            }
            None => Self::from_raw(cli, None),
        }
    }

    /// Creates a validated configuration from CLI arguments and optional
    /// TOML config.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A target is not a parseable IP address
    /// - A regex pattern is invalid
    /// - The watch interval is zero
    /// - A route protocol name is unknown
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let targets = Self::resolve_targets(cli, toml)?;
        let snapshot = cli
            .snapshot
            .clone()
            .or_else(|| toml.and_then(|t| t.resolve.snapshot.clone()));
        let link_filter = Self::build_link_filter(cli, toml)?;
        let address_filter = Self::build_address_filter(cli, toml);
        let route_filter = Self::build_route_filter(cli, toml)?;
        let watch = cli.watch || toml.is_some_and(|t| t.watch.enabled);
        let interval = Self::resolve_interval(cli, toml)?;

        Ok(Self {
            targets,
            snapshot,
            link_filter,
            address_filter,
            route_filter,
            watch,
            interval,
            json: cli.json,
            verbose: cli.verbose,
        })
    }

    /// Merges and parses targets. CLI targets replace TOML targets entirely.
    fn resolve_targets(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Vec<IpAddr>, ConfigError> {
        let raw: Vec<&str> = if cli.targets.is_empty() {
            toml.map_or_else(Vec::new, |t| {
                t.resolve.targets.iter().map(String::as_str).collect()
            })
        } else {
            cli.targets.iter().map(String::as_str).collect()
        };

        raw.into_iter()
            .map(|value| {
                value.parse().map_err(|_| ConfigError::InvalidTarget {
                    value: value.to_string(),
                })
            })
            .collect()
    }

    /// Builds the interface filter chain. CLI patterns replace TOML
    /// patterns; include and exclude lists are handled independently.
    fn build_link_filter(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<LinkFilterChain, ConfigError> {
        let includes: &[String] = if cli.include_interfaces.is_empty() {
            toml.map_or(&[], |t| t.filter.include.as_slice())
        } else {
            &cli.include_interfaces
        };
        let excludes: &[String] = if cli.exclude_interfaces.is_empty() {
            toml.map_or(&[], |t| t.filter.exclude.as_slice())
        } else {
            &cli.exclude_interfaces
        };

        let mut chain = LinkFilterChain::new();
        for pattern in includes {
            chain = chain.include(Self::compile_pattern(pattern)?);
        }
        for pattern in excludes {
            chain = chain.exclude(Self::compile_pattern(pattern)?);
        }
        Ok(chain)
    }

    fn compile_pattern(pattern: &str) -> Result<NameRegexFilter, ConfigError> {
        NameRegexFilter::new(pattern).map_err(|source| ConfigError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })
    }

    /// Builds the address validity policy. Boolean opt-ins use OR semantics:
    /// set in either source means enabled.
    fn build_address_filter(cli: &Cli, toml: Option<&TomlConfig>) -> NodeAddressFilter {
        let mut filter = NodeAddressFilter::new();
        if cli.allow_deprecated || toml.is_some_and(|t| t.filter.allow_deprecated) {
            filter = filter.with_deprecated();
        }
        if cli.allow_link_local || toml.is_some_and(|t| t.filter.allow_link_local) {
            filter = filter.with_link_local();
        }
        filter
    }

    /// Builds the route provenance filter. CLI protocols replace TOML ones.
    fn build_route_filter(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<ProtocolFilter, ConfigError> {
        if !cli.exclude_route_protocols.is_empty() {
            return Ok(ProtocolFilter::excluding(
                cli.exclude_route_protocols
                    .iter()
                    .map(|&arg| RouteProtocol::from(arg)),
            ));
        }

        let names: &[String] =
            toml.map_or(&[], |t| t.filter.exclude_route_protocols.as_slice());
        let protocols: Vec<RouteProtocol> = names
            .iter()
            .map(|name| Self::parse_protocol(name))
            .collect::<Result<_, _>>()?;
        Ok(ProtocolFilter::excluding(protocols))
    }

    /// Strict protocol name parsing for config values. Unlike route table
    /// parsing, an unknown name here is a user mistake, not data to pass
    /// through.
    fn parse_protocol(name: &str) -> Result<RouteProtocol, ConfigError> {
        match name {
            "kernel" => Ok(RouteProtocol::Kernel),
            "boot" => Ok(RouteProtocol::Boot),
            "static" => Ok(RouteProtocol::Static),
            "dhcp" => Ok(RouteProtocol::Dhcp),
            "ra" => Ok(RouteProtocol::Ra),
            _ => Err(ConfigError::InvalidRouteProtocol {
                value: name.to_string(),
            }),
        }
    }

    fn resolve_interval(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Duration, ConfigError> {
        let secs = cli
            .interval
            .or_else(|| toml.and_then(|t| t.watch.interval))
            .unwrap_or(defaults::WATCH_INTERVAL_SECS);
        if secs == 0 {
            return Err(ConfigError::InvalidInterval {
                reason: "must be at least 1 second".to_string(),
            });
        }
        Ok(Duration::from_secs(secs))
    }
}

/// Writes the default configuration template to the given path.
///
/// # Errors
///
/// Returns [`ConfigError::FileWrite`] if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    std::fs::write(path, default_config_template()).map_err(|source| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}
