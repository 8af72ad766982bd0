//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Resolution inputs
    #[serde(default)]
    pub resolve: ResolveSection,

    /// Interface and route filtering
    #[serde(default)]
    pub filter: FilterSection,

    /// Watch-mode configuration
    #[serde(default)]
    pub watch: WatchSection,
}

/// Resolution inputs section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolveSection {
    /// Reachability target IPs, tried in order
    #[serde(default)]
    pub targets: Vec<String>,

    /// Path to a JSON table snapshot to resolve against
    pub snapshot: Option<PathBuf>,
}

/// Interface and route filter section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterSection {
    /// Regex patterns for interfaces to include
    #[serde(default)]
    pub include: Vec<String>,

    /// Regex patterns for interfaces to exclude
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Permit deprecated addresses
    #[serde(default)]
    pub allow_deprecated: bool,

    /// Permit link-local addresses
    #[serde(default)]
    pub allow_link_local: bool,

    /// Route protocols to ignore (kernel, boot, static, dhcp, ra)
    #[serde(default)]
    pub exclude_route_protocols: Vec<String>,
}

/// Watch-mode section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Re-resolve on an interval and log when the result changes
    #[serde(default)]
    pub enabled: bool,

    /// Re-resolution interval in seconds
    pub interval: Option<u64>,
}

impl TomlConfig {
    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileRead`] if the file cannot be read and
    /// [`ConfigError::TomlParse`] if it is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }
}

/// Returns the commented configuration template written by `init`.
#[must_use]
pub const fn default_config_template() -> &'static str {
    r#"# node-addr configuration

[resolve]
# Reachability target IPs, tried in order. Without targets, the
# default-route interface is used.
# targets = ["10.0.0.2", "fd00::2"]

# Resolve against a captured JSON table snapshot instead of the live system.
# snapshot = "tables.json"

[filter]
# Regex patterns for interfaces to consider or ignore.
# include = ["^eth", "^bond"]
# exclude = ["^docker", "^veth"]

# Permit addresses normally rejected by the validity policy.
allow_deprecated = false
allow_link_local = false

# Ignore routes installed by these protocols: kernel, boot, static, dhcp, ra.
# exclude_route_protocols = ["ra"]

[watch]
# Re-resolve on an interval and log when the result changes.
enabled = false
interval = 10
"#
}
