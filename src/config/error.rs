//! Error types for configuration parsing and validation.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for configuration operations.
///
/// Covers errors from parsing, validation, and file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file '{}': {source}", path.display())]
    FileRead {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to write configuration file (for init command).
    #[error("Failed to write config file '{}': {source}", path.display())]
    FileWrite {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A reachability target is not a parseable IP address.
    #[error("Invalid target address '{value}'")]
    InvalidTarget {
        /// The unparseable target string
        value: String,
    },

    /// Invalid regex pattern for interface filtering.
    #[error("Invalid regex pattern '{pattern}': {source}")]
    InvalidRegex {
        /// The invalid pattern
        pattern: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },

    /// Invalid watch interval (zero).
    #[error("Invalid watch interval: {reason}")]
    InvalidInterval {
        /// Reason for invalidity
        reason: String,
    },

    /// Unknown route protocol name.
    #[error("Unknown route protocol '{value}': expected kernel, boot, static, dhcp, or ra")]
    InvalidRouteProtocol {
        /// The unrecognized protocol name
        value: String,
    },
}
