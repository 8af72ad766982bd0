//! Configuration layer for node-addr.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Configuration values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - Values explicitly passed via command line
//! 2. **TOML config file** - Values from the configuration file
//! 3. **Built-in defaults** - Hardcoded default values
//!
//! For list-valued options (targets, interface patterns, excluded route
//! protocols), CLI values **replace** TOML values entirely (not merged).
//! Include and exclude patterns are handled independently: CLI includes
//! replace only TOML includes, and likewise for excludes.
//!
//! # Boolean Flag Semantics
//!
//! Boolean flags (`--watch`, `--allow-deprecated`, `--allow-link-local`)
//! use OR semantics: set `true` in either CLI or TOML means enabled. Flags
//! only enable, never disable.

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;

#[cfg(test)]
mod validated_tests;

pub use cli::{Cli, Command, RouteProtocolArg};
pub use error::ConfigError;
pub use toml::{TomlConfig, default_config_template};
pub use validated::{ValidatedConfig, write_default_config};
