//! Tests for configuration merging and validation.

use std::io::Write as _;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser as _;

use super::*;
use crate::net::filter::{AddressFilter, LinkFilter, RouteFilter};
use crate::net::{Address, Link, Route, RouteProtocol};

fn cli(args: &[&str]) -> Cli {
    let mut full = vec!["node-addr"];
    full.extend_from_slice(args);
    Cli::try_parse_from(full).unwrap()
}

fn toml_config(document: &str) -> TomlConfig {
    ::toml::from_str(document).unwrap()
}

fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

mod precedence {
    use super::*;

    #[test]
    fn cli_targets_replace_toml_targets() {
        let cli = cli(&["--target", "10.0.0.2"]);
        let toml = toml_config("[resolve]\ntargets = [\"192.168.1.1\", \"192.168.1.2\"]\n");

        let config = ValidatedConfig::from_raw(&cli, Some(&toml)).unwrap();
        assert_eq!(config.targets, vec![ip("10.0.0.2")]);
    }

    #[test]
    fn toml_targets_used_when_cli_has_none() {
        let cli = cli(&[]);
        let toml = toml_config("[resolve]\ntargets = [\"10.0.0.2\", \"fd00::2\"]\n");

        let config = ValidatedConfig::from_raw(&cli, Some(&toml)).unwrap();
        assert_eq!(config.targets, vec![ip("10.0.0.2"), ip("fd00::2")]);
    }

    #[test]
    fn cli_snapshot_wins_over_toml() {
        let cli = cli(&["--snapshot", "cli.json"]);
        let toml = toml_config("[resolve]\nsnapshot = \"toml.json\"\n");

        let config = ValidatedConfig::from_raw(&cli, Some(&toml)).unwrap();
        assert_eq!(config.snapshot, Some(PathBuf::from("cli.json")));
    }

    #[test]
    fn cli_interval_wins_over_toml() {
        let cli = cli(&["--interval", "5"]);
        let toml = toml_config("[watch]\ninterval = 60\n");

        let config = ValidatedConfig::from_raw(&cli, Some(&toml)).unwrap();
        assert_eq!(config.interval, Duration::from_secs(5));
    }

    #[test]
    fn interval_defaults_when_unset() {
        let config = ValidatedConfig::from_raw(&cli(&[]), None).unwrap();
        assert_eq!(config.interval, Duration::from_secs(defaults::WATCH_INTERVAL_SECS));
    }

    #[test]
    fn watch_flag_uses_or_semantics() {
        let toml = toml_config("[watch]\nenabled = true\n");
        let config = ValidatedConfig::from_raw(&cli(&[]), Some(&toml)).unwrap();
        assert!(config.watch);

        let config = ValidatedConfig::from_raw(&cli(&["--watch"]), None).unwrap();
        assert!(config.watch);
    }

    #[test]
    fn allow_flags_use_or_semantics() {
        let toml = toml_config("[filter]\nallow_deprecated = true\n");
        let config = ValidatedConfig::from_raw(&cli(&["--allow-link-local"]), Some(&toml)).unwrap();

        let deprecated = Address::deprecated(ip("fd01::3"), 64);
        let link_local = Address::new(ip("fe80::1"), 64);
        assert!(config.address_filter.permits(&deprecated));
        assert!(config.address_filter.permits(&link_local));
    }

    #[test]
    fn cli_route_protocols_replace_toml() {
        let cli = cli(&["--exclude-route-protocol", "dhcp"]);
        let toml = toml_config("[filter]\nexclude_route_protocols = [\"ra\"]\n");

        let config = ValidatedConfig::from_raw(&cli, Some(&toml)).unwrap();
        assert!(!config.route_filter.permits(&Route::default_via(1, RouteProtocol::Dhcp)));
        assert!(config.route_filter.permits(&Route::default_via(1, RouteProtocol::Ra)));
    }
}

mod validation {
    use super::*;

    #[test]
    fn invalid_target_is_an_error() {
        let cli = cli(&["--target", "not-an-ip"]);
        let err = ValidatedConfig::from_raw(&cli, None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTarget { .. }));
    }

    #[test]
    fn invalid_regex_is_an_error() {
        let cli = cli(&["--include-interface", "[unclosed"]);
        let err = ValidatedConfig::from_raw(&cli, None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRegex { .. }));
    }

    #[test]
    fn zero_interval_is_an_error() {
        let cli = cli(&["--interval", "0"]);
        let err = ValidatedConfig::from_raw(&cli, None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidInterval { .. }));
    }

    #[test]
    fn unknown_toml_route_protocol_is_an_error() {
        let toml = toml_config("[filter]\nexclude_route_protocols = [\"ospf\"]\n");
        let err = ValidatedConfig::from_raw(&cli(&[]), Some(&toml)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRouteProtocol { .. }));
    }

    #[test]
    fn link_filter_patterns_take_effect() {
        let toml = toml_config("[filter]\ninclude = [\"^eth\"]\nexclude = [\"^eth1$\"]\n");
        let config = ValidatedConfig::from_raw(&cli(&[]), Some(&toml)).unwrap();

        assert!(config.link_filter.matches(&Link::new(1, "eth0")));
        assert!(!config.link_filter.matches(&Link::new(2, "eth1")));
        assert!(!config.link_filter.matches(&Link::new(3, "wlan0")));
    }
}

mod loading {
    use super::*;

    #[test]
    fn load_reads_referenced_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[resolve]\ntargets = [\"10.0.0.2\"]\n")
            .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = ValidatedConfig::load(&cli(&["--config", &path])).unwrap();
        assert_eq!(config.targets, vec![ip("10.0.0.2")]);
    }

    #[test]
    fn load_without_config_file_uses_cli_only() {
        let config = ValidatedConfig::load(&cli(&["--target", "10.0.0.2"])).unwrap();
        assert_eq!(config.targets, vec![ip("10.0.0.2")]);
    }

    #[test]
    fn load_with_missing_config_file_fails() {
        let err =
            ValidatedConfig::load(&cli(&["--config", "/nonexistent/node-addr.toml"])).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }

    #[test]
    fn written_template_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node-addr.toml");

        write_default_config(&path).unwrap();
        let config = TomlConfig::from_file(&path).unwrap();
        assert_eq!(config.watch.interval, Some(10));
    }

    #[test]
    fn display_summarizes_inputs() {
        let config =
            ValidatedConfig::from_raw(&cli(&["--target", "10.0.0.2", "--watch"]), None).unwrap();
        let rendered = config.to_string();
        assert!(rendered.contains("10.0.0.2"));
        assert!(rendered.contains("live"));
        assert!(rendered.contains("watch: true"));
    }
}
