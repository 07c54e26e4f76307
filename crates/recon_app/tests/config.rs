use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use engine_logging::LogDestination;
use log::LevelFilter;
use recon_app::platform::config::{ConfigError, DashboardConfig};

fn load(vars: &[(&str, &str)]) -> Result<DashboardConfig, ConfigError> {
    let env: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    DashboardConfig::from_lookup(|name| env.get(name).cloned())
}

#[test]
fn defaults_match_local_backend() {
    let config = load(&[]).unwrap();
    assert_eq!(config.api.base_url, "http://localhost:3001/api/v1");
    assert_eq!(config.api.auth_token, None);
    assert_eq!(config.api.connect_timeout, Duration::from_secs(5));
    assert_eq!(config.api.request_timeout, Duration::from_secs(15));
    assert_eq!(config.output_dir, PathBuf::from("./dashboard"));
    assert_eq!(config.poll_interval, None);
    assert_eq!(config.log_destination, LogDestination::File);
    assert_eq!(config.log_level, LevelFilter::Info);
    assert_eq!(config.log_file(), PathBuf::from("./dashboard/dashboard.log"));
}

#[test]
fn overrides_are_applied() {
    let config = load(&[
        ("RECON_API_BASE", "https://recon.internal/api/v1"),
        ("RECON_API_TOKEN", "abc"),
        ("RECON_OUTPUT_DIR", "/tmp/pages"),
        ("RECON_REQUEST_TIMEOUT_SECS", "30"),
        ("RECON_POLL_INTERVAL_MS", "750"),
        ("RECON_LOG", "both"),
        ("RECON_LOG_LEVEL", "debug"),
    ])
    .unwrap();
    assert_eq!(config.api.base_url, "https://recon.internal/api/v1");
    assert_eq!(config.api.auth_token.as_deref(), Some("abc"));
    assert_eq!(config.api.request_timeout, Duration::from_secs(30));
    assert_eq!(config.output_dir, PathBuf::from("/tmp/pages"));
    assert_eq!(config.poll_interval, Some(Duration::from_millis(750)));
    assert_eq!(config.log_destination, LogDestination::Both);
    assert_eq!(config.log_level, LevelFilter::Debug);
}

#[test]
fn blank_values_fall_back_to_defaults() {
    let config = load(&[("RECON_API_TOKEN", "  "), ("RECON_POLL_INTERVAL_MS", "")]).unwrap();
    assert_eq!(config.api.auth_token, None);
    assert_eq!(config.poll_interval, None);
}

#[test]
fn invalid_values_are_errors() {
    for (name, value) in [
        ("RECON_CONNECT_TIMEOUT_SECS", "soon"),
        ("RECON_REQUEST_TIMEOUT_SECS", "0"),
        ("RECON_POLL_INTERVAL_MS", "-5"),
        ("RECON_LOG", "syslog"),
        ("RECON_LOG_LEVEL", "loud"),
        ("RECON_API_BASE", "localhost:3001"),
    ] {
        let err = load(&[(name, value)]).unwrap_err();
        let ConfigError::Invalid { name: reported, .. } = &err;
        assert_eq!(*reported, name);
        assert!(err.to_string().contains(value));
    }
}
