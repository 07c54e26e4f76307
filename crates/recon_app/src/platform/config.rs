use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use engine_logging::LogDestination;
use log::LevelFilter;
use recon_engine::ClientSettings;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{name} has invalid value `{value}`: expected {expected}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Dashboard configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub api: ClientSettings,
    /// Where pages, exports, preferences and the log file go.
    pub output_dir: PathBuf,
    /// Overrides every module's own polling interval when set.
    pub poll_interval: Option<Duration>,
    pub log_destination: LogDestination,
    pub log_level: LevelFilter,
}

impl DashboardConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                      | Default                         |
    /// |------------------------------|---------------------------------|
    /// | `RECON_API_BASE`             | `http://localhost:3001/api/v1`  |
    /// | `RECON_API_TOKEN`            | none                            |
    /// | `RECON_OUTPUT_DIR`           | `./dashboard`                   |
    /// | `RECON_CONNECT_TIMEOUT_SECS` | `5`                             |
    /// | `RECON_REQUEST_TIMEOUT_SECS` | `15`                            |
    /// | `RECON_POLL_INTERVAL_MS`     | per-module default              |
    /// | `RECON_LOG`                  | `file` (`terminal`, `both`)     |
    /// | `RECON_LOG_LEVEL`            | `info`                          |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`DashboardConfig::from_env`] with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = ClientSettings::default();

        let base_url = var("RECON_API_BASE").unwrap_or(defaults.base_url);
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                name: "RECON_API_BASE",
                value: base_url,
                expected: "an http:// or https:// URL",
            });
        }

        let connect_timeout = match var("RECON_CONNECT_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(positive("RECON_CONNECT_TIMEOUT_SECS", &raw)?),
            None => defaults.connect_timeout,
        };
        let request_timeout = match var("RECON_REQUEST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(positive("RECON_REQUEST_TIMEOUT_SECS", &raw)?),
            None => defaults.request_timeout,
        };
        let poll_interval = var("RECON_POLL_INTERVAL_MS")
            .map(|raw| positive("RECON_POLL_INTERVAL_MS", &raw).map(Duration::from_millis))
            .transpose()?;

        let log_destination = match var("RECON_LOG") {
            Some(raw) => LogDestination::parse(&raw).ok_or(ConfigError::Invalid {
                name: "RECON_LOG",
                value: raw,
                expected: "terminal, file or both",
            })?,
            None => LogDestination::File,
        };
        let log_level = match var("RECON_LOG_LEVEL") {
            Some(raw) => LevelFilter::from_str(&raw).map_err(|_| ConfigError::Invalid {
                name: "RECON_LOG_LEVEL",
                value: raw,
                expected: "off, error, warn, info, debug or trace",
            })?,
            None => LevelFilter::Info,
        };

        Ok(Self {
            api: ClientSettings {
                base_url,
                auth_token: var("RECON_API_TOKEN"),
                connect_timeout,
                request_timeout,
            },
            output_dir: var("RECON_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./dashboard")),
            poll_interval,
            log_destination,
            log_level,
        })
    }

    pub fn log_file(&self) -> PathBuf {
        self.output_dir.join("dashboard.log")
    }
}

fn positive(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::Invalid {
            name,
            value: raw.to_string(),
            expected: "a positive integer",
        }),
    }
}
