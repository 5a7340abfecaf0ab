//! Server configuration module.
//!
//! Handles loading configuration from environment variables with sensible defaults.

use anyhow::{bail, Context, Result};
use shared::refresh::{DEFAULT_REFRESH_INTERVAL, DEFAULT_REFRESH_THRESHOLD_MINUTES};
use shared::sources::{eurostat, world_bank, DEFAULT_TIMEOUT};
use std::net::SocketAddr;
use std::time::Duration;

/// Server configuration.
///
/// Configuration values can be set via environment variables:
/// - `POPSTREAM_HOST`: The host address to bind to (default: "0.0.0.0")
/// - `PORT`: The port to listen on (default: 3000)
/// - `APP_ENV`: Environment name reported by `/api/status` (default: "development")
/// - `POPSTREAM_REFRESH_INTERVAL_SECS`: Seconds between refresh cycles (default: 30)
/// - `POPSTREAM_REFRESH_THRESHOLD_MINUTES`: Minutes between live fetches (default: 10)
/// - `POPSTREAM_SOURCE_TIMEOUT_SECS`: Per-request provider timeout (default: 15)
/// - `POPSTREAM_WORLD_BANK_URL`, `POPSTREAM_EUROSTAT_URL`: Provider API roots
/// - `POPSTREAM_COUNTRY`: World Bank country code (default: "GBR")
/// - `POPSTREAM_GEO`: Eurostat geography code (default: "UK")
/// - `POPSTREAM_OFFLINE`: Serve synthetic data only (default: false)
#[derive(Debug, Clone)]
pub struct Config {
    /// The host address to bind to.
    pub host: String,
    /// The port to listen on.
    pub port: u16,
    /// Deployment environment name.
    pub environment: String,
    /// Time between refresh cycles.
    pub refresh_interval: Duration,
    /// Minimum time between live fetches.
    pub refresh_threshold: chrono::Duration,
    /// Per-request provider timeout.
    pub source_timeout: Duration,
    /// World Bank API root.
    pub world_bank_url: String,
    /// Eurostat API root.
    pub eurostat_url: String,
    /// World Bank country code.
    pub country: String,
    /// Eurostat geography code.
    pub geo: String,
    /// Skip live providers entirely.
    pub offline: bool,
}

impl Config {
    /// Creates a new configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any numeric or boolean variable is set but cannot
    /// be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates a configuration reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if any numeric or boolean variable is set but cannot
    /// be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let text = |key: &str, default: String| lookup(key).unwrap_or(default);

        let port = parse_var(&lookup, "PORT")?.unwrap_or(defaults.port);
        let refresh_interval = parse_var::<u64>(&lookup, "POPSTREAM_REFRESH_INTERVAL_SECS")?
            .map_or(defaults.refresh_interval, Duration::from_secs);
        let threshold_minutes = parse_var::<i64>(&lookup, "POPSTREAM_REFRESH_THRESHOLD_MINUTES")?;
        let refresh_threshold = match threshold_minutes {
            Some(minutes) if minutes < 0 => {
                bail!("POPSTREAM_REFRESH_THRESHOLD_MINUTES must not be negative")
            }
            Some(minutes) => chrono::Duration::try_minutes(minutes)
                .context("POPSTREAM_REFRESH_THRESHOLD_MINUTES is out of range")?,
            None => defaults.refresh_threshold,
        };
        let source_timeout = parse_var::<u64>(&lookup, "POPSTREAM_SOURCE_TIMEOUT_SECS")?
            .map_or(defaults.source_timeout, Duration::from_secs);
        let offline = match lookup("POPSTREAM_OFFLINE") {
            Some(raw) => parse_bool(&raw).context("POPSTREAM_OFFLINE")?,
            None => defaults.offline,
        };

        if refresh_interval.is_zero() {
            bail!("POPSTREAM_REFRESH_INTERVAL_SECS must be greater than zero");
        }

        Ok(Self {
            host: text("POPSTREAM_HOST", defaults.host),
            port,
            environment: text("APP_ENV", defaults.environment),
            refresh_interval,
            refresh_threshold,
            source_timeout,
            world_bank_url: text("POPSTREAM_WORLD_BANK_URL", defaults.world_bank_url),
            eurostat_url: text("POPSTREAM_EUROSTAT_URL", defaults.eurostat_url),
            country: text("POPSTREAM_COUNTRY", defaults.country),
            geo: text("POPSTREAM_GEO", defaults.geo),
            offline,
        })
    }

    /// Returns the socket address for binding.
    ///
    /// # Panics
    ///
    /// Panics if the host and port combination cannot be parsed as a valid socket address.
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid socket address from config")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "development".to_string(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            refresh_threshold: chrono::Duration::minutes(DEFAULT_REFRESH_THRESHOLD_MINUTES),
            source_timeout: DEFAULT_TIMEOUT,
            world_bank_url: world_bank::DEFAULT_BASE_URL.to_string(),
            eurostat_url: eurostat::DEFAULT_BASE_URL.to_string(),
            country: world_bank::DEFAULT_COUNTRY.to_string(),
            geo: eurostat::DEFAULT_GEO.to_string(),
            offline: false,
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| raw.trim().parse::<T>())
        .transpose()
        .with_context(|| format!("invalid value for {key}"))
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("expected a boolean, got {other:?}"),
    }
}
