//! Statistics providers.
//!
//! Every provider implements [`StatisticsSource`]: one call fetches one
//! indicator and either yields a number or a [`SourceError`]. Calls never
//! retry and never panic on bad input; the refresh orchestrator decides
//! what to do when a provider comes back empty.

pub mod eurostat;
pub mod world_bank;

#[cfg(test)]
pub(crate) mod test_support;

pub use eurostat::EurostatClient;
pub use world_bank::WorldBankClient;

use crate::models::DataSource;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// User agent sent to every provider.
pub const USER_AGENT: &str = concat!("popstream/", env!("CARGO_PKG_VERSION"));

/// A raw statistical indicator a provider may be able to supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indicator {
    /// Number of people aged 65 and over.
    PopulationOver65,
    /// Total population.
    TotalPopulation,
    /// Crude birth rate, births per 1,000 people per year.
    CrudeBirthRate,
    /// Live births in the latest year.
    AnnualBirths,
}

impl std::fmt::Display for Indicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PopulationOver65 => write!(f, "population_over_65"),
            Self::TotalPopulation => write!(f, "total_population"),
            Self::CrudeBirthRate => write!(f, "crude_birth_rate"),
            Self::AnnualBirths => write!(f, "annual_births"),
        }
    }
}

/// Why a provider could not supply an indicator.
///
/// Every variant means the same thing to callers: the value is not
/// available from this provider for this cycle.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The request could not be sent or the connection failed.
    #[error("network error: {0}")]
    Network(String),

    /// The provider did not answer within the timeout.
    #[error("request timed out")]
    Timeout,

    /// The provider answered with a non-success status.
    #[error("provider returned HTTP {0}")]
    Status(u16),

    /// The payload could not be parsed.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// The payload parsed but held no usable observation.
    #[error("no observation in payload")]
    Empty,

    /// The provider does not publish this indicator.
    #[error("indicator {0} not supported by this provider")]
    Unsupported(Indicator),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// A provider of demographic indicators.
#[async_trait]
pub trait StatisticsSource: Send + Sync {
    /// Human-readable provider name, e.g. "World Bank".
    fn name(&self) -> &str;

    /// The tier values from this provider are tagged with.
    fn tier(&self) -> DataSource;

    /// Returns true if this provider publishes `indicator`.
    fn supports(&self, indicator: Indicator) -> bool;

    /// Fetches the latest value of `indicator`.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] for any failure: network, timeout,
    /// unexpected status, unparseable or empty payload.
    async fn fetch(&self, indicator: Indicator) -> Result<f64, SourceError>;
}

/// Builds the pooled HTTP client shared by a provider's calls.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, SourceError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .pool_max_idle_per_host(4)
        .timeout(timeout)
        .build()
        .map_err(|e| SourceError::Network(e.to_string()))
}

/// Accepts a provider observation only if it is a usable positive figure.
pub(crate) fn usable(value: Option<f64>) -> Result<f64, SourceError> {
    match value {
        None => Err(SourceError::Empty),
        Some(v) if !v.is_finite() || v < 0.0 => {
            Err(SourceError::Malformed(format!("unusable value {v}")))
        }
        // A zero figure is how these providers report a missing year.
        Some(v) if v <= 0.0 => Err(SourceError::Empty),
        Some(v) => Ok(v),
    }
}
