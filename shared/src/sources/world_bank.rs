//! World Bank indicators API client (primary tier).
//!
//! Reads single-country indicator series from
//! `{base}/country/{iso3}/indicator/{code}?format=json`.

use super::{http_client, usable, Indicator, SourceError, StatisticsSource};
use crate::models::DataSource;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.worldbank.org/v2";

/// Default country (ISO 3166-1 alpha-3).
pub const DEFAULT_COUNTRY: &str = "GBR";

/// World Bank API client.
#[derive(Debug, Clone)]
pub struct WorldBankClient {
    client: reqwest::Client,
    base_url: String,
    country: String,
    year: Option<u16>,
}

/// One row of an indicator series.
#[derive(Debug, Deserialize)]
struct Observation {
    #[serde(default)]
    date: Option<String>,
    value: Option<f64>,
}

/// The API answers `[paging, rows]`; error payloads are a single-element
/// array and fail to parse as this shape.
#[derive(Debug, Deserialize)]
struct SeriesResponse(serde_json::Value, Option<Vec<Observation>>);

impl WorldBankClient {
    /// Creates a client for `country` rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        country: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            country: country.into(),
            year: None,
        })
    }

    /// Pins every request to one reporting year instead of the most recent
    /// non-empty value.
    #[must_use]
    pub fn with_year(mut self, year: u16) -> Self {
        self.year = Some(year);
        self
    }

    /// The World Bank series code for an indicator, if published.
    #[must_use]
    pub fn indicator_code(indicator: Indicator) -> Option<&'static str> {
        match indicator {
            Indicator::PopulationOver65 => Some("SP.POP.65UP.TO"),
            Indicator::TotalPopulation => Some("SP.POP.TOTL"),
            Indicator::CrudeBirthRate => Some("SP.DYN.CBRT.IN"),
            Indicator::AnnualBirths => None,
        }
    }

    fn series_url(&self, code: &str) -> String {
        format!(
            "{}/country/{}/indicator/{}",
            self.base_url, self.country, code
        )
    }
}

#[async_trait]
impl StatisticsSource for WorldBankClient {
    fn name(&self) -> &str {
        "World Bank"
    }

    fn tier(&self) -> DataSource {
        DataSource::Primary
    }

    fn supports(&self, indicator: Indicator) -> bool {
        Self::indicator_code(indicator).is_some()
    }

    async fn fetch(&self, indicator: Indicator) -> Result<f64, SourceError> {
        let code = Self::indicator_code(indicator).ok_or(SourceError::Unsupported(indicator))?;
        let url = self.series_url(code);

        let period = match self.year {
            Some(year) => ("date", year.to_string()),
            None => ("mrnev", "1".to_string()),
        };

        debug!(%url, %indicator, "Fetching World Bank indicator");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(&[("format", "json".to_string()), period])
            .send()
            .await?
            .error_for_status()?;

        let SeriesResponse(_, rows) = response.json().await?;
        let latest = rows
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or(SourceError::Empty)?;

        debug!(%indicator, date = ?latest.date, value = ?latest.value, "World Bank observation");
        usable(latest.value)
    }
}
