//! Eurostat dissemination API client (fallback tier).
//!
//! Queries JSON-stat 2.0 datasets narrowed by dimension filters to a single
//! series for one geography and takes its latest observation. Only the
//! over-65 population and annual births are published here.

use super::{http_client, usable, Indicator, SourceError, StatisticsSource};
use crate::models::DataSource;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default API root.
pub const DEFAULT_BASE_URL: &str =
    "https://ec.europa.eu/eurostat/api/dissemination/statistics/1.0/data";

/// Default geography code.
pub const DEFAULT_GEO: &str = "UK";

/// Dataset and dimension filters that select one series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetQuery {
    /// Dataset code.
    pub dataset: &'static str,
    /// Dimension filters applied on top of `geo`.
    pub filters: &'static [(&'static str, &'static str)],
}

/// Eurostat API client.
#[derive(Debug, Clone)]
pub struct EurostatClient {
    client: reqwest::Client,
    base_url: String,
    geo: String,
}

/// The subset of a JSON-stat dataset this client reads.
#[derive(Debug, Deserialize)]
struct JsonStatDataset {
    #[serde(default)]
    value: Value,
}

impl EurostatClient {
    /// Creates a client for `geo` rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        geo: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            geo: geo.into(),
        })
    }

    /// The dataset query for an indicator, if published.
    #[must_use]
    pub fn dataset_query(indicator: Indicator) -> Option<DatasetQuery> {
        match indicator {
            Indicator::PopulationOver65 => Some(DatasetQuery {
                dataset: "demo_pjanbroad",
                filters: &[("age", "Y_GE65"), ("sex", "T"), ("unit", "NR")],
            }),
            Indicator::AnnualBirths => Some(DatasetQuery {
                dataset: "demo_gind",
                filters: &[("indic_de", "LBIRTH")],
            }),
            Indicator::TotalPopulation | Indicator::CrudeBirthRate => None,
        }
    }
}

/// Returns the observation with the highest flat index.
///
/// JSON-stat stores values either as a dense array or as a sparse object
/// keyed by flat index; time is the last dimension, so the highest index is
/// the latest period.
fn latest_observation(value: &Value) -> Result<Option<f64>, SourceError> {
    match value {
        Value::Array(values) => Ok(values.iter().rev().find_map(Value::as_f64)),
        Value::Object(entries) => {
            let mut latest: Option<(u64, f64)> = None;
            for (key, v) in entries {
                let index = key
                    .parse::<u64>()
                    .map_err(|_| SourceError::Malformed(format!("bad value index {key:?}")))?;
                let Some(v) = v.as_f64() else { continue };
                if latest.is_none_or(|(best, _)| index > best) {
                    latest = Some((index, v));
                }
            }
            Ok(latest.map(|(_, v)| v))
        }
        Value::Null => Ok(None),
        other => Err(SourceError::Malformed(format!(
            "unexpected value container: {other}"
        ))),
    }
}

#[async_trait]
impl StatisticsSource for EurostatClient {
    fn name(&self) -> &str {
        "Eurostat"
    }

    fn tier(&self) -> DataSource {
        DataSource::Fallback
    }

    fn supports(&self, indicator: Indicator) -> bool {
        Self::dataset_query(indicator).is_some()
    }

    async fn fetch(&self, indicator: Indicator) -> Result<f64, SourceError> {
        let query = Self::dataset_query(indicator).ok_or(SourceError::Unsupported(indicator))?;
        let url = format!("{}/{}", self.base_url, query.dataset);

        let mut params: Vec<(&str, &str)> = vec![
            ("format", "JSON"),
            ("lang", "EN"),
            ("geo", self.geo.as_str()),
            ("lastTimePeriod", "1"),
        ];
        params.extend_from_slice(query.filters);

        debug!(%url, %indicator, "Fetching Eurostat dataset");

        let dataset: JsonStatDataset = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        usable(latest_observation(&dataset.value)?)
    }
}
