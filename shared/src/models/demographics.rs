//! Demographic data model.
//!
//! Defines the tracked metrics, where their values came from, and the
//! full state that is published to readers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked demographic quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKind {
    /// Population aged 65 and over.
    Over65,
    /// Annual live births.
    Births,
    /// Total resident population.
    TotalPopulation,
}

impl MetricKind {
    /// All metrics, in refresh priority order.
    pub const ALL: [Self; 3] = [Self::Over65, Self::TotalPopulation, Self::Births];
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Over65 => write!(f, "over65"),
            Self::Births => write!(f, "births"),
            Self::TotalPopulation => write!(f, "totalPopulation"),
        }
    }
}

/// The tier a metric value was obtained from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// The primary statistics provider.
    Primary,
    /// The secondary provider, consulted for metrics the primary could not supply.
    Fallback,
    /// Generated locally when no live provider is reachable.
    Synthetic,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Fallback => write!(f, "fallback"),
            Self::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// The latest known value of one metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSnapshot {
    /// The headline figure (people, or births per year).
    pub count: i64,
    /// Daily change derived from `count`; zero for metrics without one.
    pub derived_rate: i64,
    /// When this snapshot was last written or confirmed fresh.
    pub last_update: DateTime<Utc>,
    /// Where `count` came from.
    pub source: DataSource,
}

impl MetricSnapshot {
    /// Creates a snapshot.
    #[must_use]
    pub fn new(count: i64, derived_rate: i64, source: DataSource, last_update: DateTime<Utc>) -> Self {
        Self {
            count,
            derived_rate,
            last_update,
            source,
        }
    }

    /// An empty snapshot used before the first refresh.
    ///
    /// Tagged Synthetic since no provider has answered for it yet.
    #[must_use]
    pub fn empty(at: DateTime<Utc>) -> Self {
        Self::new(0, 0, DataSource::Synthetic, at)
    }

    /// Returns true once the metric has held a real value.
    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.count > 0
    }
}

/// The full set of metric snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicState {
    /// Population aged 65 and over.
    pub over65: MetricSnapshot,
    /// Annual births.
    pub births: MetricSnapshot,
    /// Total population.
    pub total_population: MetricSnapshot,
}

impl DemographicState {
    /// Creates a state with every metric empty.
    #[must_use]
    pub fn empty(at: DateTime<Utc>) -> Self {
        Self {
            over65: MetricSnapshot::empty(at),
            births: MetricSnapshot::empty(at),
            total_population: MetricSnapshot::empty(at),
        }
    }

    /// Returns the snapshot for a metric.
    #[must_use]
    pub fn get(&self, kind: MetricKind) -> &MetricSnapshot {
        match kind {
            MetricKind::Over65 => &self.over65,
            MetricKind::Births => &self.births,
            MetricKind::TotalPopulation => &self.total_population,
        }
    }

    /// Returns a mutable reference to the snapshot for a metric.
    pub fn get_mut(&mut self, kind: MetricKind) -> &mut MetricSnapshot {
        match kind {
            MetricKind::Over65 => &mut self.over65,
            MetricKind::Births => &mut self.births,
            MetricKind::TotalPopulation => &mut self.total_population,
        }
    }

    /// The source that best describes the state as a whole.
    #[must_use]
    pub fn headline_source(&self) -> DataSource {
        self.over65.source
    }
}

impl Default for DemographicState {
    fn default() -> Self {
        Self::empty(Utc::now())
    }
}
