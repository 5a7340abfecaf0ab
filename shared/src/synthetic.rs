//! Synthetic demographic data.
//!
//! Produces plausible UK-scale figures when no provider can be reached, or
//! when the service runs offline. Values are random but always fall inside
//! the same [`SyntheticEnvelope`].

use crate::models::{DataSource, DemographicState, MetricKind, MetricSnapshot};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::ops::Range;

/// Bounds for generated values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticEnvelope {
    /// Baseline population aged 65 and over.
    pub over65_baseline: i64,
    /// Range of the daily over-65 increase.
    pub over65_daily_increase: Range<i64>,
    /// Baseline annual births.
    pub births_baseline: i64,
    /// Range of the daily birth count.
    pub daily_births: Range<i64>,
    /// Range of days of drift added on top of each baseline.
    pub drift_days: Range<i64>,
    /// Fixed total population.
    pub total_population: i64,
}

impl Default for SyntheticEnvelope {
    fn default() -> Self {
        Self {
            over65_baseline: 12_500_000,
            over65_daily_increase: 900..1100,
            births_baseline: 600_000,
            daily_births: 1400..1700,
            drift_days: 0..100,
            total_population: 67_000_000,
        }
    }
}

/// Generates synthetic snapshots inside an envelope.
#[derive(Debug, Clone, Default)]
pub struct SyntheticGenerator {
    envelope: SyntheticEnvelope,
}

impl SyntheticGenerator {
    /// Creates a generator with a custom envelope.
    #[must_use]
    pub fn new(envelope: SyntheticEnvelope) -> Self {
        Self { envelope }
    }

    /// The envelope in use.
    #[must_use]
    pub fn envelope(&self) -> &SyntheticEnvelope {
        &self.envelope
    }

    /// Generates all three metrics using the thread-local RNG.
    #[must_use]
    pub fn generate(&self, at: DateTime<Utc>) -> DemographicState {
        self.generate_with(&mut rand::rng(), at)
    }

    /// Generates all three metrics using `rng`.
    pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R, at: DateTime<Utc>) -> DemographicState {
        DemographicState {
            over65: self.metric_with(rng, MetricKind::Over65, at),
            births: self.metric_with(rng, MetricKind::Births, at),
            total_population: self.metric_with(rng, MetricKind::TotalPopulation, at),
        }
    }

    /// Generates a single metric using the thread-local RNG.
    #[must_use]
    pub fn metric(&self, kind: MetricKind, at: DateTime<Utc>) -> MetricSnapshot {
        self.metric_with(&mut rand::rng(), kind, at)
    }

    fn metric_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        kind: MetricKind,
        at: DateTime<Utc>,
    ) -> MetricSnapshot {
        let env = &self.envelope;
        let (count, rate) = match kind {
            MetricKind::Over65 => {
                let daily = rng.random_range(env.over65_daily_increase.clone());
                let drift = rng.random_range(env.drift_days.clone());
                (env.over65_baseline + daily * drift, daily)
            }
            MetricKind::Births => {
                let daily = rng.random_range(env.daily_births.clone());
                let drift = rng.random_range(env.drift_days.clone());
                (env.births_baseline + daily * drift, daily)
            }
            MetricKind::TotalPopulation => (env.total_population, 0),
        };
        MetricSnapshot::new(count, rate, DataSource::Synthetic, at)
    }
}
