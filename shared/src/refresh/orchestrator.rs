//! Refresh orchestrator.
//!
//! One call to [`RefreshOrchestrator::run_cycle`] is one refresh cycle:
//!
//! 1. If the last live attempt is at least `threshold` old (or there was
//!    none), refresh live: ask each provider tier in order for the metrics
//!    still missing, merge what comes back, fill never-populated gaps with
//!    synthetic values, and record the attempt time whatever happened.
//! 2. Otherwise, mark every metric fresh without changing any value.
//! 3. Either way, broadcast the full state.
//!
//! If no tier yields anything, or the cycle faults, every metric is
//! regenerated synthetically. Nothing here is fatal to the caller.

use super::RefreshError;
use crate::models::{DataSource, MetricKind, MetricSnapshot};
use crate::publish::Publisher;
use crate::rates;
use crate::sources::{Indicator, StatisticsSource};
use crate::storage::{DemographicStore, FetchCache};
use crate::synthetic::SyntheticGenerator;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Default minimum time between live refreshes, in minutes.
pub const DEFAULT_REFRESH_THRESHOLD_MINUTES: i64 = 10;

/// Where the orchestrator is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    /// Waiting for the next tick.
    Idle,
    /// Fetching from providers.
    Refreshing,
    /// Reusing the current values.
    Cached,
}

/// What a cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A live refresh wrote these metrics, each tagged with its tier.
    /// Metrics not listed kept their previous snapshot.
    Refreshed(Vec<(MetricKind, DataSource)>),
    /// No provider yielded data, or the cycle faulted; every metric was
    /// regenerated synthetically.
    Synthetic,
    /// The cache was fresh; only timestamps advanced.
    Cached,
}

/// Values gathered from providers during one live refresh.
#[derive(Debug, Default)]
struct CycleReadings {
    over65: Option<(f64, DataSource)>,
    total_population: Option<(f64, DataSource)>,
    births: Option<(i64, DataSource)>,
}

impl CycleReadings {
    fn is_empty(&self) -> bool {
        self.over65.is_none() && self.total_population.is_none() && self.births.is_none()
    }

    fn has(&self, kind: MetricKind) -> bool {
        match kind {
            MetricKind::Over65 => self.over65.is_some(),
            MetricKind::TotalPopulation => self.total_population.is_some(),
            MetricKind::Births => self.births.is_some(),
        }
    }
}

/// Drives refresh cycles against an ordered list of provider tiers.
pub struct RefreshOrchestrator {
    tiers: Vec<Arc<dyn StatisticsSource>>,
    store: DemographicStore,
    cache: FetchCache,
    publisher: Arc<Publisher>,
    synthetic: SyntheticGenerator,
    threshold: Duration,
    phase: CyclePhase,
}

impl RefreshOrchestrator {
    /// Creates an orchestrator.
    ///
    /// `tiers` are consulted in order; an empty list means every live
    /// refresh falls through to synthetic data.
    #[must_use]
    pub fn new(
        store: DemographicStore,
        cache: FetchCache,
        publisher: Arc<Publisher>,
        tiers: Vec<Arc<dyn StatisticsSource>>,
    ) -> Self {
        Self {
            tiers,
            store,
            cache,
            publisher,
            synthetic: SyntheticGenerator::default(),
            threshold: Duration::minutes(DEFAULT_REFRESH_THRESHOLD_MINUTES),
            phase: CyclePhase::Idle,
        }
    }

    /// Sets the minimum time between live refreshes.
    #[must_use]
    pub fn with_threshold(mut self, threshold: Duration) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the synthetic data generator.
    #[must_use]
    pub fn with_synthetic(mut self, synthetic: SyntheticGenerator) -> Self {
        self.synthetic = synthetic;
        self
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// The fetch gate.
    #[must_use]
    pub fn fetch_cache(&self) -> &FetchCache {
        &self.cache
    }

    /// Names of the configured providers, in tier order.
    #[must_use]
    pub fn provider_names(&self) -> Vec<String> {
        self.tiers.iter().map(|t| t.name().to_string()).collect()
    }

    /// Runs one cycle at the current time.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        self.run_cycle_at(Utc::now()).await
    }

    /// Runs one cycle as if the time were `now`.
    pub async fn run_cycle_at(&mut self, now: DateTime<Utc>) -> CycleOutcome {
        let outcome = if self.cache.is_due(now, self.threshold) {
            self.phase = CyclePhase::Refreshing;
            let outcome = match self.refresh_live(now).await {
                Ok(written) => {
                    info!(metrics = ?written, "Live refresh complete");
                    CycleOutcome::Refreshed(written)
                }
                Err(RefreshError::AllSourcesFailed) => {
                    warn!("No provider returned data, using synthetic values");
                    self.regenerate(now);
                    CycleOutcome::Synthetic
                }
                Err(err) => {
                    error!(error = %err, "Refresh cycle failed, using synthetic values");
                    self.regenerate(now);
                    CycleOutcome::Synthetic
                }
            };
            if let Err(err) = self.cache.record(now) {
                error!(error = %err, "Failed to record fetch attempt");
            }
            outcome
        } else {
            self.phase = CyclePhase::Cached;
            if let Err(err) = self.store.touch_all(now) {
                error!(error = %err, "Failed to refresh timestamps");
            }
            CycleOutcome::Cached
        };

        self.phase = CyclePhase::Idle;
        self.publisher.broadcast(self.publisher.snapshot());
        outcome
    }

    /// Fetches from every tier, merges the results and writes them.
    async fn refresh_live(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<(MetricKind, DataSource)>, RefreshError> {
        let previous = self.store.current()?;
        let stored_total = previous
            .total_population
            .is_populated()
            .then_some(previous.total_population.count);

        let mut readings = CycleReadings::default();
        for tier in &self.tiers {
            let wanted = wanted_from(tier.as_ref(), &readings);
            if wanted.is_empty() {
                continue;
            }
            if tier.tier() != DataSource::Primary {
                info!(provider = tier.name(), indicators = ?wanted, "Trying fallback provider");
            }
            let results = fetch_concurrently(tier, &wanted).await?;
            merge(&mut readings, tier.tier(), results, stored_total);
        }

        if readings.is_empty() {
            return Err(RefreshError::AllSourcesFailed);
        }

        let mut updates = Vec::with_capacity(MetricKind::ALL.len());
        if let Some((value, source)) = readings.over65 {
            updates.push((
                MetricKind::Over65,
                MetricSnapshot::new(
                    rates::whole_count(value),
                    rates::daily_population_delta(value),
                    source,
                    now,
                ),
            ));
        }
        if let Some((value, source)) = readings.total_population {
            updates.push((
                MetricKind::TotalPopulation,
                MetricSnapshot::new(
                    rates::whole_count(value),
                    rates::daily_population_delta(value),
                    source,
                    now,
                ),
            ));
        }
        if let Some((annual, source)) = readings.births {
            #[allow(clippy::cast_precision_loss)]
            let daily = rates::daily_births(annual as f64);
            updates.push((
                MetricKind::Births,
                MetricSnapshot::new(annual, daily, source, now),
            ));
        }

        for kind in MetricKind::ALL {
            if readings.has(kind) {
                continue;
            }
            if previous.get(kind).is_populated() {
                warn!(metric = %kind, "No provider returned data, keeping previous value");
            } else {
                warn!(metric = %kind, "No provider returned data and nothing stored, using synthetic value");
                updates.push((kind, self.synthetic.metric(kind, now)));
            }
        }

        let written = updates.iter().map(|(kind, s)| (*kind, s.source)).collect();
        self.store.apply(updates)?;
        Ok(written)
    }

    fn regenerate(&self, now: DateTime<Utc>) {
        let state = self.synthetic.generate(now);
        let updates = MetricKind::ALL.map(|kind| (kind, state.get(kind).clone()));
        if let Err(err) = self.store.apply(updates) {
            error!(error = %err, "Failed to store synthetic values");
        }
    }
}

impl std::fmt::Debug for RefreshOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshOrchestrator")
            .field("tiers", &self.provider_names())
            .field("threshold", &self.threshold)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

/// Indicators to request from `source` given what is already known.
fn wanted_from(source: &dyn StatisticsSource, readings: &CycleReadings) -> Vec<Indicator> {
    let mut wanted = Vec::new();
    if readings.over65.is_none() && source.supports(Indicator::PopulationOver65) {
        wanted.push(Indicator::PopulationOver65);
    }
    if readings.total_population.is_none() && source.supports(Indicator::TotalPopulation) {
        wanted.push(Indicator::TotalPopulation);
    }
    if readings.births.is_none() {
        if source.supports(Indicator::AnnualBirths) {
            wanted.push(Indicator::AnnualBirths);
        } else if source.supports(Indicator::CrudeBirthRate) {
            wanted.push(Indicator::CrudeBirthRate);
        }
    }
    wanted
}

/// Fetches `indicators` from `source` in parallel and waits for all of them.
///
/// Provider failures come back as values; only a crashed fetch task is an
/// error. Fetches still in flight are aborted when this returns early or is
/// dropped.
async fn fetch_concurrently(
    source: &Arc<dyn StatisticsSource>,
    indicators: &[Indicator],
) -> Result<Vec<(Indicator, Option<f64>)>, RefreshError> {
    let mut tasks = JoinSet::new();
    for &indicator in indicators {
        let source = Arc::clone(source);
        tasks.spawn(async move {
            let result = source.fetch(indicator).await;
            (indicator, result)
        });
    }

    let mut results = Vec::with_capacity(indicators.len());
    while let Some(joined) = tasks.join_next().await {
        let (indicator, result) = joined.map_err(|e| {
            RefreshError::Fault(format!("{} fetch task failed: {e}", source.name()))
        })?;
        match result {
            Ok(value) => results.push((indicator, Some(value))),
            Err(err) => {
                warn!(provider = source.name(), %indicator, error = %err, "Provider could not supply indicator");
                results.push((indicator, None));
            }
        }
    }
    Ok(results)
}

/// Folds one tier's results into the cycle readings.
fn merge(
    readings: &mut CycleReadings,
    tier: DataSource,
    results: Vec<(Indicator, Option<f64>)>,
    stored_total: Option<i64>,
) {
    let mut birth_rate = None;
    for (indicator, value) in results {
        let Some(value) = value else { continue };
        match indicator {
            Indicator::PopulationOver65 => readings.over65 = Some((value, tier)),
            Indicator::TotalPopulation => readings.total_population = Some((value, tier)),
            Indicator::AnnualBirths => {
                readings.births = Some((rates::whole_count(value), tier));
            }
            Indicator::CrudeBirthRate => birth_rate = Some(value),
        }
    }

    // A crude rate needs a population to become a count; prefer this
    // cycle's figure over the stored one.
    if let Some(rate) = birth_rate {
        #[allow(clippy::cast_precision_loss)]
        let total = readings
            .total_population
            .map(|(total, _)| total)
            .or(stored_total.map(|t| t as f64));
        match total {
            Some(total) => {
                readings.births = Some((rates::annual_births_from_rate(rate, total), tier));
            }
            None => warn!("Birth rate available but no population to apply it to"),
        }
    }
}
