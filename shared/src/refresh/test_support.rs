//! Scripted providers for orchestrator and scheduler tests.

use crate::models::DataSource;
use crate::sources::{Indicator, SourceError, StatisticsSource};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A provider answering from a fixed table and counting calls.
#[derive(Debug)]
pub(crate) struct FakeSource {
    tier: DataSource,
    values: HashMap<Indicator, f64>,
    supported: HashSet<Indicator>,
    calls: Mutex<HashMap<Indicator, usize>>,
}

impl FakeSource {
    /// A provider supporting nothing.
    pub(crate) fn new(tier: DataSource) -> Self {
        Self {
            tier,
            values: HashMap::new(),
            supported: HashSet::new(),
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Supports what the primary provider publishes; answers nothing yet.
    pub(crate) fn primary() -> Self {
        Self::new(DataSource::Primary)
            .supporting(Indicator::PopulationOver65)
            .supporting(Indicator::TotalPopulation)
            .supporting(Indicator::CrudeBirthRate)
    }

    /// Supports what the fallback provider publishes; answers nothing yet.
    pub(crate) fn fallback() -> Self {
        Self::new(DataSource::Fallback)
            .supporting(Indicator::PopulationOver65)
            .supporting(Indicator::AnnualBirths)
    }

    pub(crate) fn supporting(mut self, indicator: Indicator) -> Self {
        self.supported.insert(indicator);
        self
    }

    pub(crate) fn with(mut self, indicator: Indicator, value: f64) -> Self {
        self.values.insert(indicator, value);
        self.supporting(indicator)
    }

    pub(crate) fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub(crate) fn calls_for(&self, indicator: Indicator) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(&indicator)
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl StatisticsSource for FakeSource {
    fn name(&self) -> &str {
        match self.tier {
            DataSource::Primary => "Fake Primary",
            DataSource::Fallback => "Fake Fallback",
            DataSource::Synthetic => "Fake Synthetic",
        }
    }

    fn tier(&self) -> DataSource {
        self.tier
    }

    fn supports(&self, indicator: Indicator) -> bool {
        self.supported.contains(&indicator)
    }

    async fn fetch(&self, indicator: Indicator) -> Result<f64, SourceError> {
        *self.calls.lock().unwrap().entry(indicator).or_insert(0) += 1;
        self.values
            .get(&indicator)
            .copied()
            .ok_or(SourceError::Empty)
    }
}

/// A provider whose fetch task crashes.
#[derive(Debug)]
pub(crate) struct PanickingSource;

#[async_trait]
impl StatisticsSource for PanickingSource {
    fn name(&self) -> &str {
        "Panicking"
    }

    fn tier(&self) -> DataSource {
        DataSource::Primary
    }

    fn supports(&self, _indicator: Indicator) -> bool {
        true
    }

    async fn fetch(&self, _indicator: Indicator) -> Result<f64, SourceError> {
        panic!("provider exploded");
    }
}

/// Counts fetches that were dropped before finishing.
#[derive(Debug, Clone, Default)]
pub(crate) struct Released(Arc<AtomicUsize>);

impl Released {
    pub(crate) fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    /// Waits until at least `expected` fetches have been dropped.
    pub(crate) async fn wait_for(&self, expected: usize) {
        for _ in 0..100 {
            if self.count() >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(
            self.count() >= expected,
            "only {} of {expected} fetches were dropped",
            self.count()
        );
    }
}

struct ReleaseOnDrop(Released);

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        (self.0).0.fetch_add(1, Ordering::SeqCst);
    }
}

/// A primary provider whose fetches never finish, optionally crashing on
/// one indicator once the other two fetches are under way.
#[derive(Debug, Default)]
pub(crate) struct StallingSource {
    panic_on: Option<Indicator>,
    started: Arc<AtomicUsize>,
    released: Released,
}

impl StallingSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn panicking_on(mut self, indicator: Indicator) -> Self {
        self.panic_on = Some(indicator);
        self
    }

    pub(crate) fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub(crate) fn released(&self) -> Released {
        self.released.clone()
    }
}

#[async_trait]
impl StatisticsSource for StallingSource {
    fn name(&self) -> &str {
        "Stalling"
    }

    fn tier(&self) -> DataSource {
        DataSource::Primary
    }

    fn supports(&self, indicator: Indicator) -> bool {
        indicator != Indicator::AnnualBirths
    }

    async fn fetch(&self, indicator: Indicator) -> Result<f64, SourceError> {
        if self.panic_on == Some(indicator) {
            while self.started.load(Ordering::SeqCst) < 2 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            panic!("provider exploded");
        }
        let _guard = ReleaseOnDrop(self.released.clone());
        self.started.fetch_add(1, Ordering::SeqCst);
        std::future::pending::<()>().await;
        unreachable!()
    }
}
