//! Application state module.
//!
//! Defines the shared application state that is passed to route handlers.

use shared::publish::Publisher;
use shared::refresh::DEFAULT_REFRESH_INTERVAL;
use shared::storage::FetchCacheReader;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Application state shared across all request handlers.
///
/// Handlers only ever read: demographic snapshots come from the publisher
/// and the last fetch time from the fetch gate's reader.
#[derive(Clone)]
pub struct AppState {
    publisher: Arc<Publisher>,
    fetch_cache: FetchCacheReader,
    data_sources: Arc<[String]>,
    environment: Arc<str>,
    refresh_interval: Duration,
    started_at: Instant,
}

impl AppState {
    /// Creates a new application state.
    ///
    /// `data_sources` lists the provider names reported by `/api/status`.
    pub fn new(
        publisher: Arc<Publisher>,
        fetch_cache: FetchCacheReader,
        data_sources: Vec<String>,
    ) -> Self {
        Self {
            publisher,
            fetch_cache,
            data_sources: data_sources.into(),
            environment: Arc::from("development"),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            started_at: Instant::now(),
        }
    }

    /// Sets the environment name.
    #[must_use]
    pub fn with_environment(mut self, environment: impl AsRef<str>) -> Self {
        self.environment = Arc::from(environment.as_ref());
        self
    }

    /// Sets the refresh cycle interval used to predict the next update.
    #[must_use]
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Returns the fan-out publisher.
    #[must_use]
    pub fn publisher(&self) -> &Publisher {
        self.publisher.as_ref()
    }

    /// Returns the fetch gate reader.
    #[must_use]
    pub fn fetch_cache(&self) -> &FetchCacheReader {
        &self.fetch_cache
    }

    /// Returns the configured provider names.
    #[must_use]
    pub fn data_sources(&self) -> &[String] {
        &self.data_sources
    }

    /// Returns the environment name.
    #[must_use]
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Returns the refresh cycle interval.
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Time since the state was created.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
