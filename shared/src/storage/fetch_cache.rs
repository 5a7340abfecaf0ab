//! Live-fetch gate.
//!
//! Records when the last live refresh was attempted so the orchestrator can
//! decide whether a tick should hit the providers or reuse what it has.

use super::StoreError;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, PoisonError, RwLock};

type Slot = Arc<RwLock<Option<DateTime<Utc>>>>;

/// The fetch gate, owned by the refresh orchestrator.
#[derive(Debug, Default)]
pub struct FetchCache {
    last_fetch: Slot,
}

/// A read-only view of the fetch gate.
#[derive(Debug, Clone)]
pub struct FetchCacheReader {
    last_fetch: Slot,
}

impl FetchCache {
    /// Creates a gate with no recorded attempt.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a read-only view.
    #[must_use]
    pub fn reader(&self) -> FetchCacheReader {
        FetchCacheReader {
            last_fetch: Arc::clone(&self.last_fetch),
        }
    }

    /// When the last live refresh was attempted.
    #[must_use]
    pub fn last_fetch(&self) -> Option<DateTime<Utc>> {
        *self.last_fetch.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Time since the last attempt, or `None` if there never was one.
    #[must_use]
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.last_fetch().map(|at| now.signed_duration_since(at))
    }

    /// Returns true if a live refresh is due at `now`.
    ///
    /// No recorded attempt counts as infinitely long ago.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        self.elapsed(now).is_none_or(|elapsed| elapsed >= threshold)
    }

    /// Records a completed attempt, successful or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn record(&self, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut guard = self.last_fetch.write().map_err(|_| StoreError::LockError)?;
        *guard = Some(at);
        Ok(())
    }
}

impl FetchCacheReader {
    /// When the last live refresh was attempted.
    #[must_use]
    pub fn last_fetch(&self) -> Option<DateTime<Utc>> {
        *self.last_fetch.read().unwrap_or_else(PoisonError::into_inner)
    }
}
