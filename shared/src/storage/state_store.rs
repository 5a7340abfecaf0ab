//! Demographic state store.
//!
//! The refresh orchestrator owns the single [`DemographicStore`] writer;
//! everything else holds a [`StateReader`]. Writers publish a whole new
//! [`DemographicState`] at once, so readers never observe a torn update.

use crate::models::{DemographicState, MetricKind, MetricSnapshot};
use chrono::{DateTime, Utc};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to acquire lock on the store.
    #[error("Failed to acquire lock on state store")]
    LockError,
}

type Slot = Arc<RwLock<Arc<DemographicState>>>;

/// The single writer for the demographic state.
///
/// Deliberately not `Clone`: there is exactly one writer per process.
#[derive(Debug)]
pub struct DemographicStore {
    slot: Slot,
}

/// A read-only handle to the demographic state.
#[derive(Debug, Clone)]
pub struct StateReader {
    slot: Slot,
}

impl DemographicStore {
    /// Creates a store with every metric empty as of `at`.
    #[must_use]
    pub fn new(at: DateTime<Utc>) -> Self {
        Self::with_state(DemographicState::empty(at))
    }

    /// Creates a store seeded with `state`.
    #[must_use]
    pub fn with_state(state: DemographicState) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Arc::new(state))),
        }
    }

    /// Returns a read-only handle.
    #[must_use]
    pub fn reader(&self) -> StateReader {
        StateReader {
            slot: Arc::clone(&self.slot),
        }
    }

    /// Returns the current state.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn current(&self) -> Result<Arc<DemographicState>, StoreError> {
        let guard = self.slot.read().map_err(|_| StoreError::LockError)?;
        Ok(Arc::clone(&guard))
    }

    /// Writes new snapshots for the given metrics, leaving the others as
    /// they are, and returns the resulting state.
    ///
    /// A snapshot's `last_update` never moves backwards: if an update
    /// carries an older timestamp than the stored one, the stored one wins.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn apply(
        &self,
        updates: impl IntoIterator<Item = (MetricKind, MetricSnapshot)>,
    ) -> Result<Arc<DemographicState>, StoreError> {
        let mut guard = self.slot.write().map_err(|_| StoreError::LockError)?;
        let mut next = DemographicState::clone(&guard);
        for (kind, mut snapshot) in updates {
            let previous = next.get(kind).last_update;
            snapshot.last_update = snapshot.last_update.max(previous);
            *next.get_mut(kind) = snapshot;
        }
        let next = Arc::new(next);
        *guard = Arc::clone(&next);
        Ok(next)
    }

    /// Marks every metric as confirmed fresh at `at` without touching
    /// values or sources.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn touch_all(&self, at: DateTime<Utc>) -> Result<Arc<DemographicState>, StoreError> {
        let current = self.current()?;
        self.apply(MetricKind::ALL.map(|kind| {
            let mut snapshot = current.get(kind).clone();
            snapshot.last_update = at;
            (kind, snapshot)
        }))
    }
}

impl StateReader {
    /// Returns the most recently published state.
    ///
    /// Never blocks on an in-flight refresh beyond the pointer swap, and
    /// still answers if a writer panicked mid-swap.
    #[must_use]
    pub fn snapshot(&self) -> Arc<DemographicState> {
        let guard = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }
}
