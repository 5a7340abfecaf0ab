//! Fan-out of demographic state to live subscribers.
//!
//! The [`Publisher`] pushes every completed refresh cycle to all current
//! subscribers and answers point-in-time reads from the state store.
//! Subscribers joining between broadcasts read [`Publisher::snapshot`]
//! first; there is no backlog replay.

use crate::models::DemographicState;
use crate::storage::StateReader;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Name of the event carrying a full state.
pub const UPDATE_EVENT: &str = "demographicsUpdate";

/// Broadcast buffer per subscriber. Slow subscribers skip to the latest
/// state rather than replaying a backlog, so this stays small.
const CHANNEL_CAPACITY: usize = 16;

/// A message sent on the real-time channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEvent {
    /// Event name, always [`UPDATE_EVENT`].
    pub event: String,
    /// The full demographic state.
    pub data: DemographicState,
}

impl UpdateEvent {
    /// Wraps a state in an update event.
    #[must_use]
    pub fn new(data: DemographicState) -> Self {
        Self {
            event: UPDATE_EVENT.to_string(),
            data,
        }
    }
}

/// Broadcasts state updates and serves snapshots.
#[derive(Debug)]
pub struct Publisher {
    reader: StateReader,
    tx: broadcast::Sender<Arc<DemographicState>>,
    broadcasts: AtomicU64,
}

impl Publisher {
    /// Creates a publisher reading from `reader`.
    #[must_use]
    pub fn new(reader: StateReader) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            reader,
            tx,
            broadcasts: AtomicU64::new(0),
        }
    }

    /// Sends `state` to every current subscriber and returns how many
    /// received it.
    pub fn broadcast(&self, state: Arc<DemographicState>) -> usize {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);
        // No subscribers is not an error.
        let delivered = self.tx.send(state).unwrap_or(0);
        tracing::debug!(subscribers = delivered, "Broadcast demographics update");
        delivered
    }

    /// Subscribes to future broadcasts.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DemographicState>> {
        self.tx.subscribe()
    }

    /// The current state, as of the last completed write.
    #[must_use]
    pub fn snapshot(&self) -> Arc<DemographicState> {
        self.reader.snapshot()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Total broadcasts since start.
    #[must_use]
    pub fn broadcast_count(&self) -> u64 {
        self.broadcasts.load(Ordering::Relaxed)
    }
}
