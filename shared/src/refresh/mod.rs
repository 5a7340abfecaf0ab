//! The refresh pipeline.
//!
//! [`RefreshOrchestrator`] decides what each cycle does;
//! [`RefreshScheduler`] runs cycles on a timer until shut down.

pub mod orchestrator;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod test_support;

pub use orchestrator::{
    CycleOutcome, CyclePhase, RefreshOrchestrator, DEFAULT_REFRESH_THRESHOLD_MINUTES,
};
pub use scheduler::{RefreshScheduler, DEFAULT_REFRESH_INTERVAL};

use crate::storage::StoreError;
use thiserror::Error;

/// Why a live refresh could not complete normally.
///
/// These never escape a cycle: the orchestrator recovers from all of them
/// by switching to synthetic data.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// No provider tier yielded a value for any metric.
    #[error("all sources failed")]
    AllSourcesFailed,

    /// Something unexpected broke the cycle.
    #[error("refresh fault: {0}")]
    Fault(String),

    /// The state store could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),
}
