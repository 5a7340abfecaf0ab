//! Timer-driven refresh loop.

use super::{CycleOutcome, RefreshOrchestrator};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default time between cycles.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// A running refresh loop.
///
/// The loop task owns the orchestrator, so cycles can never overlap. The
/// first tick fires immediately.
#[derive(Debug)]
pub struct RefreshScheduler {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RefreshScheduler {
    /// Starts running `orchestrator` every `period`.
    #[must_use]
    pub fn spawn(orchestrator: RefreshOrchestrator, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_loop(orchestrator, period, cancel.clone()));
        Self { cancel, handle }
    }

    /// A token that stops the loop when cancelled.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stops the loop and waits for it to exit.
    ///
    /// A cycle in progress is abandoned; store writes are atomic so readers
    /// keep the last completed state.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(err) = self.handle.await {
            warn!(error = %err, "Refresh loop ended abnormally");
        }
    }
}

async fn run_loop(mut orchestrator: RefreshOrchestrator, period: Duration, cancel: CancellationToken) {
    let mut tick = interval(period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(period_secs = period.as_secs(), "Refresh loop started");

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = tick.tick() => {}
        }

        tokio::select! {
            () = cancel.cancelled() => break,
            outcome = orchestrator.run_cycle() => {
                if outcome == CycleOutcome::Cached {
                    debug!("Cycle served from cache");
                }
            }
        }
    }

    info!("Refresh loop stopped");
}
