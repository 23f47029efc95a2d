use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::reminder_service::{ReminderOutcome, ReminderService};

const FALLBACK_POLL: Duration = Duration::from_secs(15 * 60);

/// Background loop that runs [`ReminderService::check_once`] on a schedule.
///
/// The first check happens after the configured initial delay, then once per
/// polling interval until the task is stopped.
pub struct ReminderTask {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

impl ReminderTask {
    /// Start the loop on the current tokio runtime.
    #[must_use]
    pub fn spawn(service: Arc<ReminderService>) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(service, cancel.clone()));
        Self { handle, cancel }
    }

    /// Token that stops the loop when cancelled.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel the loop and wait for it to exit.
    ///
    /// # Errors
    ///
    /// Returns `JoinError` if the loop panicked.
    pub async fn stop(self) -> Result<(), JoinError> {
        self.cancel.cancel();
        self.handle.await
    }
}

/// Drive reminder checks until `cancel` fires. Check failures are logged and
/// the loop keeps going.
pub async fn run(service: Arc<ReminderService>, cancel: CancellationToken) {
    let settings = service.settings();
    let initial_delay = settings.initial_delay().to_std().unwrap_or(Duration::ZERO);
    let period = settings
        .polling_interval()
        .to_std()
        .ok()
        .filter(|p| !p.is_zero())
        .unwrap_or(FALLBACK_POLL);

    let mut ticker = tokio::time::interval_at(Instant::now() + initial_delay, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        initial_delay_secs = initial_delay.as_secs(),
        poll_secs = period.as_secs(),
        "reminder loop started"
    );

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                match service.check_once().await {
                    Ok(ReminderOutcome::Sent { candidate, .. }) => {
                        tracing::debug!(unit_id = %candidate.id, "reminder check fired");
                    }
                    Ok(outcome) => tracing::debug!(?outcome, "reminder check finished"),
                    Err(err) => tracing::error!(error = %err, "reminder check failed"),
                }
            }
        }
    }

    tracing::info!("reminder loop stopped");
}
