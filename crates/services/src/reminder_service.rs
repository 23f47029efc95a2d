use std::sync::Arc;

use chrono::{DateTime, Utc};
use storage::repository::UnitRepository;
use tracker_core::reminder::{self, REMINDER_TITLE, ReminderCandidate, ReminderSettings};

use crate::Clock;
use crate::error::ReminderError;
use crate::notifier::{Notification, Notifier, Permission};

/// Result of one reminder check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderOutcome {
    /// No unit is unfinished and rested.
    NothingDue,
    /// A unit was picked but notifications are not allowed.
    PermissionDenied(ReminderCandidate),
    /// A unit was picked but has no message to send.
    Skipped(ReminderCandidate),
    /// The notification went out and `last_reminded` was recorded.
    Sent {
        candidate: ReminderCandidate,
        notification: Notification,
        at: DateTime<Utc>,
    },
}

/// Picks the least covered rested unit and nudges the user about it.
#[derive(Clone)]
pub struct ReminderService {
    clock: Clock,
    units: Arc<dyn UnitRepository>,
    notifier: Arc<dyn Notifier>,
    settings: ReminderSettings,
}

impl ReminderService {
    #[must_use]
    pub fn new(
        clock: Clock,
        units: Arc<dyn UnitRepository>,
        notifier: Arc<dyn Notifier>,
        settings: ReminderSettings,
    ) -> Self {
        Self {
            clock,
            units,
            notifier,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> ReminderSettings {
        self.settings
    }

    /// Run a single check against the current units.
    ///
    /// `last_reminded` is only written after the notifier accepted the
    /// message, so a failed delivery is retried on the next check.
    ///
    /// # Errors
    ///
    /// Returns `ReminderError::Storage` if units cannot be read or the
    /// reminder time cannot be recorded.
    /// Returns `ReminderError::Notify` if the notifier fails.
    pub async fn check_once(&self) -> Result<ReminderOutcome, ReminderError> {
        let now = self.clock.now();
        let units = self.units.list_units().await?;

        let Some(candidate) = reminder::select_reminder(&units, now, &self.settings) else {
            tracing::debug!(units = units.len(), "no unit due for a reminder");
            return Ok(ReminderOutcome::NothingDue);
        };

        let Some(body) = reminder::compose_message(&candidate) else {
            tracing::warn!(unit_id = %candidate.id, covered = candidate.covered, "no reminder text");
            return Ok(ReminderOutcome::Skipped(candidate));
        };

        if self.notifier.request_permission().await == Permission::Denied {
            tracing::info!(unit_id = %candidate.id, "notifications not permitted");
            return Ok(ReminderOutcome::PermissionDenied(candidate));
        }

        let notification = Notification::new(REMINDER_TITLE, body);
        self.notifier.notify(&notification).await?;
        self.units.update_last_reminded(candidate.id, now).await?;

        tracing::info!(
            unit_id = %candidate.id,
            subject = %candidate.subject,
            covered = candidate.covered,
            "reminder sent"
        );
        Ok(ReminderOutcome::Sent {
            candidate,
            notification,
            at: now,
        })
    }
}
