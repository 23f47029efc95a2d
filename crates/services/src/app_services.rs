use std::sync::Arc;

use storage::repository::Storage;
use tracker_core::reminder::ReminderSettings;

use crate::Clock;
use crate::error::AppServicesError;
use crate::notifier::Notifier;
use crate::reminder_service::ReminderService;
use crate::tracker_service::TrackerService;

/// Assembles the app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    tracker: Arc<TrackerService>,
    reminders: Arc<ReminderService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        notifier: Arc<dyn Notifier>,
        settings: ReminderSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, notifier, settings))
    }

    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        clock: Clock,
        notifier: Arc<dyn Notifier>,
        settings: ReminderSettings,
    ) -> Self {
        let tracker = Arc::new(TrackerService::new(clock, Arc::clone(&storage.units)));
        let reminders = Arc::new(ReminderService::new(
            clock,
            Arc::clone(&storage.units),
            notifier,
            settings,
        ));
        Self { tracker, reminders }
    }

    #[must_use]
    pub fn tracker(&self) -> Arc<TrackerService> {
        Arc::clone(&self.tracker)
    }

    #[must_use]
    pub fn reminders(&self) -> Arc<ReminderService> {
        Arc::clone(&self.reminders)
    }
}
