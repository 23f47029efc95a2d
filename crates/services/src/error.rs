//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use tracker_core::model::UnitError;
use tracker_core::state::StateError;

/// Errors emitted by `TrackerService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrackerError {
    #[error(transparent)]
    Unit(#[from] UnitError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors reported by a `Notifier`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NotifyError {
    #[error("notifications are unavailable: {0}")]
    Unavailable(String),
    #[error("notification was rejected: {0}")]
    Rejected(String),
}

/// Errors emitted by `ReminderService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReminderError {
    #[error(transparent)]
    Notify(#[from] NotifyError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
