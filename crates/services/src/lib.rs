#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod notifier;
pub mod reminder_service;
pub mod reminder_task;
pub mod tracker_service;

pub use tracker_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, NotifyError, ReminderError, TrackerError};
pub use notifier::{LogNotifier, Notification, Notifier, Permission};
pub use reminder_service::{ReminderOutcome, ReminderService};
pub use reminder_task::ReminderTask;
pub use tracker_service::{Command, CommandOutcome, TrackerService};
