use async_trait::async_trait;

use crate::error::NotifyError;

/// Whether the user allows notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Displays a message to the user.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Ask for (or report an existing) permission to notify.
    async fn request_permission(&self) -> Permission;

    /// Show a notification.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError` if the notification could not be shown.
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Emits notifications as log events. Always permitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            title = %notification.title,
            body = %notification.body,
            "notification"
        );
        Ok(())
    }
}
