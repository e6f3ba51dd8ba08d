pub mod in_memory;
pub mod log_dispatcher;

use crate::core::errors::SubsplitError;
use crate::core::models::notification::DueNotification;
use async_trait::async_trait;

/// Delivers due-bill reminders to a user. Transport is up to the implementor.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, user_id: &str, notification: &DueNotification) -> Result<(), SubsplitError>;
}
