use crate::core::errors::SubsplitError;
use crate::core::models::notification::DueNotification;
use crate::infrastructure::notifications::NotificationDispatcher;
use async_trait::async_trait;
use tracing::info;

/// Writes reminders to the application log instead of pushing them anywhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogDispatcher;

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn dispatch(&self, user_id: &str, notification: &DueNotification) -> Result<(), SubsplitError> {
        info!(
            user_id,
            tag = %notification.tag,
            "{} {}",
            notification.title,
            notification.body
        );
        Ok(())
    }
}
