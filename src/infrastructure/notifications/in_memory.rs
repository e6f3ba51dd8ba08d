use crate::core::errors::SubsplitError;
use crate::core::models::notification::DueNotification;
use crate::infrastructure::notifications::NotificationDispatcher;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Keeps every dispatched notification, keyed by recipient.
#[derive(Clone, Default)]
pub struct InMemoryDispatcher {
    sent: Arc<RwLock<Vec<(String, DueNotification)>>>,
}

impl InMemoryDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<(String, DueNotification)> {
        self.sent.read().await.clone()
    }

    pub async fn sent_to(&self, user_id: &str) -> Vec<DueNotification> {
        self.sent
            .read()
            .await
            .iter()
            .filter(|(recipient, _)| recipient == user_id)
            .map(|(_, n)| n.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationDispatcher for InMemoryDispatcher {
    async fn dispatch(&self, user_id: &str, notification: &DueNotification) -> Result<(), SubsplitError> {
        self.sent
            .write()
            .await
            .push((user_id.to_string(), notification.clone()));
        Ok(())
    }
}
