use crate::core::errors::SubsplitError;
use crate::core::models::audit::AppLog;
use crate::infrastructure::logging::LoggingService;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct InMemoryLogging {
    logs: Arc<RwLock<Vec<AppLog>>>,
}

impl InMemoryLogging {
    pub fn new() -> Self {
        Self::default()
    }
}

fn into_details(details: serde_json::Value) -> Result<HashMap<String, serde_json::Value>, SubsplitError> {
    match details {
        serde_json::Value::Object(_) => serde_json::from_value(details)
            .map_err(|e| SubsplitError::LoggingError(format!("Failed to read log details: {}", e))),
        serde_json::Value::Null => Ok(HashMap::new()),
        other => Ok(HashMap::from([("value".to_string(), other)])),
    }
}

#[async_trait]
impl LoggingService for InMemoryLogging {
    async fn record_action(
        &self,
        action: &str,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), SubsplitError> {
        let entry = AppLog {
            id: Uuid::new_v4().to_string(),
            action: action.to_string(),
            user_id: user_id.map(String::from),
            details: into_details(details)?,
            timestamp: chrono::Utc::now(),
        };
        self.logs.write().await.push(entry);
        Ok(())
    }

    async fn get_logs(&self) -> Result<Vec<AppLog>, SubsplitError> {
        Ok(self.logs.read().await.clone())
    }
}
