pub mod in_memory;

use crate::core::errors::SubsplitError;
use crate::core::models::audit::AppLog;
use async_trait::async_trait;

/// Audit trail of mutating operations.
#[async_trait]
pub trait LoggingService: Send + Sync {
    async fn record_action(
        &self,
        action: &str,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), SubsplitError>;
    async fn get_logs(&self) -> Result<Vec<AppLog>, SubsplitError>;
}
