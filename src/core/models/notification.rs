use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct DueNotification {
    pub title: String,
    pub body: String,
    /// Stable per subscription and direction so repeated checks replace
    /// rather than stack notifications.
    pub tag: String,
}
