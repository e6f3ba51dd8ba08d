use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Records that `counterparty_id` settled what they owed `receiver_id` for a
/// calendar month. Never changes balances.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct MonthlyPayment {
    pub id: String,
    pub receiver_id: String,
    pub counterparty_id: String,
    pub month: u32,
    pub year: i32,
    pub amount_paid: f64,
    #[serde(with = "chrono::serde::ts_seconds")]
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl MonthlyPayment {
    pub fn same_period(&self, other: &MonthlyPayment) -> bool {
        self.receiver_id == other.receiver_id
            && self.counterparty_id == other.counterparty_id
            && self.month == other.month
            && self.year == other.year
    }
}
