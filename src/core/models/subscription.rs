use super::person::Person;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Subscription {
    pub id: String,
    pub name: String,
    pub total_amount: f64,
    /// Day of month (1-31) the payer is charged.
    pub billing_day: u32,
    pub payer_id: String,
    pub created_by: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// One participant's share of a subscription. The payer never has a row of
/// their own but always counts as a participant.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Split {
    pub id: String,
    pub subscription_id: String,
    pub participant_id: String,
    pub custom_amount: Option<f64>,
}

impl Split {
    /// Custom amount when present, otherwise an even share of `total_amount`
    /// across `split_count` rows plus the implicit payer.
    pub fn share(&self, total_amount: f64, split_count: usize) -> f64 {
        match self.custom_amount {
            Some(amount) => amount,
            None => even_share(total_amount, split_count + 1),
        }
    }
}

pub fn even_share(total_amount: f64, participant_count: usize) -> f64 {
    if participant_count == 0 {
        0.0
    } else {
        total_amount / participant_count as f64
    }
}

/// A split the user participates in, joined to its subscription, the
/// subscription's payer and the subscription's total number of splits.
#[derive(Clone, Debug)]
pub struct ParticipantSplit {
    pub split: Split,
    pub subscription: Subscription,
    pub payer: Option<Person>,
    pub split_count: usize,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct SplitWithParticipant {
    pub split: Split,
    pub participant: Option<Person>,
}

/// A subscription the user pays for, joined to its splits and participants.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PayerSubscription {
    pub subscription: Subscription,
    pub splits: Vec<SplitWithParticipant>,
}

/// A subscription with everything needed to describe it: payer and splits.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct SubscriptionDetails {
    pub subscription: Subscription,
    pub payer: Option<Person>,
    pub splits: Vec<SplitWithParticipant>,
}
