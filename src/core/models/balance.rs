use super::person::Person;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakdownDirection {
    /// The current user owes the subscription's payer.
    YouOwe,
    /// A participant owes the current user, who pays the subscription.
    OwedToYou,
}

impl std::fmt::Display for BreakdownDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BreakdownDirection::YouOwe => "YOU_OWE",
            BreakdownDirection::OwedToYou => "OWED_TO_YOU",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct BreakdownLine {
    pub subscription_id: String,
    pub name: String,
    pub share_amount: f64,
    pub total_amount: f64,
    pub participant_count: usize,
    pub direction: BreakdownDirection,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct BalanceEntry {
    pub counterparty: Person,
    /// Positive: the counterparty owes the current user. Negative: the
    /// current user owes the counterparty.
    pub net_amount: f64,
    pub breakdown: Vec<BreakdownLine>,
    pub settled_this_month: bool,
}

impl BalanceEntry {
    pub fn new(counterparty: Person) -> Self {
        BalanceEntry {
            counterparty,
            net_amount: 0.0,
            breakdown: Vec::new(),
            settled_this_month: false,
        }
    }

    pub fn lines(&self, direction: BreakdownDirection) -> impl Iterator<Item = &BreakdownLine> {
        self.breakdown.iter().filter(move |line| line.direction == direction)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct BalanceSummary {
    pub balances: Vec<BalanceEntry>,
    pub total_owed_to_user: f64,
    pub total_user_owes: f64,
}

impl BalanceSummary {
    pub fn entry(&self, counterparty_id: &str) -> Option<&BalanceEntry> {
        self.balances.iter().find(|e| e.counterparty.id == counterparty_id)
    }
}
