use crate::core::constants::BALANCE_TOLERANCE;
use crate::core::models::{
    balance::{BalanceEntry, BalanceSummary, BreakdownDirection, BreakdownLine},
    person::Person,
    subscription::{ParticipantSplit, PayerSubscription},
};
use log::debug;
use std::collections::HashMap;

/// Folds the two balance sources of one user into bilateral per-counterparty
/// entries. Debts only accumulate when they route through the same
/// counterparty id; there is no netting across three or more people.
pub struct BalanceAggregator<'a> {
    user_id: &'a str,
    entries: HashMap<String, BalanceEntry>,
    total_owed_to_user: f64,
    total_user_owes: f64,
}

impl<'a> BalanceAggregator<'a> {
    pub fn new(user_id: &'a str) -> Self {
        BalanceAggregator {
            user_id,
            entries: HashMap::new(),
            total_owed_to_user: 0.0,
            total_user_owes: 0.0,
        }
    }

    /// Splits where the user is a participant: each one is a debt toward the
    /// subscription's payer. Subscriptions the user pays for are skipped here.
    pub fn add_participant_splits(&mut self, rows: &[ParticipantSplit]) -> &mut Self {
        for row in rows {
            let subscription = &row.subscription;
            if subscription.payer_id == self.user_id {
                continue;
            }

            let participant_count = row.split_count + 1;
            let share = row.split.share(subscription.total_amount, row.split_count);
            let payer = row
                .payer
                .clone()
                .unwrap_or_else(|| Person::placeholder(&subscription.payer_id, "Payer"));

            let entry = self
                .entries
                .entry(subscription.payer_id.clone())
                .or_insert_with(|| BalanceEntry::new(payer));
            entry.net_amount -= share;
            entry.breakdown.push(BreakdownLine {
                subscription_id: subscription.id.clone(),
                name: subscription.name.clone(),
                share_amount: share,
                total_amount: subscription.total_amount,
                participant_count,
                direction: BreakdownDirection::YouOwe,
            });
            self.total_user_owes += share;
        }
        self
    }

    /// Subscriptions the user pays for: every split is a participant owing
    /// the user their share.
    pub fn add_payer_subscriptions(&mut self, rows: &[PayerSubscription]) -> &mut Self {
        for row in rows {
            let subscription = &row.subscription;
            let split_count = row.splits.len();
            let participant_count = split_count + 1;

            for item in &row.splits {
                let participant_id = &item.split.participant_id;
                let share = item.split.share(subscription.total_amount, split_count);
                let participant = item
                    .participant
                    .clone()
                    .unwrap_or_else(|| Person::placeholder(participant_id, "Participant"));

                let entry = self
                    .entries
                    .entry(participant_id.clone())
                    .or_insert_with(|| BalanceEntry::new(participant));
                entry.net_amount += share;
                entry.breakdown.push(BreakdownLine {
                    subscription_id: subscription.id.clone(),
                    name: subscription.name.clone(),
                    share_amount: share,
                    total_amount: subscription.total_amount,
                    participant_count,
                    direction: BreakdownDirection::OwedToYou,
                });
                self.total_owed_to_user += share;
            }
        }
        self
    }

    /// Drops near-zero entries and orders the rest by net amount, largest
    /// amount owed to the user first.
    pub fn finish(self) -> BalanceSummary {
        let mut balances: Vec<BalanceEntry> = self
            .entries
            .into_values()
            .filter(|entry| entry.net_amount.abs() > BALANCE_TOLERANCE)
            .collect();
        balances.sort_by(|a, b| {
            b.net_amount
                .total_cmp(&a.net_amount)
                .then_with(|| a.counterparty.id.cmp(&b.counterparty.id))
        });

        debug!(
            "Aggregated {} balances for user {} (owed to user {:.2}, user owes {:.2})",
            balances.len(),
            self.user_id,
            self.total_owed_to_user,
            self.total_user_owes
        );

        BalanceSummary {
            balances,
            total_owed_to_user: self.total_owed_to_user,
            total_user_owes: self.total_user_owes,
        }
    }
}

pub fn aggregate_balances(
    user_id: &str,
    participant_splits: &[ParticipantSplit],
    payer_subscriptions: &[PayerSubscription],
) -> BalanceSummary {
    let mut aggregator = BalanceAggregator::new(user_id);
    aggregator
        .add_participant_splits(participant_splits)
        .add_payer_subscriptions(payer_subscriptions);
    aggregator.finish()
}
