use crate::core::errors::SubsplitError;
use crate::core::models::{
    payment::MonthlyPayment,
    person::Person,
    subscription::{
        ParticipantSplit, PayerSubscription, Split, SplitWithParticipant, Subscription, SubscriptionDetails,
    },
};
use crate::core::settlement::BillingPeriod;
use crate::infrastructure::storage::Storage;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

// Lock order when several tables are needed: people, subscriptions, splits, payments.
#[derive(Clone)]
pub struct InMemoryStorage {
    people: Arc<RwLock<HashMap<String, Person>>>,
    subscriptions: Arc<RwLock<HashMap<String, Subscription>>>,
    splits: Arc<RwLock<HashMap<String, Vec<Split>>>>, // subscription_id -> splits
    payments: Arc<RwLock<Vec<MonthlyPayment>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        InMemoryStorage {
            people: Arc::new(RwLock::new(HashMap::new())),
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            splits: Arc::new(RwLock::new(HashMap::new())),
            payments: Arc::new(RwLock::new(Vec::new())),
        }
    }

    fn with_participants(splits: &[Split], people: &HashMap<String, Person>) -> Vec<SplitWithParticipant> {
        splits
            .iter()
            .map(|split| SplitWithParticipant {
                split: split.clone(),
                participant: people.get(&split.participant_id).cloned(),
            })
            .collect()
    }

    fn details(
        subscription: &Subscription,
        people: &HashMap<String, Person>,
        splits: &HashMap<String, Vec<Split>>,
    ) -> SubscriptionDetails {
        let rows = splits.get(&subscription.id).map(Vec::as_slice).unwrap_or_default();
        SubscriptionDetails {
            subscription: subscription.clone(),
            payer: people.get(&subscription.payer_id).cloned(),
            splits: Self::with_participants(rows, people),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_person(&self, person: Person) -> Result<Person, SubsplitError> {
        let mut people = self.people.write().await;
        if people.values().any(|p| p.phone == person.phone) {
            return Err(SubsplitError::PhoneAlreadyRegistered(person.phone));
        }
        people.insert(person.id.clone(), person.clone());
        Ok(person)
    }

    async fn update_person(&self, person: Person) -> Result<Person, SubsplitError> {
        let mut people = self.people.write().await;
        if !people.contains_key(&person.id) {
            return Err(SubsplitError::PersonNotFound(person.id));
        }
        if people.values().any(|p| p.phone == person.phone && p.id != person.id) {
            return Err(SubsplitError::PhoneAlreadyRegistered(person.phone));
        }
        people.insert(person.id.clone(), person.clone());
        Ok(person)
    }

    async fn delete_person(&self, person_id: &str) -> Result<(), SubsplitError> {
        let mut people = self.people.write().await;
        if people.remove(person_id).is_none() {
            return Err(SubsplitError::PersonNotFound(person_id.to_string()));
        }
        let mut splits = self.splits.write().await;
        for rows in splits.values_mut() {
            rows.retain(|s| s.participant_id != person_id);
        }
        let mut payments = self.payments.write().await;
        payments.retain(|p| p.receiver_id != person_id && p.counterparty_id != person_id);
        Ok(())
    }

    async fn get_person(&self, person_id: &str) -> Result<Option<Person>, SubsplitError> {
        Ok(self.people.read().await.get(person_id).cloned())
    }

    async fn get_person_by_phone(&self, phone: &str) -> Result<Option<Person>, SubsplitError> {
        Ok(self.people.read().await.values().find(|p| p.phone == phone).cloned())
    }

    async fn list_people(&self) -> Result<Vec<Person>, SubsplitError> {
        let mut people: Vec<Person> = self.people.read().await.values().cloned().collect();
        people.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(people)
    }

    async fn save_subscription(&self, subscription: Subscription) -> Result<(), SubsplitError> {
        self.subscriptions
            .write()
            .await
            .insert(subscription.id.clone(), subscription);
        Ok(())
    }

    async fn get_subscription(&self, subscription_id: &str) -> Result<Option<Subscription>, SubsplitError> {
        Ok(self.subscriptions.read().await.get(subscription_id).cloned())
    }

    async fn delete_subscription(&self, subscription_id: &str) -> Result<(), SubsplitError> {
        let mut subscriptions = self.subscriptions.write().await;
        if subscriptions.remove(subscription_id).is_none() {
            return Err(SubsplitError::SubscriptionNotFound(subscription_id.to_string()));
        }
        self.splits.write().await.remove(subscription_id);
        Ok(())
    }

    async fn get_subscription_details(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionDetails>, SubsplitError> {
        let people = self.people.read().await;
        let subscriptions = self.subscriptions.read().await;
        let splits = self.splits.read().await;
        Ok(subscriptions
            .get(subscription_id)
            .map(|s| Self::details(s, &people, &splits)))
    }

    async fn list_subscriptions(&self) -> Result<Vec<SubscriptionDetails>, SubsplitError> {
        let people = self.people.read().await;
        let subscriptions = self.subscriptions.read().await;
        let splits = self.splits.read().await;
        let mut all: Vec<SubscriptionDetails> = subscriptions
            .values()
            .map(|s| Self::details(s, &people, &splits))
            .collect();
        all.sort_by(|a, b| {
            b.subscription
                .created_at
                .cmp(&a.subscription.created_at)
                .then_with(|| a.subscription.id.cmp(&b.subscription.id))
        });
        Ok(all)
    }

    async fn count_subscriptions_paid_by(&self, person_id: &str) -> Result<usize, SubsplitError> {
        Ok(self
            .subscriptions
            .read()
            .await
            .values()
            .filter(|s| s.payer_id == person_id)
            .count())
    }

    async fn get_subscriptions_billed_on(&self, day: u32) -> Result<Vec<SubscriptionDetails>, SubsplitError> {
        let people = self.people.read().await;
        let subscriptions = self.subscriptions.read().await;
        let splits = self.splits.read().await;
        Ok(subscriptions
            .values()
            .filter(|s| s.billing_day == day)
            .map(|s| Self::details(s, &people, &splits))
            .collect())
    }

    async fn replace_splits(&self, subscription_id: &str, splits: Vec<Split>) -> Result<(), SubsplitError> {
        let mut all = self.splits.write().await;
        all.remove(subscription_id);
        if !splits.is_empty() {
            all.insert(subscription_id.to_string(), splits);
        }
        Ok(())
    }

    async fn get_participant_splits(&self, participant_id: &str) -> Result<Vec<ParticipantSplit>, SubsplitError> {
        let people = self.people.read().await;
        let subscriptions = self.subscriptions.read().await;
        let splits = self.splits.read().await;

        let mut rows = Vec::new();
        for (subscription_id, subscription_splits) in splits.iter() {
            let Some(subscription) = subscriptions.get(subscription_id) else {
                continue;
            };
            for split in subscription_splits.iter().filter(|s| s.participant_id == participant_id) {
                rows.push(ParticipantSplit {
                    split: split.clone(),
                    subscription: subscription.clone(),
                    payer: people.get(&subscription.payer_id).cloned(),
                    split_count: subscription_splits.len(),
                });
            }
        }
        Ok(rows)
    }

    async fn get_payer_subscriptions(&self, payer_id: &str) -> Result<Vec<PayerSubscription>, SubsplitError> {
        let people = self.people.read().await;
        let subscriptions = self.subscriptions.read().await;
        let splits = self.splits.read().await;
        Ok(subscriptions
            .values()
            .filter(|s| s.payer_id == payer_id)
            .map(|s| {
                let rows = splits.get(&s.id).map(Vec::as_slice).unwrap_or_default();
                PayerSubscription {
                    subscription: s.clone(),
                    splits: Self::with_participants(rows, &people),
                }
            })
            .collect())
    }

    async fn insert_monthly_payment(&self, payment: MonthlyPayment) -> Result<MonthlyPayment, SubsplitError> {
        let mut payments = self.payments.write().await;
        if let Some(existing) = payments.iter().find(|p| p.same_period(&payment)) {
            return Ok(existing.clone());
        }
        payments.push(payment.clone());
        Ok(payment)
    }

    async fn get_monthly_payments(
        &self,
        receiver_id: &str,
        period: BillingPeriod,
    ) -> Result<Vec<MonthlyPayment>, SubsplitError> {
        Ok(self
            .payments
            .read()
            .await
            .iter()
            .filter(|p| p.receiver_id == receiver_id && p.month == period.month && p.year == period.year)
            .cloned()
            .collect())
    }
}
