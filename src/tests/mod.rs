mod settlement_tests;
mod subscription_tests;

use crate::core::errors::SubsplitError;
use crate::core::models::{
    payment::MonthlyPayment,
    person::Person,
    subscription::{ParticipantSplit, PayerSubscription, Split, Subscription, SubscriptionDetails},
};
use crate::core::services::{PersonInput, SplitInput, SubscriptionInput, SubsplitService};
use crate::core::settlement::BillingPeriod;
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::storage::{Storage, in_memory::InMemoryStorage};
use async_trait::async_trait;

pub const ADMIN_PHONE: &str = "11999990000";
pub const TEST_SECRET: &str = "test-secret";

pub type TestService = SubsplitService<InMemoryLogging, InMemoryStorage>;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn create_test_service() -> TestService {
    init_logger();
    let storage = InMemoryStorage::new();
    let logging = InMemoryLogging::new();
    SubsplitService::new(storage, logging, TEST_SECRET.to_string(), 3600)
}

pub fn june() -> BillingPeriod {
    BillingPeriod { month: 6, year: 2024 }
}

pub async fn seed_admin<L, S>(service: &SubsplitService<L, S>) -> Person
where
    L: crate::infrastructure::logging::LoggingService,
    S: Storage,
{
    service.seed_admin("Alice", ADMIN_PHONE).await.unwrap().unwrap()
}

pub async fn add_person<L, S>(service: &SubsplitService<L, S>, admin: &Person, name: &str, phone: &str) -> Person
where
    L: crate::infrastructure::logging::LoggingService,
    S: Storage,
{
    let input = PersonInput {
        name: name.to_string(),
        phone: phone.to_string(),
        is_admin: false,
    };
    service.create_person(input, admin).await.unwrap()
}

pub fn even_input(name: &str, total_amount: f64, billing_day: u32, payer: &Person, participants: &[&Person]) -> SubscriptionInput {
    SubscriptionInput {
        name: name.to_string(),
        total_amount,
        billing_day,
        payer_id: payer.id.clone(),
        payer_percentage: None,
        splits: participants
            .iter()
            .map(|p| SplitInput {
                participant_id: p.id.clone(),
                percentage: None,
            })
            .collect(),
    }
}

pub fn percentage_input(
    name: &str,
    total_amount: f64,
    payer: &Person,
    payer_percentage: f64,
    participants: &[(&Person, f64)],
) -> SubscriptionInput {
    SubscriptionInput {
        name: name.to_string(),
        total_amount,
        billing_day: 5,
        payer_id: payer.id.clone(),
        payer_percentage: Some(payer_percentage),
        splits: participants
            .iter()
            .map(|(p, pct)| SplitInput {
                participant_id: p.id.clone(),
                percentage: Some(*pct),
            })
            .collect(),
    }
}

/// In-memory storage whose balance and payment reads can be made to fail.
#[derive(Clone, Default)]
pub struct FailingStorage {
    pub inner: InMemoryStorage,
    pub fail_participant_splits: bool,
    pub fail_payer_subscriptions: bool,
    pub fail_payments: bool,
    pub fail_person_lookup: bool,
}

fn unavailable() -> SubsplitError {
    SubsplitError::StorageError("connection reset".to_string())
}

#[async_trait]
impl Storage for FailingStorage {
    async fn create_person(&self, person: Person) -> Result<Person, SubsplitError> {
        self.inner.create_person(person).await
    }
    async fn update_person(&self, person: Person) -> Result<Person, SubsplitError> {
        self.inner.update_person(person).await
    }
    async fn delete_person(&self, person_id: &str) -> Result<(), SubsplitError> {
        self.inner.delete_person(person_id).await
    }
    async fn get_person(&self, person_id: &str) -> Result<Option<Person>, SubsplitError> {
        if self.fail_person_lookup {
            return Err(unavailable());
        }
        self.inner.get_person(person_id).await
    }
    async fn get_person_by_phone(&self, phone: &str) -> Result<Option<Person>, SubsplitError> {
        self.inner.get_person_by_phone(phone).await
    }
    async fn list_people(&self) -> Result<Vec<Person>, SubsplitError> {
        self.inner.list_people().await
    }
    async fn save_subscription(&self, subscription: Subscription) -> Result<(), SubsplitError> {
        self.inner.save_subscription(subscription).await
    }
    async fn get_subscription(&self, subscription_id: &str) -> Result<Option<Subscription>, SubsplitError> {
        self.inner.get_subscription(subscription_id).await
    }
    async fn delete_subscription(&self, subscription_id: &str) -> Result<(), SubsplitError> {
        self.inner.delete_subscription(subscription_id).await
    }
    async fn get_subscription_details(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionDetails>, SubsplitError> {
        self.inner.get_subscription_details(subscription_id).await
    }
    async fn list_subscriptions(&self) -> Result<Vec<SubscriptionDetails>, SubsplitError> {
        self.inner.list_subscriptions().await
    }
    async fn count_subscriptions_paid_by(&self, person_id: &str) -> Result<usize, SubsplitError> {
        self.inner.count_subscriptions_paid_by(person_id).await
    }
    async fn get_subscriptions_billed_on(&self, day: u32) -> Result<Vec<SubscriptionDetails>, SubsplitError> {
        self.inner.get_subscriptions_billed_on(day).await
    }
    async fn replace_splits(&self, subscription_id: &str, splits: Vec<Split>) -> Result<(), SubsplitError> {
        self.inner.replace_splits(subscription_id, splits).await
    }
    async fn get_participant_splits(&self, participant_id: &str) -> Result<Vec<ParticipantSplit>, SubsplitError> {
        if self.fail_participant_splits {
            return Err(unavailable());
        }
        self.inner.get_participant_splits(participant_id).await
    }
    async fn get_payer_subscriptions(&self, payer_id: &str) -> Result<Vec<PayerSubscription>, SubsplitError> {
        if self.fail_payer_subscriptions {
            return Err(unavailable());
        }
        self.inner.get_payer_subscriptions(payer_id).await
    }
    async fn insert_monthly_payment(&self, payment: MonthlyPayment) -> Result<MonthlyPayment, SubsplitError> {
        self.inner.insert_monthly_payment(payment).await
    }
    async fn get_monthly_payments(
        &self,
        receiver_id: &str,
        period: BillingPeriod,
    ) -> Result<Vec<MonthlyPayment>, SubsplitError> {
        if self.fail_payments {
            return Err(unavailable());
        }
        self.inner.get_monthly_payments(receiver_id, period).await
    }
}

/// A service over `storage`, sharing its data with `storage.inner`.
pub fn create_failing_service(storage: FailingStorage) -> SubsplitService<InMemoryLogging, FailingStorage> {
    init_logger();
    SubsplitService::new(storage, InMemoryLogging::new(), TEST_SECRET.to_string(), 3600)
}
