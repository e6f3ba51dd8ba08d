use crate::core::errors::SubsplitError;
use crate::core::models::{
    payment::MonthlyPayment,
    person::Person,
    subscription::{ParticipantSplit, PayerSubscription, Split, Subscription, SubscriptionDetails},
};
use crate::core::settlement::BillingPeriod;
use async_trait::async_trait;

/// Data-access collaborator. Balance computation only ever reads through the
/// joined queries; writes are plain inserts, deletes and wholesale replaces.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn create_person(&self, person: Person) -> Result<Person, SubsplitError>;
    async fn update_person(&self, person: Person) -> Result<Person, SubsplitError>;
    /// Also removes the person's splits and monthly payments.
    async fn delete_person(&self, person_id: &str) -> Result<(), SubsplitError>;
    async fn get_person(&self, person_id: &str) -> Result<Option<Person>, SubsplitError>;
    async fn get_person_by_phone(&self, phone: &str) -> Result<Option<Person>, SubsplitError>;
    async fn list_people(&self) -> Result<Vec<Person>, SubsplitError>;

    async fn save_subscription(&self, subscription: Subscription) -> Result<(), SubsplitError>;
    async fn get_subscription(&self, subscription_id: &str) -> Result<Option<Subscription>, SubsplitError>;
    /// Cascades to the subscription's splits.
    async fn delete_subscription(&self, subscription_id: &str) -> Result<(), SubsplitError>;
    async fn get_subscription_details(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionDetails>, SubsplitError>;
    /// Newest first.
    async fn list_subscriptions(&self) -> Result<Vec<SubscriptionDetails>, SubsplitError>;
    async fn count_subscriptions_paid_by(&self, person_id: &str) -> Result<usize, SubsplitError>;
    async fn get_subscriptions_billed_on(&self, day: u32) -> Result<Vec<SubscriptionDetails>, SubsplitError>;

    /// Deletes every split of the subscription, then inserts `splits`.
    async fn replace_splits(&self, subscription_id: &str, splits: Vec<Split>) -> Result<(), SubsplitError>;

    async fn get_participant_splits(&self, participant_id: &str) -> Result<Vec<ParticipantSplit>, SubsplitError>;
    async fn get_payer_subscriptions(&self, payer_id: &str) -> Result<Vec<PayerSubscription>, SubsplitError>;

    /// One record per (receiver, counterparty, month, year): inserting a
    /// duplicate returns the stored record unchanged.
    async fn insert_monthly_payment(&self, payment: MonthlyPayment) -> Result<MonthlyPayment, SubsplitError>;
    async fn get_monthly_payments(
        &self,
        receiver_id: &str,
        period: BillingPeriod,
    ) -> Result<Vec<MonthlyPayment>, SubsplitError>;
}

pub mod in_memory;
