use crate::auth::jwt::{Claims, JwtService};
use crate::core::balance::BalanceAggregator;
use crate::core::constants::{
    MAX_AMOUNT, MAX_NAME_LENGTH, PERCENTAGE_TOLERANCE, PERSON_CREATED, PERSON_DELETED, PERSON_UPDATED, PHONE_DIGITS,
    SETTLEMENT_MARKED, SUBSCRIPTION_CREATED, SUBSCRIPTION_DELETED, SUBSCRIPTION_UPDATED, USER_LOGGED_IN,
    USER_LOGGED_OUT,
};
use crate::core::errors::SubsplitError;
use crate::core::formatting::{self, PixReceiver};
use crate::core::models::{
    audit::AppLog,
    balance::{BalanceEntry, BalanceSummary},
    notification::DueNotification,
    payment::MonthlyPayment,
    person::Person,
    subscription::{Split, Subscription, SubscriptionDetails},
};
use crate::core::notifications;
use crate::core::settlement::{self, BillingPeriod};
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::storage::Storage;
use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct PersonInput {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct SplitInput {
    pub participant_id: String,
    /// Share of the total, in percent. Leave every percentage empty for an
    /// even split.
    pub percentage: Option<f64>,
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct SubscriptionInput {
    pub name: String,
    pub total_amount: f64,
    pub billing_day: u32,
    pub payer_id: String,
    pub payer_percentage: Option<f64>,
    #[serde(default)]
    pub splits: Vec<SplitInput>,
}

/// Result of a dashboard load. A failed load carries the empty summary and
/// the reason, never a partial one.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct DashboardLoad {
    pub summary: BalanceSummary,
    pub error: Option<String>,
}

pub struct SubsplitService<L: LoggingService, S: Storage> {
    storage: S,
    logging: L,
    jwt_service: JwtService,
}

impl<L: LoggingService, S: Storage> SubsplitService<L, S> {
    pub fn new(storage: S, logging: L, jwt_secret: String, token_ttl_secs: u64) -> Self {
        info!("Initializing SubsplitService");
        SubsplitService {
            storage,
            logging,
            jwt_service: JwtService::new(jwt_secret, token_ttl_secs),
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, SubsplitError> {
        self.jwt_service.validate_token(token)
    }

    async fn audit(&self, action: &str, details: serde_json::Value, user_id: &str) -> Result<(), SubsplitError> {
        self.logging.record_action(action, details, Some(user_id)).await
    }

    fn require_admin(&self, acting: &Person) -> Result<(), SubsplitError> {
        if !acting.is_admin {
            warn!("Person {} attempted an admin-only operation", acting.id);
            return Err(SubsplitError::NotAdmin(acting.id.clone()));
        }
        Ok(())
    }

    fn validate_name(&self, field: &str, value: &str) -> Result<(), SubsplitError> {
        if value.trim().is_empty() {
            return Err(SubsplitError::invalid_input(
                field,
                &format!("Invalid {}", field),
                format!("{} cannot be empty", field),
            ));
        }
        if value.chars().count() > MAX_NAME_LENGTH {
            return Err(SubsplitError::invalid_input(
                field,
                &format!("{} Too Long", field),
                format!("{} cannot exceed {} characters", field, MAX_NAME_LENGTH),
            ));
        }
        if value.chars().any(|c| c.is_control() || "<>{}[]".contains(c)) {
            return Err(SubsplitError::invalid_input(
                field,
                &format!("Invalid {}", field),
                format!("{} contains invalid characters", field),
            ));
        }
        Ok(())
    }

    fn validate_total_amount(&self, amount: f64) -> Result<(), SubsplitError> {
        if !amount.is_finite() {
            return Err(SubsplitError::invalid_input(
                "total_amount",
                "Invalid Amount",
                "Amount must be a finite number",
            ));
        }
        if amount < 0.0 {
            return Err(SubsplitError::invalid_input(
                "total_amount",
                "Invalid Amount",
                "Amount cannot be negative",
            ));
        }
        if amount > MAX_AMOUNT {
            return Err(SubsplitError::invalid_input(
                "total_amount",
                "Amount Too Large",
                "Amount cannot exceed 1,000,000",
            ));
        }
        let cents = amount * 100.0;
        if (cents.round() - cents).abs() > 1e-6 {
            return Err(SubsplitError::invalid_input(
                "total_amount",
                "Invalid Amount",
                "Amount cannot have more than 2 decimal places",
            ));
        }
        Ok(())
    }

    fn normalize_phone(&self, phone: &str) -> Result<String, SubsplitError> {
        let digits = formatting::digits_only(phone);
        if digits.len() != PHONE_DIGITS {
            warn!("Rejected phone with {} digits", digits.len());
            return Err(SubsplitError::InvalidPhone(phone.to_string()));
        }
        Ok(digits)
    }

    // SESSION

    pub async fn login_by_phone(&self, phone: &str) -> Result<(String, Person), SubsplitError> {
        let digits = self.normalize_phone(phone)?;
        let person = self
            .storage
            .get_person_by_phone(&digits)
            .await?
            .ok_or(SubsplitError::InvalidCredentials)?;
        let token = self.jwt_service.generate_token(&person)?;
        info!("Person {} logged in", person.id);
        self.audit(USER_LOGGED_IN, json!({ "person_id": person.id }), &person.id)
            .await?;
        Ok((token, person))
    }

    pub async fn logout(&self, person: &Person) -> Result<(), SubsplitError> {
        info!("Person {} logged out", person.id);
        self.audit(USER_LOGGED_OUT, json!({ "person_id": person.id }), &person.id)
            .await
    }

    // PEOPLE

    pub async fn get_person(&self, person_id: &str) -> Result<Option<Person>, SubsplitError> {
        self.storage.get_person(person_id).await
    }

    pub async fn list_people(&self) -> Result<Vec<Person>, SubsplitError> {
        self.storage.list_people().await
    }

    pub async fn create_person(&self, input: PersonInput, created_by: &Person) -> Result<Person, SubsplitError> {
        info!("Person {} creating person '{}'", created_by.id, input.name);
        self.require_admin(created_by)?;
        self.validate_name("name", &input.name)?;
        let phone = self.normalize_phone(&input.phone)?;

        let person = Person {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            phone,
            is_admin: input.is_admin,
        };
        let created = self.storage.create_person(person).await?;
        debug!("Person created with ID: {}", created.id);

        self.audit(
            PERSON_CREATED,
            json!({ "person_id": created.id, "name": created.name, "is_admin": created.is_admin }),
            &created_by.id,
        )
        .await?;
        Ok(created)
    }

    /// Bootstraps the first admin; skipped when the phone is already taken.
    pub async fn seed_admin(&self, name: &str, phone: &str) -> Result<Option<Person>, SubsplitError> {
        let phone = self.normalize_phone(phone)?;
        if self.storage.get_person_by_phone(&phone).await?.is_some() {
            debug!("Seed admin already present");
            return Ok(None);
        }
        self.validate_name("name", name)?;
        let person = Person {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            phone,
            is_admin: true,
        };
        let created = self.storage.create_person(person).await?;
        self.audit(
            PERSON_CREATED,
            json!({ "person_id": created.id, "name": created.name, "is_admin": true, "seeded": true }),
            &created.id,
        )
        .await?;
        Ok(Some(created))
    }

    pub async fn update_person(
        &self,
        person_id: &str,
        input: PersonInput,
        updated_by: &Person,
    ) -> Result<Person, SubsplitError> {
        info!("Person {} updating person {}", updated_by.id, person_id);
        self.require_admin(updated_by)?;
        self.validate_name("name", &input.name)?;
        let phone = self.normalize_phone(&input.phone)?;

        let existing = self
            .storage
            .get_person(person_id)
            .await?
            .ok_or_else(|| SubsplitError::PersonNotFound(person_id.to_string()))?;
        let updated = self
            .storage
            .update_person(Person {
                name: input.name.trim().to_string(),
                phone,
                is_admin: input.is_admin,
                ..existing
            })
            .await?;

        self.audit(
            PERSON_UPDATED,
            json!({ "person_id": updated.id, "name": updated.name, "is_admin": updated.is_admin }),
            &updated_by.id,
        )
        .await?;
        Ok(updated)
    }

    pub async fn delete_person(&self, person_id: &str, deleted_by: &Person) -> Result<(), SubsplitError> {
        info!("Person {} deleting person {}", deleted_by.id, person_id);
        self.require_admin(deleted_by)?;
        if self.storage.count_subscriptions_paid_by(person_id).await? > 0 {
            warn!("Person {} still pays for subscriptions", person_id);
            return Err(SubsplitError::PersonInUse(person_id.to_string()));
        }
        self.storage.delete_person(person_id).await?;

        self.audit(PERSON_DELETED, json!({ "person_id": person_id }), &deleted_by.id)
            .await
    }

    // SUBSCRIPTIONS

    pub async fn get_subscription(&self, subscription_id: &str) -> Result<SubscriptionDetails, SubsplitError> {
        self.storage
            .get_subscription_details(subscription_id)
            .await?
            .ok_or_else(|| SubsplitError::SubscriptionNotFound(subscription_id.to_string()))
    }

    pub async fn list_subscriptions(&self) -> Result<Vec<SubscriptionDetails>, SubsplitError> {
        self.storage.list_subscriptions().await
    }

    /// Checks the input and turns it into fresh split rows. Percentages are
    /// converted to custom amounts here; reads never look at them again.
    async fn build_splits(&self, subscription_id: &str, input: &SubscriptionInput) -> Result<Vec<Split>, SubsplitError> {
        self.validate_name("name", &input.name)?;
        self.validate_total_amount(input.total_amount)?;
        if !(1..=31).contains(&input.billing_day) {
            return Err(SubsplitError::invalid_input(
                "billing_day",
                "Invalid Billing Day",
                "Billing day must be between 1 and 31",
            ));
        }
        if self.storage.get_person(&input.payer_id).await?.is_none() {
            return Err(SubsplitError::PersonNotFound(input.payer_id.clone()));
        }

        let mut seen = HashSet::new();
        for split in &input.splits {
            if split.participant_id == input.payer_id {
                warn!("Payer {} listed as split participant", input.payer_id);
                return Err(SubsplitError::PayerInSplits(input.payer_id.clone()));
            }
            if !seen.insert(split.participant_id.as_str()) {
                return Err(SubsplitError::DuplicateParticipant(split.participant_id.clone()));
            }
            if self.storage.get_person(&split.participant_id).await?.is_none() {
                return Err(SubsplitError::PersonNotFound(split.participant_id.clone()));
            }
        }

        let with_percentage = input.splits.iter().filter(|s| s.percentage.is_some()).count();
        let custom_amounts: Vec<Option<f64>> = match input.payer_percentage {
            None if with_percentage == 0 => vec![None; input.splits.len()],
            Some(payer_percentage) if with_percentage == input.splits.len() => {
                let percentages: Vec<f64> = std::iter::once(payer_percentage)
                    .chain(input.splits.iter().filter_map(|s| s.percentage))
                    .collect();
                if percentages.iter().any(|p| !p.is_finite() || *p < 0.0 || *p > 100.0) {
                    return Err(SubsplitError::invalid_input(
                        "percentage",
                        "Invalid Percentage",
                        "Percentages must be between 0 and 100",
                    ));
                }
                let sum: f64 = percentages.iter().sum();
                if (sum - 100.0).abs() > PERCENTAGE_TOLERANCE {
                    warn!("Split percentages sum to {} instead of 100", sum);
                    return Err(SubsplitError::PercentageSumMismatch(sum));
                }
                input
                    .splits
                    .iter()
                    .map(|s| s.percentage.map(|p| input.total_amount * p / 100.0))
                    .collect()
            }
            _ => {
                warn!("Subscription '{}' mixes even and percentage splits", input.name);
                return Err(SubsplitError::MixedSplitModes);
            }
        };

        Ok(input
            .splits
            .iter()
            .zip(custom_amounts)
            .map(|(s, custom_amount)| Split {
                id: Uuid::new_v4().to_string(),
                subscription_id: subscription_id.to_string(),
                participant_id: s.participant_id.clone(),
                custom_amount,
            })
            .collect())
    }

    pub async fn create_subscription(
        &self,
        input: SubscriptionInput,
        created_by: &Person,
    ) -> Result<SubscriptionDetails, SubsplitError> {
        info!(
            "Person {} creating subscription '{}' for amount {}",
            created_by.id, input.name, input.total_amount
        );
        let subscription_id = Uuid::new_v4().to_string();
        let splits = self.build_splits(&subscription_id, &input).await?;

        let subscription = Subscription {
            id: subscription_id.clone(),
            name: input.name.trim().to_string(),
            total_amount: input.total_amount,
            billing_day: input.billing_day,
            payer_id: input.payer_id,
            created_by: created_by.id.clone(),
            created_at: Utc::now(),
        };
        self.storage.save_subscription(subscription.clone()).await?;
        self.storage.replace_splits(&subscription_id, splits).await?;

        self.audit(
            SUBSCRIPTION_CREATED,
            json!({
                "subscription_id": subscription.id,
                "name": subscription.name,
                "total_amount": subscription.total_amount,
                "payer_id": subscription.payer_id
            }),
            &created_by.id,
        )
        .await?;
        self.get_subscription(&subscription_id).await
    }

    /// Updates the subscription's fields and replaces its split set wholesale.
    pub async fn update_subscription(
        &self,
        subscription_id: &str,
        input: SubscriptionInput,
        updated_by: &Person,
    ) -> Result<SubscriptionDetails, SubsplitError> {
        info!("Person {} updating subscription {}", updated_by.id, subscription_id);
        let existing = self
            .storage
            .get_subscription(subscription_id)
            .await?
            .ok_or_else(|| SubsplitError::SubscriptionNotFound(subscription_id.to_string()))?;
        let splits = self.build_splits(subscription_id, &input).await?;

        let subscription = Subscription {
            name: input.name.trim().to_string(),
            total_amount: input.total_amount,
            billing_day: input.billing_day,
            payer_id: input.payer_id,
            ..existing
        };
        self.storage.save_subscription(subscription.clone()).await?;
        self.storage.replace_splits(subscription_id, splits).await?;

        self.audit(
            SUBSCRIPTION_UPDATED,
            json!({
                "subscription_id": subscription.id,
                "name": subscription.name,
                "total_amount": subscription.total_amount,
                "payer_id": subscription.payer_id
            }),
            &updated_by.id,
        )
        .await?;
        self.get_subscription(subscription_id).await
    }

    pub async fn delete_subscription(&self, subscription_id: &str, deleted_by: &Person) -> Result<(), SubsplitError> {
        info!("Person {} deleting subscription {}", deleted_by.id, subscription_id);
        self.storage.delete_subscription(subscription_id).await?;
        self.audit(
            SUBSCRIPTION_DELETED,
            json!({ "subscription_id": subscription_id }),
            &deleted_by.id,
        )
        .await
    }

    // BALANCES

    /// Issues both balance queries and the payment query together and only
    /// aggregates once all of them are back. A failure of either balance
    /// query fails the whole load; a failed payment query only loses the
    /// settled flags.
    pub async fn get_balances(&self, user: &Person, period: BillingPeriod) -> Result<BalanceSummary, SubsplitError> {
        info!("Loading balances for person {} ({}/{})", user.id, period.month, period.year);
        let (participant_splits, payer_subscriptions, payments) = futures::join!(
            self.storage.get_participant_splits(&user.id),
            self.storage.get_payer_subscriptions(&user.id),
            self.storage.get_monthly_payments(&user.id, period),
        );

        let participant_splits = participant_splits.map_err(|e| {
            warn!("Participant split query failed for {}: {}", user.id, e);
            SubsplitError::QueryFailure(e.to_string())
        })?;
        let payer_subscriptions = payer_subscriptions.map_err(|e| {
            warn!("Payer subscription query failed for {}: {}", user.id, e);
            SubsplitError::QueryFailure(e.to_string())
        })?;
        let payments = payments.unwrap_or_else(|e| {
            warn!("Monthly payment query failed for {}: {}", user.id, e);
            Vec::new()
        });

        let mut aggregator = BalanceAggregator::new(&user.id);
        aggregator
            .add_participant_splits(&participant_splits)
            .add_payer_subscriptions(&payer_subscriptions);
        let mut summary = aggregator.finish();
        settlement::annotate_settled(&mut summary, &payments);
        Ok(summary)
    }

    pub async fn load_dashboard(&self, user: &Person, period: BillingPeriod) -> DashboardLoad {
        match self.get_balances(user, period).await {
            Ok(summary) => DashboardLoad { summary, error: None },
            Err(e) => DashboardLoad {
                summary: BalanceSummary::default(),
                error: Some(e.to_string()),
            },
        }
    }

    pub async fn get_balance_entry(
        &self,
        user: &Person,
        counterparty_id: &str,
        period: BillingPeriod,
    ) -> Result<BalanceEntry, SubsplitError> {
        self.get_balances(user, period)
            .await?
            .entry(counterparty_id)
            .cloned()
            .ok_or_else(|| SubsplitError::BalanceNotFound(counterparty_id.to_string()))
    }

    // SETTLEMENT

    /// Records that `counterparty_id` settled `net_amount` with `user` this
    /// period. A second call in the same period keeps the first record.
    pub async fn mark_settled(
        &self,
        user: &Person,
        counterparty_id: &str,
        net_amount: f64,
        period: BillingPeriod,
    ) -> Result<MonthlyPayment, SubsplitError> {
        info!(
            "Person {} marking balance with {} as settled for {}/{}",
            user.id, counterparty_id, period.month, period.year
        );
        let amount_paid = settlement::settleable_amount(net_amount)?;

        let payment = self
            .storage
            .insert_monthly_payment(MonthlyPayment {
                id: Uuid::new_v4().to_string(),
                receiver_id: user.id.clone(),
                counterparty_id: counterparty_id.to_string(),
                month: period.month,
                year: period.year,
                amount_paid,
                created_at: Utc::now(),
            })
            .await?;
        debug!("Monthly payment {} stored", payment.id);

        self.audit(
            SETTLEMENT_MARKED,
            json!({
                "payment_id": payment.id,
                "counterparty_id": counterparty_id,
                "month": period.month,
                "year": period.year,
                "amount_paid": payment.amount_paid
            }),
            &user.id,
        )
        .await?;
        Ok(payment)
    }

    /// Settles one entry of an already loaded summary and flips its flag in
    /// place.
    pub async fn settle_entry(
        &self,
        user: &Person,
        summary: &mut BalanceSummary,
        counterparty_id: &str,
        period: BillingPeriod,
    ) -> Result<MonthlyPayment, SubsplitError> {
        // Entries netting to zero were dropped by the aggregator.
        let net_amount = summary.entry(counterparty_id).map_or(0.0, |e| e.net_amount);
        let payment = self.mark_settled(user, counterparty_id, net_amount, period).await?;
        settlement::mark_entry_settled(summary, counterparty_id);
        Ok(payment)
    }

    // SUMMARY & PIX

    pub fn build_summary_text(&self, user: &Person, entry: &BalanceEntry) -> String {
        formatting::build_summary_text(entry, user)
    }

    /// Phone of whoever receives the transfer settling `entry`, looked up
    /// again when the loaded person carries none.
    async fn receiver_phone(&self, user: &Person, entry: &BalanceEntry) -> Result<String, SubsplitError> {
        let receiver = match PixReceiver::for_entry(entry)? {
            PixReceiver::CurrentUser => user,
            PixReceiver::Counterparty => &entry.counterparty,
        };
        if !formatting::digits_only(&receiver.phone).is_empty() {
            return Ok(receiver.phone.clone());
        }

        debug!("No phone loaded for {}, looking it up", receiver.id);
        let phone = match self.storage.get_person(&receiver.id).await {
            Ok(found) => found.map(|p| p.phone).unwrap_or_default(),
            Err(e) => {
                warn!("Phone lookup for {} failed: {}", receiver.id, e);
                String::new()
            }
        };
        if formatting::digits_only(&phone).is_empty() {
            warn!("No phone available for {}", receiver.id);
            return Err(SubsplitError::MissingPhone(receiver.id.clone()));
        }
        Ok(phone)
    }

    pub async fn build_pix_instruction(&self, user: &Person, entry: &BalanceEntry) -> Result<String, SubsplitError> {
        let phone = self.receiver_phone(user, entry).await?;
        Ok(formatting::pix_instruction(entry.net_amount, &phone))
    }

    pub async fn resolve_pix_key(&self, user: &Person, entry: &BalanceEntry) -> Result<String, SubsplitError> {
        let phone = self.receiver_phone(user, entry).await?;
        Ok(formatting::derive_pix_key(&phone))
    }

    pub async fn build_whatsapp_link(&self, user: &Person, entry: &BalanceEntry) -> Result<String, SubsplitError> {
        let instruction = self.build_pix_instruction(user, entry).await?;
        formatting::whatsapp_link(&instruction)
    }

    // NOTIFICATIONS

    pub async fn list_due_today(&self, user_id: &str, day: u32) -> Result<Vec<DueNotification>, SubsplitError> {
        let billed = self.storage.get_subscriptions_billed_on(day).await?;
        let due = notifications::due_today(user_id, day, &billed);
        debug!("{} notifications due on day {} for {}", due.len(), day, user_id);
        Ok(due)
    }

    // AUDIT

    pub async fn get_app_logs(&self, requested_by: &Person) -> Result<Vec<AppLog>, SubsplitError> {
        self.require_admin(requested_by)?;
        self.logging.get_logs().await
    }
}
