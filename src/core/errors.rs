use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

#[derive(Error, Debug, Serialize)]
pub enum SubsplitError {
    #[error("Person {0} not found")]
    PersonNotFound(String),
    #[error("Subscription {0} not found")]
    SubscriptionNotFound(String),
    #[error("Phone {0} already registered")]
    PhoneAlreadyRegistered(String),
    #[error("Invalid phone: {0}")]
    InvalidPhone(String),
    #[error("Person {0} is not an admin")]
    NotAdmin(String),
    #[error("Person {0} still pays for a subscription")]
    PersonInUse(String),
    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),
    #[error("Percentages must sum to 100, got {0}")]
    PercentageSumMismatch(f64),
    #[error("Either every participant has a percentage or none has")]
    MixedSplitModes,
    #[error("Payer {0} cannot also be a split participant")]
    PayerInSplits(String),
    #[error("Participant {0} appears more than once")]
    DuplicateParticipant(String),
    #[error("Nothing to transfer: balance is zero")]
    ZeroBalance,
    #[error("No phone available for person {0}")]
    MissingPhone(String),
    #[error("No balance with counterparty {0}")]
    BalanceNotFound(String),
    #[error("Failed to load balances: {0}")]
    QueryFailure(String),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Logging error: {0}")]
    LoggingError(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl SubsplitError {
    pub(crate) fn invalid_input(field: &str, title: &str, description: impl Into<String>) -> Self {
        SubsplitError::InvalidInput(
            field.to_string(),
            FieldError {
                field: field.to_string(),
                title: title.to_string(),
                description: description.into(),
            },
        )
    }
}
