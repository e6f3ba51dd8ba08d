use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::errors::SubsplitError;
use crate::core::models::{balance::BalanceEntry, payment::MonthlyPayment, person::Person};

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub phone: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub person: Person,
}

#[derive(Serialize, ToSchema)]
pub struct SettleResponse {
    pub payment: MonthlyPayment,
    pub entry: BalanceEntry,
}

/// Plain string payload: summary text, PIX instruction, PIX key or link.
#[derive(Serialize, ToSchema)]
pub struct TextResponse {
    pub text: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

// Newtype wrapper for SubsplitError to implement IntoResponse
pub struct ApiError(pub SubsplitError);

impl From<SubsplitError> for ApiError {
    fn from(err: SubsplitError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            SubsplitError::PersonNotFound(_)
            | SubsplitError::SubscriptionNotFound(_)
            | SubsplitError::BalanceNotFound(_) => StatusCode::NOT_FOUND,
            SubsplitError::PhoneAlreadyRegistered(_) | SubsplitError::PersonInUse(_) => StatusCode::CONFLICT,
            SubsplitError::InvalidPhone(_)
            | SubsplitError::InvalidInput(..)
            | SubsplitError::MixedSplitModes
            | SubsplitError::PayerInSplits(_)
            | SubsplitError::DuplicateParticipant(_) => StatusCode::BAD_REQUEST,
            SubsplitError::PercentageSumMismatch(_) | SubsplitError::ZeroBalance | SubsplitError::MissingPhone(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            SubsplitError::NotAdmin(_) => StatusCode::FORBIDDEN,
            SubsplitError::InvalidCredentials | SubsplitError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            SubsplitError::QueryFailure(_)
            | SubsplitError::StorageError(_)
            | SubsplitError::LoggingError(_)
            | SubsplitError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {}", self.0);
        }
        (status, Json(ErrorResponse { error: self.0.to_string() })).into_response()
    }
}
