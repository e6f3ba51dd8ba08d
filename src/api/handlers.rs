use crate::{
    api::models::*,
    auth::jwt::Claims,
    core::{
        errors::SubsplitError,
        models::{
            audit::AppLog,
            balance::BalanceEntry,
            notification::DueNotification,
            person::Person,
            subscription::SubscriptionDetails,
        },
        services::{DashboardLoad, PersonInput, SubscriptionInput, SubsplitService},
        session::SessionRegistry,
        settlement::BillingPeriod,
    },
    infrastructure::{logging::in_memory::InMemoryLogging, storage::in_memory::InMemoryStorage},
};
use axum::{
    Extension, Json, Router,
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Datelike;
use http::header;
use std::sync::Arc;

pub type Service = SubsplitService<InMemoryLogging, InMemoryStorage>;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<Service>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// Phone login that also starts the person's due-bill watcher.
    pub async fn login(&self, phone: &str) -> Result<(String, Person), SubsplitError> {
        let (token, person) = self.service.login_by_phone(phone).await?;
        self.sessions.start_session(&person.id).await;
        Ok((token, person))
    }

    pub async fn logout(&self, person: &Person) -> Result<(), SubsplitError> {
        self.sessions.end_session(&person.id).await;
        self.service.logout(person).await
    }
}

// Middleware to validate the session token
async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| SubsplitError::InvalidToken("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| SubsplitError::InvalidToken("Invalid Authorization header".to_string()))?;

    let claims = state.service.validate_token(token)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

async fn current_person(state: &AppState, claims: &Claims) -> Result<Person, ApiError> {
    // A token can outlive its person.
    let person = state
        .service
        .get_person(&claims.sub)
        .await?
        .ok_or_else(|| SubsplitError::InvalidToken(format!("Unknown person {}", claims.sub)))?;
    Ok(person)
}

async fn current_entry(state: &AppState, claims: &Claims, counterparty_id: &str) -> Result<(Person, BalanceEntry), ApiError> {
    let user = current_person(state, claims).await?;
    let entry = state
        .service
        .get_balance_entry(&user, counterparty_id, BillingPeriod::current())
        .await?;
    Ok((user, entry))
}

pub fn api_routes(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/people", get(list_people).post(create_person))
        .route(
            "/people/{person_id}",
            get(get_person).put(update_person).delete(delete_person),
        )
        .route("/subscriptions", get(list_subscriptions).post(create_subscription))
        .route(
            "/subscriptions/{subscription_id}",
            get(get_subscription)
                .put(update_subscription)
                .delete(delete_subscription),
        )
        .route("/balances", get(get_balances))
        .route("/balances/{counterparty_id}/settle", post(settle_balance))
        .route("/balances/{counterparty_id}/summary", get(balance_summary))
        .route("/balances/{counterparty_id}/pix", get(balance_pix_instruction))
        .route("/balances/{counterparty_id}/pix-key", get(balance_pix_key))
        .route("/balances/{counterparty_id}/whatsapp", get(balance_whatsapp_link))
        .route("/notifications/due-today", get(due_today))
        .route("/logs", get(get_app_logs))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/login", post(login)) // Unprotected
        .merge(protected_routes)
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Malformed phone", body = ErrorResponse),
        (status = 401, description = "Unknown phone", body = ErrorResponse)
    )
)]
pub async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Result<Json<LoginResponse>, ApiError> {
    let (token, person) = state.login(&req.phone).await?;
    Ok(Json(LoginResponse { token, person }))
}

#[utoipa::path(
    post,
    path = "/api/logout",
    responses(
        (status = 204, description = "Session ended"),
        (status = 401, description = "Invalid token", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn logout(State(state): State<AppState>, Extension(claims): Extension<Claims>) -> Result<StatusCode, ApiError> {
    let person = current_person(&state, &claims).await?;
    state.logout(&person).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Logged-in person", body = Person),
        (status = 401, description = "Invalid token", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn me(State(state): State<AppState>, Extension(claims): Extension<Claims>) -> Result<Json<Person>, ApiError> {
    Ok(Json(current_person(&state, &claims).await?))
}

#[utoipa::path(
    get,
    path = "/api/people",
    responses(
        (status = 200, description = "Everyone, ordered by name", body = Vec<Person>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn list_people(State(state): State<AppState>) -> Result<Json<Vec<Person>>, ApiError> {
    Ok(Json(state.service.list_people().await?))
}

#[utoipa::path(
    post,
    path = "/api/people",
    request_body = PersonInput,
    responses(
        (status = 201, description = "Person created", body = Person),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 409, description = "Phone already registered", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn create_person(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PersonInput>,
) -> Result<(StatusCode, Json<Person>), ApiError> {
    let acting = current_person(&state, &claims).await?;
    let person = state.service.create_person(req, &acting).await?;
    Ok((StatusCode::CREATED, Json(person)))
}

#[utoipa::path(
    get,
    path = "/api/people/{person_id}",
    params(("person_id" = String, Path, description = "ID of the person")),
    responses(
        (status = 200, description = "Person found", body = Person),
        (status = 404, description = "Person not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_person(State(state): State<AppState>, Path(person_id): Path<String>) -> Result<Json<Person>, ApiError> {
    let person = state
        .service
        .get_person(&person_id)
        .await?
        .ok_or(SubsplitError::PersonNotFound(person_id))?;
    Ok(Json(person))
}

#[utoipa::path(
    put,
    path = "/api/people/{person_id}",
    request_body = PersonInput,
    params(("person_id" = String, Path, description = "ID of the person")),
    responses(
        (status = 200, description = "Person updated", body = Person),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Person not found", body = ErrorResponse),
        (status = 409, description = "Phone already registered", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn update_person(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(person_id): Path<String>,
    Json(req): Json<PersonInput>,
) -> Result<Json<Person>, ApiError> {
    let acting = current_person(&state, &claims).await?;
    Ok(Json(state.service.update_person(&person_id, req, &acting).await?))
}

#[utoipa::path(
    delete,
    path = "/api/people/{person_id}",
    params(("person_id" = String, Path, description = "ID of the person")),
    responses(
        (status = 204, description = "Person deleted"),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Person not found", body = ErrorResponse),
        (status = 409, description = "Person still pays for a subscription", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn delete_person(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(person_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let acting = current_person(&state, &claims).await?;
    state.service.delete_person(&person_id, &acting).await?;
    state.sessions.end_session(&person_id).await;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/subscriptions",
    responses(
        (status = 200, description = "Subscriptions, newest first", body = Vec<SubscriptionDetails>)
    ),
    security(("Bearer" = []))
)]
pub async fn list_subscriptions(State(state): State<AppState>) -> Result<Json<Vec<SubscriptionDetails>>, ApiError> {
    Ok(Json(state.service.list_subscriptions().await?))
}

#[utoipa::path(
    post,
    path = "/api/subscriptions",
    request_body = SubscriptionInput,
    responses(
        (status = 201, description = "Subscription created", body = SubscriptionDetails),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 404, description = "Payer or participant not found", body = ErrorResponse),
        (status = 422, description = "Percentages do not sum to 100", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn create_subscription(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubscriptionInput>,
) -> Result<(StatusCode, Json<SubscriptionDetails>), ApiError> {
    let acting = current_person(&state, &claims).await?;
    let details = state.service.create_subscription(req, &acting).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

#[utoipa::path(
    get,
    path = "/api/subscriptions/{subscription_id}",
    params(("subscription_id" = String, Path, description = "ID of the subscription")),
    responses(
        (status = 200, description = "Subscription found", body = SubscriptionDetails),
        (status = 404, description = "Subscription not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_subscription(
    State(state): State<AppState>,
    Path(subscription_id): Path<String>,
) -> Result<Json<SubscriptionDetails>, ApiError> {
    Ok(Json(state.service.get_subscription(&subscription_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/subscriptions/{subscription_id}",
    request_body = SubscriptionInput,
    params(("subscription_id" = String, Path, description = "ID of the subscription")),
    responses(
        (status = 200, description = "Subscription updated, splits replaced", body = SubscriptionDetails),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 404, description = "Subscription, payer or participant not found", body = ErrorResponse),
        (status = 422, description = "Percentages do not sum to 100", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn update_subscription(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(subscription_id): Path<String>,
    Json(req): Json<SubscriptionInput>,
) -> Result<Json<SubscriptionDetails>, ApiError> {
    let acting = current_person(&state, &claims).await?;
    Ok(Json(
        state
            .service
            .update_subscription(&subscription_id, req, &acting)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/subscriptions/{subscription_id}",
    params(("subscription_id" = String, Path, description = "ID of the subscription")),
    responses(
        (status = 204, description = "Subscription and its splits deleted"),
        (status = 404, description = "Subscription not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn delete_subscription(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(subscription_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let acting = current_person(&state, &claims).await?;
    state.service.delete_subscription(&subscription_id, &acting).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/balances",
    responses(
        (status = 200, description = "Balances of the logged-in person; `error` is set when loading failed", body = DashboardLoad)
    ),
    security(("Bearer" = []))
)]
pub async fn get_balances(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<DashboardLoad>, ApiError> {
    let user = current_person(&state, &claims).await?;
    Ok(Json(state.service.load_dashboard(&user, BillingPeriod::current()).await))
}

#[utoipa::path(
    post,
    path = "/api/balances/{counterparty_id}/settle",
    params(("counterparty_id" = String, Path, description = "ID of the counterparty")),
    responses(
        (status = 200, description = "Balance marked as settled this month", body = SettleResponse),
        (status = 422, description = "Balance with that counterparty is zero", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn settle_balance(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(counterparty_id): Path<String>,
) -> Result<Json<SettleResponse>, ApiError> {
    let user = current_person(&state, &claims).await?;
    let period = BillingPeriod::current();
    let mut summary = state.service.get_balances(&user, period).await?;
    let payment = state
        .service
        .settle_entry(&user, &mut summary, &counterparty_id, period)
        .await?;
    let entry = summary
        .entry(&counterparty_id)
        .cloned()
        .ok_or(SubsplitError::BalanceNotFound(counterparty_id))?;
    Ok(Json(SettleResponse { payment, entry }))
}

#[utoipa::path(
    get,
    path = "/api/balances/{counterparty_id}/summary",
    params(("counterparty_id" = String, Path, description = "ID of the counterparty")),
    responses(
        (status = 200, description = "Plain-text summary", body = TextResponse),
        (status = 404, description = "No balance with that counterparty", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn balance_summary(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(counterparty_id): Path<String>,
) -> Result<Json<TextResponse>, ApiError> {
    let (user, entry) = current_entry(&state, &claims, &counterparty_id).await?;
    let text = state.service.build_summary_text(&user, &entry);
    Ok(Json(TextResponse { text }))
}

#[utoipa::path(
    get,
    path = "/api/balances/{counterparty_id}/pix",
    params(("counterparty_id" = String, Path, description = "ID of the counterparty")),
    responses(
        (status = 200, description = "PIX transfer instruction", body = TextResponse),
        (status = 404, description = "No balance with that counterparty", body = ErrorResponse),
        (status = 422, description = "Zero balance or no receiver phone", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn balance_pix_instruction(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(counterparty_id): Path<String>,
) -> Result<Json<TextResponse>, ApiError> {
    let (user, entry) = current_entry(&state, &claims, &counterparty_id).await?;
    let text = state.service.build_pix_instruction(&user, &entry).await?;
    Ok(Json(TextResponse { text }))
}

#[utoipa::path(
    get,
    path = "/api/balances/{counterparty_id}/pix-key",
    params(("counterparty_id" = String, Path, description = "ID of the counterparty")),
    responses(
        (status = 200, description = "PIX key of the receiving party", body = TextResponse),
        (status = 404, description = "No balance with that counterparty", body = ErrorResponse),
        (status = 422, description = "Zero balance or no receiver phone", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn balance_pix_key(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(counterparty_id): Path<String>,
) -> Result<Json<TextResponse>, ApiError> {
    let (user, entry) = current_entry(&state, &claims, &counterparty_id).await?;
    let text = state.service.resolve_pix_key(&user, &entry).await?;
    Ok(Json(TextResponse { text }))
}

#[utoipa::path(
    get,
    path = "/api/balances/{counterparty_id}/whatsapp",
    params(("counterparty_id" = String, Path, description = "ID of the counterparty")),
    responses(
        (status = 200, description = "Link sending the PIX instruction to the bank bot", body = TextResponse),
        (status = 404, description = "No balance with that counterparty", body = ErrorResponse),
        (status = 422, description = "Zero balance or no receiver phone", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn balance_whatsapp_link(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(counterparty_id): Path<String>,
) -> Result<Json<TextResponse>, ApiError> {
    let (user, entry) = current_entry(&state, &claims, &counterparty_id).await?;
    let text = state.service.build_whatsapp_link(&user, &entry).await?;
    Ok(Json(TextResponse { text }))
}

#[utoipa::path(
    get,
    path = "/api/notifications/due-today",
    responses(
        (status = 200, description = "Reminders for subscriptions billed today", body = Vec<DueNotification>)
    ),
    security(("Bearer" = []))
)]
pub async fn due_today(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<DueNotification>>, ApiError> {
    let user = current_person(&state, &claims).await?;
    let day = chrono::Local::now().day();
    Ok(Json(state.service.list_due_today(&user.id, day).await?))
}

#[utoipa::path(
    get,
    path = "/api/logs",
    responses(
        (status = 200, description = "Audit trail", body = Vec<AppLog>),
        (status = 403, description = "Not an admin", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_app_logs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<AppLog>>, ApiError> {
    let acting = current_person(&state, &claims).await?;
    Ok(Json(state.service.get_app_logs(&acting).await?))
}
