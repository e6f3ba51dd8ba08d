use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};

use crate::{
    api::models::{ErrorResponse, LoginRequest, LoginResponse, SettleResponse, TextResponse},
    core::{
        models::{
            audit::AppLog,
            balance::{BalanceEntry, BalanceSummary, BreakdownDirection, BreakdownLine},
            notification::DueNotification,
            payment::MonthlyPayment,
            person::Person,
            subscription::{Split, SplitWithParticipant, Subscription, SubscriptionDetails},
        },
        services::{DashboardLoad, PersonInput, SplitInput, SubscriptionInput},
    },
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::login,
        super::handlers::logout,
        super::handlers::me,
        super::handlers::list_people,
        super::handlers::create_person,
        super::handlers::get_person,
        super::handlers::update_person,
        super::handlers::delete_person,
        super::handlers::list_subscriptions,
        super::handlers::create_subscription,
        super::handlers::get_subscription,
        super::handlers::update_subscription,
        super::handlers::delete_subscription,
        super::handlers::get_balances,
        super::handlers::settle_balance,
        super::handlers::balance_summary,
        super::handlers::balance_pix_instruction,
        super::handlers::balance_pix_key,
        super::handlers::balance_whatsapp_link,
        super::handlers::due_today,
        super::handlers::get_app_logs
    ),
    components(schemas(
        LoginRequest,
        LoginResponse,
        SettleResponse,
        TextResponse,
        ErrorResponse,
        PersonInput,
        SplitInput,
        SubscriptionInput,
        DashboardLoad,
        Person,
        Subscription,
        Split,
        SplitWithParticipant,
        SubscriptionDetails,
        BalanceSummary,
        BalanceEntry,
        BreakdownLine,
        BreakdownDirection,
        MonthlyPayment,
        DueNotification,
        AppLog
    )),
    info(
        title = "Subsplit API",
        description = "API for splitting recurring subscriptions and settling monthly balances",
        version = "0.1.0"
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme("Bearer", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
    }
}
