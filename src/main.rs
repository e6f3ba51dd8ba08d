use axum::{Router, http::header};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use subsplit::{
    InMemoryLogging, InMemoryStorage, SessionRegistry, SubsplitService,
    api::{
        handlers::{AppState, api_routes},
        openapi::ApiDoc,
    },
    config::CONFIG,
    core::session::{DueTodaySource, local_day_of_month},
    infrastructure::notifications::log_dispatcher::LogDispatcher,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing; `log` records from the library are forwarded too
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&CONFIG.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    info!("Starting with {:?}", *CONFIG);

    let storage = InMemoryStorage::new();
    let logging = InMemoryLogging::new();
    let service = Arc::new(SubsplitService::new(
        storage,
        logging,
        CONFIG.jwt_secret.clone(),
        CONFIG.token_ttl_secs,
    ));

    if let Some((name, phone)) = &CONFIG.seed_admin {
        match service.seed_admin(name, phone).await? {
            Some(admin) => info!("Seeded admin {} ({})", admin.name, admin.id),
            None => info!("Seed admin already registered"),
        }
    }

    let source: Arc<dyn DueTodaySource> = service.clone();
    let sessions = Arc::new(SessionRegistry::new(
        source,
        Arc::new(LogDispatcher),
        Duration::from_secs(CONFIG.notification_interval_secs),
        local_day_of_month(),
    ));

    let state = AppState {
        service,
        sessions: sessions.clone(),
    };

    let app = Router::new()
        .route("/", axum::routing::get(|| async { "OK" }))
        .nest("/api", api_routes(state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CompressionLayer::new()) // Gzip compression
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    http::Method::GET,
                    http::Method::POST,
                    http::Method::PUT,
                    http::Method::DELETE,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], CONFIG.port));
    info!("Server running at http://{}", addr);
    info!("Swagger UI at http://{}/swagger-ui", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    sessions.shutdown().await;
    Ok(())
}
