use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use domain::services::{Mailer, MeetingProvider, PaymentGateway, RegistrationStore};
use persistence::store::PgStore;

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{health, payments, registrations, webinars};
use crate::services::calendar::GoogleCalendarClient;
use crate::services::email::EmailService;
use crate::services::sumup::SumUpClient;
use crate::services::{PaymentWebhookService, RegistrationService};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub registrations: Arc<RegistrationService>,
    pub webhook: Arc<PaymentWebhookService>,
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    let config = Arc::new(config);

    // Explicitly constructed service objects; the workflow, webhook handler
    // and jobs receive them as injected collaborators.
    let store: Arc<dyn RegistrationStore> = Arc::new(PgStore::new(pool.clone()));
    let return_url = format!("{}/api/payment/return", config.server.base_url);
    let gateway: Arc<dyn PaymentGateway> =
        Arc::new(SumUpClient::new(&config.gateway, return_url));
    let meetings: Arc<dyn MeetingProvider> =
        Arc::new(GoogleCalendarClient::new(config.calendar.clone()));
    let mailer: Arc<dyn Mailer> = Arc::new(EmailService::new(config.email.clone()));

    let registration_service = Arc::new(RegistrationService::new(
        store.clone(),
        gateway.clone(),
        meetings,
        mailer,
        config.company.clone(),
    ));
    let webhook_service = Arc::new(PaymentWebhookService::new(
        store,
        registration_service.clone(),
        config.gateway.webhook_secret.clone(),
    ));

    let state = AppState {
        pool,
        config: config.clone(),
        gateway,
        registrations: registration_service,
        webhook: webhook_service,
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // Production: only allow specified origins
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Registration routes
    let registration_routes = Router::new()
        .route("/api/registrations", post(registrations::create_registration))
        .route(
            "/api/registrations/:id",
            get(registrations::get_registration).delete(registrations::cancel_registration),
        );

    // Webinar management routes
    let webinar_routes = Router::new()
        .route(
            "/api/webinars",
            post(webinars::create_webinar).get(webinars::list_webinars),
        )
        .route(
            "/api/webinars/:id",
            get(webinars::get_webinar)
                .put(webinars::update_webinar)
                .delete(webinars::delete_webinar),
        )
        .route(
            "/api/webinars/:id/registrations",
            get(webinars::get_webinar_registrations),
        );

    // Payment routes. The webhook is unauthenticated but signature-verified.
    let payment_routes = Router::new()
        .route("/api/payment/webhook", post(payments::payment_webhook))
        .route("/api/payment/return", get(payments::payment_return))
        .route("/api/payment/:id/status", get(payments::payment_status))
        .route("/api/payment", get(payments::list_payments));

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    // Merge all routes
    Router::new()
        .merge(public_routes)
        .merge(registration_routes)
        .merge(webinar_routes)
        .merge(payment_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
