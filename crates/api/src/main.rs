use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use domain::services::{Mailer, RegistrationStore};
use webinar_api::jobs::pool_metrics::PoolMetricsJob;
use webinar_api::jobs::reminder::ReminderJob;
use webinar_api::jobs::scheduler::JobScheduler;
use webinar_api::services::email::EmailService;
use webinar_api::{app, config, middleware};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = config::Config::load()?;

    // Initialize logging and metrics
    middleware::logging::init_logging(&config.logging);
    middleware::init_metrics();

    info!("Starting Webinar Backend v{}", env!("CARGO_PKG_VERSION"));

    // Create database pool
    let pool = persistence::db::create_pool(&config.database.to_pool_config()).await?;

    // Run migrations
    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    // Background jobs: the daily reminder sweep and pool metrics
    let store: Arc<dyn RegistrationStore> =
        Arc::new(persistence::store::PgStore::new(pool.clone()));
    let mailer: Arc<dyn Mailer> = Arc::new(EmailService::new(config.email.clone()));

    let mut scheduler = JobScheduler::new();
    scheduler.register(ReminderJob::new(
        store,
        mailer,
        config.company.name.clone(),
        &config.reminder,
    ));
    scheduler.register(PoolMetricsJob::new(pool.clone()));
    scheduler.start();

    // Build application
    let app = app::create_app(config.clone(), pool);

    // Start server
    let addr = config.socket_addr();
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(30)).await;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
    info!("Shutdown signal received");
}
