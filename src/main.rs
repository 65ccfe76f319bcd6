use std::sync::{Arc, Mutex};

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use barberbook::config::AppConfig;
use barberbook::db::SqliteStorage;
use barberbook::services::webhook::{HttpTransport, WebhookDispatcher};
use barberbook::state::AppState;
use barberbook::store::BookingStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(
        slot_interval = config.slot_interval_minutes,
        webhook_retries = config.webhook_retries,
        "configuration loaded"
    );
    tracing::info!(hours = %config.opening_hours.to_human_readable(), "opening hours");

    let storage = SqliteStorage::open(&config.database_url)?;
    let store = BookingStore::load(Box::new(storage), &config.webhook_url)?;

    let webhooks = WebhookDispatcher::new(Box::new(HttpTransport::new()))
        .with_retries(config.webhook_retries)
        .with_backoff_base(config.webhook_backoff);

    let state = Arc::new(AppState {
        store: Mutex::new(store),
        config: config.clone(),
        webhooks: Arc::new(webhooks),
    });

    let app = barberbook::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
