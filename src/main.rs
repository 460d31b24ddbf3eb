use std::sync::{Arc, Mutex};

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use slotbook::config::AppConfig;
use slotbook::db;
use slotbook::handlers;
use slotbook::services::catalog::StaticCatalog;
use slotbook::services::identity::StaticIdentity;
use slotbook::services::propagation::ChangeHub;
use slotbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db_with_timeout(&config.database_url, config.transaction_timeout)?;
    let catalog = StaticCatalog::load(&config.catalog_path)?;
    let identity = StaticIdentity::load(&config.identity_path)?;
    tracing::info!(
        services = catalog.services.len(),
        addons = catalog.addons.len(),
        "catalog loaded"
    );

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        catalog: Box::new(catalog),
        identity: Box::new(identity),
        hub: ChangeHub::new(config.event_channel_capacity),
    });

    let app = handlers::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
