//! Trackpitch submission API server entry point.

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use trackpitch_api::clients::{HttpCatalogDirectory, HttpPublishSink, HttpTrackDirectory};
use trackpitch_api::routes;
use trackpitch_api::state::AppState;
use trackpitch_core::clock::{Clock, SystemClock};
use trackpitch_core::store::DocumentStore;
use trackpitch_store::PgDocumentStore;
use trackpitch_submission::application::outbox_relay::OutboxRelay;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Trackpitch submission API server");

    // Read configuration from environment.
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| "DATABASE_URL environment variable must be set")?;
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .map_err(|e| format!("PORT must be a valid u16: {e}"))?;
    let track_service_url =
        std::env::var("TRACK_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8081".to_string());
    let catalog_service_url = std::env::var("CATALOG_SERVICE_URL")
        .unwrap_or_else(|_| "http://localhost:8082".to_string());

    // Create database connection pool and apply migrations.
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;

    let store = Arc::new(PgDocumentStore::new(pool));
    let clock = Arc::new(SystemClock);

    // Spawn the outbox relay when a delivery endpoint is configured.
    if let Ok(event_sink_url) = std::env::var("EVENT_SINK_URL") {
        let poll_interval: u64 = std::env::var("OUTBOX_POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map_err(|e| format!("OUTBOX_POLL_INTERVAL_SECS must be a valid u64: {e}"))?;
        let relay_store: Arc<dyn DocumentStore> = store.clone();
        let relay_clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let relay = OutboxRelay::new(
            relay_store,
            Arc::new(HttpPublishSink::new(event_sink_url)),
            relay_clock,
            50,
        );
        tokio::spawn(async move {
            relay.run(Duration::from_secs(poll_interval)).await;
        });
    } else {
        tracing::warn!("EVENT_SINK_URL not set, outbox relay disabled");
    }

    // Build application state.
    let app_state = AppState::new(
        store,
        clock,
        Arc::new(HttpTrackDirectory::new(track_service_url)),
        Arc::new(HttpCatalogDirectory::new(catalog_service_url)),
    );

    // Build router.
    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/submissions", routes::submissions::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server.
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| format!("invalid HOST:PORT combination: {e}"))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
