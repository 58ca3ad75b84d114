//! roomcast server entry point.
//!
//! Starts the Axum HTTP server with the REST endpoints and the `/ws`
//! WebSocket endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use roomcast::api;
use roomcast::api::handlers::system::fallback_redirect;
use roomcast::app_state::AppState;
use roomcast::config::ChatConfig;
use roomcast::persistence::PgGateway;
use roomcast::service::ChatRoomEngine;
use roomcast::ws::handler::ws_handler;
use roomcast::ws::hub::ConnectionHub;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = ChatConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting roomcast");

    // Connect to PostgreSQL and apply migrations
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Build the hub, gateway, and engine
    let hub = ConnectionHub::new(config.outbound_buffer);
    let gateway = Arc::new(PgGateway::new(pool));
    let engine = Arc::new(ChatRoomEngine::new(
        Arc::clone(&gateway),
        hub.clone(),
        config.presence_window_minutes,
    ));

    // Build application state
    let app_state = AppState {
        engine,
        hub,
        gateway,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .fallback(fallback_redirect)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
