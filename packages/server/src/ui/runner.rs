//! Server bootstrap: wiring, routing, and the accept loop.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{
    config::ServerConfig,
    infrastructure::{auth::TokenVerifier, registry::inmemory::InMemoryConnectionRegistry},
    ui::{
        handler::{emit_event, get_registry, health_check, websocket_handler},
        signal::shutdown_signal,
        state::AppState,
    },
};

/// Assemble the router with all routes and shared state.
///
/// Split out from [`run`] so integration tests can serve the exact same
/// application on an ephemeral port.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/api/health", get(health_check))
        .route("/api/registry", get(get_registry))
        .route("/api/emit", post(emit_event))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the server until ctrl-c.
pub async fn run(config: ServerConfig) -> std::io::Result<()> {
    let state = Arc::new(AppState {
        registry: Arc::new(InMemoryConnectionRegistry::new()),
        verifier: TokenVerifier::new(&config.jwt_secret),
        heartbeat: config.heartbeat,
    });

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}
