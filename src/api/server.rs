//! Router assembly and HTTP listener for the query API.

use super::handlers::{self, AppState, SharedState};
use crate::monitor_core::store::MeasurementStore;
use axum::http::Method;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tower_http::cors::{Any, CorsLayer};

/// Build the fixed path → handler table. Constructed once at startup, so the
/// router's behavior is a pure function of this table and the store.
pub fn build_router(store: MeasurementStore) -> Router {
    let state: SharedState = Arc::new(AppState {
        store: Mutex::new(store),
    });

    // GET-only API, origin unrestricted
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/latest", get(handlers::latest))
        .route("/all", get(handlers::all))
        .route("/minutes", get(handlers::minutes))
        .route("/hours", get(handlers::hours))
        .route("/days", get(handlers::days))
        .fallback(handlers::unsupported)
        .layer(cors)
        .with_state(state)
}

/// Serve the query API until interrupted.
pub async fn run_server(store: MeasurementStore, addr: SocketAddr) -> Result<(), std::io::Error> {
    let app = build_router(store);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("🌐 Query API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("❌ Failed to listen for shutdown signal: {}", e);
        return;
    }
    log::info!("🛑 Interrupt received, closing listener");
}
