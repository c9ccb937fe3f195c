//! The single-page web front end.

pub mod handler;
pub mod page;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use log::info;

use crate::classifier::NewsClassifier;

/// Shared state for all handlers.
pub struct AppState {
    pub classifier: Arc<NewsClassifier>,
    pub preview_chars: usize,
}

/// Builds the router for the form page, the JSON API and the health check.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handler::index_handler))
        .route("/classify", post(handler::classify_form_handler))
        .route("/api/classify", post(handler::classify_api_handler))
        .route("/health", get(handler::health_handler))
        .with_state(state)
}

/// Serves the app until Ctrl-C.
pub async fn serve(state: Arc<AppState>, bind: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    info!("  - GET  /              (classifier form)");
    info!("  - POST /api/classify  (JSON)");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
}
