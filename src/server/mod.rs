//! HTTP surface for the relay
//!
//! Routes:
//! - `POST /webhook`: Plex webhook receiver (always answers 200)
//! - `GET /health`: liveness check

pub mod health;
pub mod webhook;

use std::future::Future;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::error::Result;
use crate::reload::ConfigStore;
use crate::sonarr::LibraryManager;
use crate::storage::WatchedStore;

/// Plex multipart webhooks carry a thumbnail next to the JSON payload.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Shared state for request handlers
pub struct AppState {
    /// Active policy configuration
    pub config: Arc<ConfigStore>,

    /// Watched-event log
    pub store: WatchedStore,

    /// Remote library manager used for deletions
    pub library: Arc<dyn LibraryManager>,
}

impl AppState {
    pub fn new(
        config: Arc<ConfigStore>,
        store: WatchedStore,
        library: Arc<dyn LibraryManager>,
    ) -> Self {
        Self {
            config,
            store,
            library,
        }
    }
}

/// Build the router with all routes
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook", post(webhook::webhook))
        .route("/health", get(health::health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .with_state(state)
}

/// Serve the router on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
