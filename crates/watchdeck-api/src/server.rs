//! API server: router assembly, collector auth, and lifecycle.

use crate::handlers;
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::time::Instant;
use tokio::sync::watch;
use tracing::info;
use watchdeck_core::ServerConfig;

/// Create the Axum router for all Watchdeck endpoints.
///
/// Only `POST /snapshot` sits behind the collector secret; queries, health,
/// and metrics are open.
pub fn create_router(state: AppState) -> Router {
    // Routes added after the layer call are not behind the secret.
    Router::new()
        .route("/snapshot", post(handlers::ingest_snapshot))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_collector_secret,
        ))
        .route("/snapshot", get(handlers::query_snapshots))
        .route("/health", get(handlers::health_check))
        .route("/health/status", get(handlers::health_status))
        .route("/metrics", get(handlers::metrics_endpoint))
        .with_state(state)
}

/// Reject ingest calls without the configured bearer secret.
///
/// No configured secret closes the endpoint entirely rather than opening it.
async fn require_collector_secret(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();

    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    if !authorized(header_value, state.secret()) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<serde_json::Value>::offline(
                "Unauthorized",
                started,
            )),
        )
            .into_response();
    }

    next.run(request).await
}

fn authorized(header_value: Option<&str>, secret: Option<&str>) -> bool {
    match secret {
        Some(secret) => header_value == Some(format!("Bearer {secret}").as_str()),
        None => false,
    }
}

/// HTTP API server
pub struct ApiServer {
    bind_address: String,
    state: AppState,
    shutdown_rx: watch::Receiver<bool>,
}

impl ApiServer {
    pub fn new(config: &ServerConfig, state: AppState, shutdown_rx: watch::Receiver<bool>) -> Self {
        Self {
            bind_address: config.bind_address(),
            state,
            shutdown_rx,
        }
    }

    /// Start the server and block until shutdown.
    pub async fn run(self) -> Result<(), std::io::Error> {
        let app = create_router(self.state);
        let addr: std::net::SocketAddr = self
            .bind_address
            .parse()
            .expect("Invalid bind address for API server");

        info!(address = %addr, "Starting API server");

        let listener = tokio::net::TcpListener::bind(addr).await?;

        let mut shutdown_rx = self.shutdown_rx;
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
                info!("API server shutting down");
            })
            .await
    }

    /// Start the server in a background task.
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<(), std::io::Error>> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorized_requires_exact_bearer_match() {
        assert!(authorized(Some("Bearer s3cret"), Some("s3cret")));
        assert!(!authorized(Some("Bearer wrong"), Some("s3cret")));
        assert!(!authorized(Some("s3cret"), Some("s3cret")));
        assert!(!authorized(None, Some("s3cret")));
    }

    #[test]
    fn test_unconfigured_secret_rejects_everything() {
        assert!(!authorized(Some("Bearer anything"), None));
        assert!(!authorized(None, None));
    }
}
