//! Liveness and status HTTP server
//!
//! Runs independently of the engine and only reads its published status.

use crate::engine::EngineStatus;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

struct AppState {
    symbol: String,
    status: watch::Receiver<EngineStatus>,
    metrics: Option<PrometheusHandle>,
}

/// HTTP responder for health checks, readiness, status and metrics
pub struct HealthServer {
    state: Arc<AppState>,
}

impl HealthServer {
    pub fn new(
        symbol: impl Into<String>,
        status: watch::Receiver<EngineStatus>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            state: Arc::new(AppState {
                symbol: symbol.into(),
                status,
                metrics,
            }),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(index))
            .route("/health", get(health))
            .route("/ready", get(ready))
            .route("/status", get(status))
            .route("/metrics", get(metrics))
            .with_state(self.state.clone())
    }

    /// Serve on `addr` until `shutdown` resolves
    pub async fn serve<F>(self, addr: &str, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(addr, "Server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}

async fn index(State(state): State<Arc<AppState>>) -> String {
    format!("Crypto Collector running for {}", state.symbol)
}

async fn health() -> &'static str {
    "OK"
}

async fn ready(State(state): State<Arc<AppState>>) -> Response {
    if state.status.borrow().ready {
        (StatusCode::OK, "READY").into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY").into_response()
    }
}

async fn status(State(state): State<Arc<AppState>>) -> Json<EngineStatus> {
    Json(state.status.borrow().clone())
}

async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics {
        Some(ref handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}
