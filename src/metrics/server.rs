//! HTTP exporter for flow metrics.
//!
//! Serves `/metrics` in Prometheus text format, `/status` with the latest
//! snapshot as JSON, and `/health` for liveness probes. Only binds to the
//! loopback interface: captured images never pass through here, but the
//! step and counters are still nobody else's business.

use crate::metrics::{MetricsRegistry, MetricsSnapshot};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

const DEFAULT_PORT: u16 = 9090;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind metrics listener: {0}")]
    Bind(#[from] std::io::Error),
    #[error("metrics server failed: {0}")]
    Serve(String),
}

#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    pub bind_addr: SocketAddr,
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self::with_port(DEFAULT_PORT)
    }
}

impl MetricsServerConfig {
    /// Loopback address on `port`. Port 0 lets the OS pick one.
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: (Ipv4Addr::LOCALHOST, port).into(),
        }
    }
}

/// Registry plus the snapshot it was last updated from.
pub struct MetricsState {
    registry: MetricsRegistry,
    latest: MetricsSnapshot,
}

impl MetricsState {
    pub fn update(&mut self, snapshot: &MetricsSnapshot) {
        self.registry.update(snapshot);
        self.latest = snapshot.clone();
    }

    pub fn latest(&self) -> &MetricsSnapshot {
        &self.latest
    }
}

type SharedState = Arc<RwLock<MetricsState>>;

pub struct MetricsServer {
    config: MetricsServerConfig,
    state: SharedState,
}

impl MetricsServer {
    pub fn new(config: MetricsServerConfig, registry: MetricsRegistry) -> Self {
        let state = MetricsState {
            registry,
            latest: MetricsSnapshot::default(),
        };
        Self {
            config,
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Handle the flow driver writes snapshots into.
    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/metrics", get(prometheus_text))
            .route("/status", get(status_json))
            .route("/health", get(|| async { "OK" }))
            .layer(CorsLayer::permissive())
            .with_state(self.state())
    }

    /// Serves until the process exits.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(std::future::pending()).await
    }

    /// Serves until `shutdown` resolves, then drains open connections.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "Metrics exporter listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))
    }
}

async fn prometheus_text(State(state): State<SharedState>) -> Response {
    let state = state.read().await;
    match state.registry.encode() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Metrics encoding failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn status_json(State(state): State<SharedState>) -> Json<MetricsSnapshot> {
    Json(state.read().await.latest().clone())
}
