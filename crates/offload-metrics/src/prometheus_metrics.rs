//! Prometheus metrics exporter implementation

use crate::{MetricsError, OffloadMetrics, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, Registry, TextEncoder};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Prometheus metrics exporter
#[derive(Debug)]
pub struct PrometheusExporter {
    registry: Arc<Registry>,
    metrics: OffloadMetrics,
    bind_addr: SocketAddr,
    local_addr: Option<SocketAddr>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl PrometheusExporter {
    /// Create a new exporter with the offloading metrics registered
    pub fn new(bind_addr: SocketAddr) -> Result<Self> {
        let registry = Arc::new(Registry::new());
        let metrics = OffloadMetrics::new()?;
        metrics.register(&registry)?;

        Ok(Self {
            registry,
            metrics,
            bind_addr,
            local_addr: None,
            server_handle: None,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Offloading metrics, cloneable handles sharing the registered series
    pub fn metrics(&self) -> &OffloadMetrics {
        &self.metrics
    }

    /// Start the HTTP server for the metrics endpoint.
    ///
    /// Returns the bound address, which differs from the configured one when
    /// binding to port 0.
    pub async fn start_server(&mut self) -> Result<SocketAddr> {
        if self.server_handle.is_some() {
            return Err(MetricsError::Config("Server already started".to_string()));
        }

        let app = create_metrics_app(self.registry.clone());
        let listener = TcpListener::bind(self.bind_addr).await?;
        let local_addr = listener.local_addr()?;

        info!("Starting Prometheus metrics server on {}", local_addr);

        let server_handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                warn!("Prometheus metrics server error: {}", e);
            }
        });

        self.local_addr = Some(local_addr);
        self.server_handle = Some(server_handle);
        Ok(local_addr)
    }

    /// Stop the HTTP server
    pub async fn stop_server(&mut self) {
        if let Some(handle) = self.server_handle.take() {
            handle.abort();
            let _ = handle.await;
            info!("Prometheus metrics server stopped");
        }
        self.local_addr = None;
    }

    /// Export metrics as Prometheus text format
    pub fn export_metrics(&self) -> Result<String> {
        encode(&self.registry)
    }

    /// Get metrics endpoint URL
    pub fn metrics_url(&self) -> String {
        format!("http://{}/metrics", self.local_addr.unwrap_or(self.bind_addr))
    }

    /// Check if the server is running
    pub fn is_running(&self) -> bool {
        self.server_handle.is_some()
    }
}

impl Drop for PrometheusExporter {
    fn drop(&mut self) {
        if let Some(handle) = self.server_handle.take() {
            handle.abort();
        }
    }
}

fn encode(registry: &Registry) -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();

    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| MetricsError::Export(format!("Failed to encode metrics: {}", e)))?;

    String::from_utf8(buffer)
        .map_err(|e| MetricsError::Export(format!("Failed to convert metrics to string: {}", e)))
}

/// Create the Axum app for metrics endpoint
fn create_metrics_app(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(registry)
}

/// Handler for /metrics endpoint
async fn metrics_handler(State(registry): State<Arc<Registry>>) -> Response {
    match encode(&registry) {
        Ok(metrics_text) => (
            StatusCode::OK,
            [("content-type", TextEncoder::new().format_type().to_string())],
            metrics_text,
        )
            .into_response(),
        Err(e) => {
            warn!("Failed to encode Prometheus metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response()
        }
    }
}

/// Handler for /health endpoint
async fn health_handler() -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
        .into_response()
}
