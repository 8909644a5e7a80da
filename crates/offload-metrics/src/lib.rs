//! # offload-metrics
//!
//! Prometheus observability sink for edge-offload.
//!
//! This crate provides:
//! - Per-venue decision, latency and history-occupancy metrics
//! - An [`offload_core::OffloadObserver`] implementation updating them
//! - A `/metrics` + `/health` HTTP endpoint served with axum

pub mod common;
pub mod prometheus_metrics;

// Re-export commonly used types
pub use common::OffloadMetrics;
pub use prometheus_metrics::PrometheusExporter;

// Error handling
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Registry error: {0}")]
    Registry(#[from] prometheus::Error),

    #[error("Export error: {0}")]
    Export(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] offload_core::Error),
}

pub type Result<T> = std::result::Result<T, MetricsError>;

/// Latency buckets in seconds, spanning fast local runs to slow remote calls
pub const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0,
];
