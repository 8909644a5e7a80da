//! # offload-core
//!
//! Core types, traits, and utilities for edge-offload - a predictive
//! local/remote offloading controller for resource-constrained edge nodes.
//!
//! This crate provides the foundational data structures and interfaces that are
//! shared across all other edge-offload components. It includes:
//!
//! - Venue and sample types recorded by the controller
//! - Traits for execution adapters and observability sinks
//! - Configuration schema and parsing utilities
//! - Error handling types and utilities

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types at the crate root
pub use config::{
    Config, ControllerConfig, ListenerConfig, LocalConfig, LogConfig, MetricsConfig, RemoteConfig,
};
pub use error::{Error, Result};
pub use traits::{ExecutionAdapter, NoopObserver, OffloadObserver};
pub use types::{Execution, Mode, Sample, Venue};
