//! # offload-router
//!
//! TCP ingress and request serialization for edge-offload.
//!
//! This crate provides:
//! - A TCP listener that reads one payload per connection until EOF
//! - A single-writer controller actor serializing every request
//! - Keyword counting on canonical results
//! - Wiring of configuration, adapters, metrics and listener into one service
//!
//! ## Example
//!
//! ```rust,no_run
//! use offload_core::Config;
//! use offload_router::OffloadRouter;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load()?;
//!     let router = OffloadRouter::new(config).await?;
//!
//!     // Serve until Ctrl+C or SIGTERM
//!     router.serve().await?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

pub mod handler;
pub mod router;
pub mod server;

// Re-export main types
pub use handler::{count_keyword, ControllerHandle, RequestHandler};
pub use router::{OffloadRouter, RouterStats};
pub use server::PayloadServer;

/// Result type for router operations
pub type Result<T> = std::result::Result<T, RouterError>;

/// Errors that can occur during router operations
#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Controller unavailable")]
    ControllerUnavailable,

    #[error("Empty payload")]
    EmptyPayload,

    #[error(transparent)]
    Offload(#[from] offload_core::Error),

    #[error("Metrics error: {0}")]
    Metrics(#[from] offload_metrics::MetricsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RouterError {
    /// Check if this error must abort startup
    pub fn is_fatal(&self) -> bool {
        match self {
            RouterError::Configuration(_) => true,
            RouterError::Offload(e) => e.is_fatal(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offload_core::Venue;

    #[test]
    fn test_router_error_fatality() {
        assert!(RouterError::Configuration("test".to_string()).is_fatal());
        assert!(RouterError::Offload(offload_core::Error::config("bad url")).is_fatal());
        assert!(!RouterError::Offload(offload_core::Error::execution(Venue::Remote, "503")).is_fatal());
        assert!(!RouterError::ControllerUnavailable.is_fatal());
    }

    #[test]
    fn test_offload_errors_are_transparent() {
        let err = RouterError::from(offload_core::Error::local_execution("engine crashed"));
        assert_eq!(err.to_string(), "Local execution error: engine crashed");
    }
}
