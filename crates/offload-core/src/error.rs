//! Error handling for edge-offload
//!
//! Provides a unified error type and result type for use across all edge-offload components.

use crate::Venue;

/// Result type alias for edge-offload operations
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for edge-offload
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid static configuration, fatal at startup
    #[error("Configuration error: {0}")]
    InvalidConfiguration(String),

    /// The local venue failed to produce a result
    #[error("Local execution error: {0}")]
    LocalExecution(String),

    /// The remote call failed (timeout, transport, status or body)
    #[error("Remote execution error: {0}")]
    RemoteExecution(String),

    /// A prediction was requested before the predictor was fit
    #[error("Predictor for {0} venue is not trained")]
    UntrainedPredictor(Venue),

    /// Inbound transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration parsing errors
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Create a local execution error
    pub fn local_execution(msg: impl Into<String>) -> Self {
        Self::LocalExecution(msg.into())
    }

    /// Create a remote execution error
    pub fn remote_execution(msg: impl Into<String>) -> Self {
        Self::RemoteExecution(msg.into())
    }

    /// Create an execution error tagged with the given venue
    pub fn execution(venue: Venue, msg: impl Into<String>) -> Self {
        match venue {
            Venue::Local => Self::local_execution(msg),
            Venue::Remote => Self::remote_execution(msg),
        }
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Venue an execution error is tagged with
    pub fn venue(&self) -> Option<Venue> {
        match self {
            Error::LocalExecution(_) => Some(Venue::Local),
            Error::RemoteExecution(_) => Some(Venue::Remote),
            Error::UntrainedPredictor(venue) => Some(*venue),
            _ => None,
        }
    }

    /// Check if this error is a per-request venue failure
    pub fn is_execution_failure(&self) -> bool {
        matches!(self, Error::LocalExecution(_) | Error::RemoteExecution(_))
    }

    /// Check if this error must abort startup
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::InvalidConfiguration(_) | Error::Config(_) | Error::Yaml(_)
        )
    }

    /// Get the error category for metrics/logging
    pub fn category(&self) -> &'static str {
        match self {
            Error::InvalidConfiguration(_) => "configuration",
            Error::LocalExecution(_) => "local_execution",
            Error::RemoteExecution(_) => "remote_execution",
            Error::UntrainedPredictor(_) => "untrained_predictor",
            Error::Transport(_) => "transport",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::Yaml(_) => "yaml",
            Error::Config(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::config("invalid endpoint");
        assert!(matches!(err, Error::InvalidConfiguration(_)));
        assert_eq!(err.to_string(), "Configuration error: invalid endpoint");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_execution_errors_are_venue_tagged() {
        let local = Error::execution(Venue::Local, "engine crashed");
        assert!(matches!(local, Error::LocalExecution(_)));
        assert_eq!(local.venue(), Some(Venue::Local));
        assert!(local.is_execution_failure());

        let remote = Error::execution(Venue::Remote, "status 500");
        assert!(matches!(remote, Error::RemoteExecution(_)));
        assert_eq!(remote.venue(), Some(Venue::Remote));
        assert!(!remote.is_fatal());
    }

    #[test]
    fn test_untrained_is_not_an_execution_failure() {
        let err = Error::UntrainedPredictor(Venue::Remote);
        assert!(!err.is_execution_failure());
        assert_eq!(err.category(), "untrained_predictor");
        assert_eq!(err.to_string(), "Predictor for remote venue is not trained");
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(Error::config("test").category(), "configuration");
        assert_eq!(Error::local_execution("test").category(), "local_execution");
        assert_eq!(Error::remote_execution("test").category(), "remote_execution");
        assert_eq!(Error::transport("test").category(), "transport");
    }
}
