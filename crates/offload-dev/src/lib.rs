//! # offload-dev
//!
//! Development and testing utilities for edge-offload.
//!
//! This crate provides:
//! - An audio-file simulator that streams `.wav` payloads to an edge node
//! - A mock cloud transcription service speaking the remote offload protocol
//! - Test logging and WAV fixture helpers

pub mod mock_remote;
pub mod simulator;
pub mod utils;

// Re-export commonly used types
pub use mock_remote::MockRemoteService;
pub use simulator::{AudioSimulator, SimulatorConfig, SimulatorStats};
pub use utils::{generate_wav, setup_test_logging};

// Error handling
#[derive(Debug, thiserror::Error)]
pub enum DevError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Mock service error: {0}")]
    MockService(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Core error: {0}")]
    Core(#[from] offload_core::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DevError>;
