//! # offload-adapter
//!
//! Venue adapters for edge-offload.
//!
//! This crate provides:
//! - A local adapter driving a pluggable transcription engine
//! - A command-line engine that spools the payload to disk and reads stdout
//! - A remote adapter that POSTs the payload to a cloud transcription service
//! - Scripted and latency-model mock adapters for tests and simulation
//!
//! Every adapter implements [`offload_core::ExecutionAdapter`]; failures are
//! always tagged with the adapter's venue.
//!
//! ## Example
//!
//! ```rust,no_run
//! use offload_adapter::{LocalAdapter, RemoteAdapter};
//! use offload_core::{Config, ExecutionAdapter};
//!
//! # async fn example() -> offload_core::Result<()> {
//! let config = Config::default();
//! let local = LocalAdapter::from_config(&config.local);
//! let remote = RemoteAdapter::new(&config.remote)?;
//!
//! let execution = remote.run(b"RIFF....WAVE").await?;
//! println!("{} took {:?}", execution.venue, execution.elapsed);
//! # let _ = local;
//! # Ok(())
//! # }
//! ```

pub mod local;
pub mod mock;
pub mod remote;

// Re-export main types
pub use local::{CommandTranscriber, LocalAdapter, Transcriber};
pub use mock::{MockAdapter, MockAdapterConfig, ScriptStep, ScriptedAdapter};
pub use remote::RemoteAdapter;
