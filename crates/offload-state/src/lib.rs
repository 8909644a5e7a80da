//! # offload-state
//!
//! Per-venue state and offloading intelligence for edge-offload.
//!
//! This crate provides:
//! - A bounded FIFO execution history per venue
//! - An online simple-linear-regression latency predictor per venue
//! - The warm-up / steady-state offloading controller that owns both
//!
//! ## Example
//!
//! ```rust,no_run
//! use offload_core::{ControllerConfig, NoopObserver};
//! use offload_state::OffloadingController;
//! # use offload_core::{ExecutionAdapter, Venue};
//! # use std::sync::Arc;
//! # async fn example(
//! #     local: Arc<dyn ExecutionAdapter>,
//! #     remote: Arc<dyn ExecutionAdapter>,
//! # ) -> offload_core::Result<()> {
//! let mut controller = OffloadingController::new(
//!     &ControllerConfig::default(),
//!     local,
//!     remote,
//!     Arc::new(NoopObserver),
//! )?;
//!
//! let outcome = controller.handle(b"RIFF....WAVE").await?;
//! println!("{} answered in {:?}", outcome.venue, outcome.latency);
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod history;
pub mod predictor;

// Re-export commonly used types
pub use controller::{
    choose_venue, ControllerSnapshot, Decision, OffloadingController, Outcome, VenueSnapshot,
};
pub use history::SampleHistory;
pub use predictor::LatencyPredictor;
pub use offload_core::{Error, Result};
