//! Core traits for edge-offload components
//!
//! These traits define the seams between the offloading controller and the
//! collaborators it drives: the venue adapters and the observability sink.

use crate::{Execution, Result, Venue};
use async_trait::async_trait;
use std::time::{Duration, Instant};

/// Executes one unit of work on a venue
#[async_trait]
pub trait ExecutionAdapter: Send + Sync {
    /// The venue this adapter executes on
    fn venue(&self) -> Venue;

    /// Perform the work and return its textual result.
    ///
    /// Failures must be tagged with this adapter's venue
    /// (`Error::LocalExecution` or `Error::RemoteExecution`).
    async fn execute(&self, payload: &[u8]) -> Result<String>;

    /// Execute and measure wall-clock elapsed time around the call.
    ///
    /// Timing is taken on the caller's clock so both venues are comparable.
    async fn run(&self, payload: &[u8]) -> Result<Execution> {
        let start = Instant::now();
        let output = self.execute(payload).await?;
        Ok(Execution {
            venue: self.venue(),
            output,
            elapsed: start.elapsed(),
        })
    }
}

/// Receives decision counts, latency observations and history occupancy.
///
/// Only successful records are reported; a failed execution reports nothing.
pub trait OffloadObserver: Send + Sync {
    /// Called synchronously after a sample was recorded for `venue`
    fn observe_record(&self, venue: Venue, latency: Duration, history_len: usize);
}

/// Observer that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl OffloadObserver for NoopObserver {
    fn observe_record(&self, _venue: Venue, _latency: Duration, _history_len: usize) {}
}
