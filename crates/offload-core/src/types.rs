//! Core type definitions for edge-offload

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Where a unit of work can execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    /// The resource-constrained edge node itself
    Local,
    /// The remote compute service
    Remote,
}

impl Venue {
    /// Both venues, in warm-up execution order
    pub const ALL: [Venue; 2] = [Venue::Local, Venue::Remote];

    /// Label value used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Venue::Local => "local",
            Venue::Remote => "remote",
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One observed (latency, payload size) pair for a venue.
///
/// Samples are immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    latency: f64,
    size: u64,
}

impl Sample {
    /// Create a sample from a latency in seconds and a payload size in bytes.
    /// Negative latencies are clamped to zero.
    pub fn new(latency: f64, size: u64) -> Self {
        Self {
            latency: latency.max(0.0),
            size,
        }
    }

    /// Create a sample from a measured duration
    pub fn from_duration(elapsed: Duration, size: u64) -> Self {
        Self::new(elapsed.as_secs_f64(), size)
    }

    /// Observed latency in seconds
    pub fn latency(&self) -> f64 {
        self.latency
    }

    /// Payload size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Controller phase, derived from history fullness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// At least one venue history is below capacity; both venues execute
    WarmUp,
    /// Both histories are full; exactly one venue executes
    Steady,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::WarmUp => write!(f, "warm-up"),
            Mode::Steady => write!(f, "steady"),
        }
    }
}

/// Result of running one unit of work on a venue
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// Venue that produced the result
    pub venue: Venue,

    /// Textual result of the work
    pub output: String,

    /// Wall-clock time measured around the call
    pub elapsed: Duration,
}
