//! Mock adapters for testing and simulation

use async_trait::async_trait;
use offload_core::{Error, ExecutionAdapter, Result, Venue};
use rand::Rng;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// One scripted adapter outcome
#[derive(Debug)]
pub enum ScriptStep {
    /// Return this text
    Succeed(String),

    /// Fail with an execution error tagged with the adapter's venue
    Fail(String),

    /// Return this error verbatim
    Error(Error),
}

/// Adapter that replays a queue of scripted outcomes.
///
/// Once the script is exhausted every call succeeds with the default output.
#[derive(Debug)]
pub struct ScriptedAdapter {
    venue: Venue,
    steps: Mutex<VecDeque<ScriptStep>>,
    default_output: String,
    latency: Duration,
    calls: AtomicUsize,
}

impl ScriptedAdapter {
    pub fn new(venue: Venue) -> Self {
        Self {
            venue,
            steps: Mutex::new(VecDeque::new()),
            default_output: format!("{} transcription", venue),
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_steps(mut self, steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        self.steps.get_mut().extend(steps);
        self
    }

    pub fn with_default_output(mut self, output: impl Into<String>) -> Self {
        self.default_output = output.into();
        self
    }

    /// Artificial latency added to every call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Append a step to the script
    pub async fn push(&self, step: ScriptStep) {
        self.steps.lock().await.push_back(step);
    }

    /// Number of times the adapter was executed
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of scripted steps not yet consumed
    pub async fn remaining(&self) -> usize {
        self.steps.lock().await.len()
    }
}

#[async_trait]
impl ExecutionAdapter for ScriptedAdapter {
    fn venue(&self) -> Venue {
        self.venue
    }

    async fn execute(&self, payload: &[u8]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().await.pop_front();

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        debug!(venue = %self.venue, size = payload.len(), ?step, "Scripted execution");

        match step {
            None => Ok(self.default_output.clone()),
            Some(ScriptStep::Succeed(text)) => Ok(text),
            Some(ScriptStep::Fail(msg)) => Err(Error::execution(self.venue, msg)),
            Some(ScriptStep::Error(err)) => Err(err),
        }
    }
}

/// Latency model for [`MockAdapter`]
#[derive(Debug, Clone)]
pub struct MockAdapterConfig {
    /// Fixed cost of every call
    pub base_latency: Duration,

    /// Additional cost per KiB of payload
    pub per_kib_latency: Duration,

    /// Probability of a call failing (0.0 to 1.0)
    pub failure_rate: f64,
}

impl Default for MockAdapterConfig {
    fn default() -> Self {
        Self {
            base_latency: Duration::from_millis(10),
            per_kib_latency: Duration::ZERO,
            failure_rate: 0.0,
        }
    }
}

/// Adapter whose latency grows linearly with payload size
#[derive(Debug)]
pub struct MockAdapter {
    venue: Venue,
    config: MockAdapterConfig,
    calls: AtomicUsize,
}

impl MockAdapter {
    pub fn new(venue: Venue, config: MockAdapterConfig) -> Self {
        Self {
            venue,
            config,
            calls: AtomicUsize::new(0),
        }
    }

    /// Modelled latency for a payload of `size` bytes
    pub fn latency_for(&self, size: usize) -> Duration {
        let nanos = self.config.per_kib_latency.as_nanos() * size as u128 / 1024;
        self.config.base_latency + Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExecutionAdapter for MockAdapter {
    fn venue(&self) -> Venue {
        self.venue
    }

    async fn execute(&self, payload: &[u8]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let failure_rate = self.config.failure_rate.clamp(0.0, 1.0);
        let fail = rand::thread_rng().gen_bool(failure_rate);

        tokio::time::sleep(self.latency_for(payload.len())).await;

        if fail {
            return Err(Error::execution(self.venue, "Simulated failure"));
        }

        Ok(format!("{} transcription of {} bytes", self.venue, payload.len()))
    }
}
