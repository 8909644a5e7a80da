//! Request handling and controller serialization
//!
//! The offloading controller has exactly one owner: a dedicated task that
//! receives commands over a channel. Connection tasks stay concurrent, but
//! fit-predict-decide-record for one request never interleaves with another.

use crate::{Result, RouterError};

use offload_metrics::OffloadMetrics;
use offload_state::{ControllerSnapshot, OffloadingController, Outcome};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Default depth of the controller command queue
pub const DEFAULT_QUEUE_DEPTH: usize = 64;

enum Command {
    Handle {
        payload: Vec<u8>,
        reply: oneshot::Sender<offload_core::Result<Outcome>>,
    },
    Snapshot {
        reply: oneshot::Sender<ControllerSnapshot>,
    },
}

/// Cloneable handle to the task owning the offloading controller
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    commands: mpsc::Sender<Command>,
}

impl ControllerHandle {
    /// Move the controller into its own task and return a handle to it.
    ///
    /// The task exits once every handle has been dropped.
    pub fn spawn(controller: OffloadingController, queue_depth: usize) -> (Self, JoinHandle<()>) {
        let (commands, receiver) = mpsc::channel(queue_depth.max(1));
        let task = tokio::spawn(run_controller(controller, receiver));
        (Self { commands }, task)
    }

    /// Handle one payload on the controller task
    pub async fn handle(&self, payload: Vec<u8>) -> Result<Outcome> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Handle { payload, reply })
            .await
            .map_err(|_| RouterError::ControllerUnavailable)?;

        let outcome = response
            .await
            .map_err(|_| RouterError::ControllerUnavailable)??;
        Ok(outcome)
    }

    /// Consistent view of the controller between two requests
    pub async fn snapshot(&self) -> Result<ControllerSnapshot> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Snapshot { reply })
            .await
            .map_err(|_| RouterError::ControllerUnavailable)?;

        response.await.map_err(|_| RouterError::ControllerUnavailable)
    }
}

async fn run_controller(mut controller: OffloadingController, mut commands: mpsc::Receiver<Command>) {
    info!("Controller task started");

    while let Some(command) = commands.recv().await {
        match command {
            Command::Handle { payload, reply } => {
                let result = controller.handle(&payload).await;
                if reply.send(result).is_err() {
                    debug!("Requester went away before the result was delivered");
                }
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(controller.snapshot());
            }
        }
    }

    info!("Controller task stopped after {} requests", controller.requests());
}

/// Count case-insensitive whole-word occurrences of `keyword` in `text`
pub fn count_keyword(text: &str, keyword: &str) -> u64 {
    let keyword = keyword.trim().to_lowercase();
    if keyword.is_empty() {
        return 0;
    }

    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|word| word.to_lowercase() == keyword)
        .count() as u64
}

/// Turns payloads into canonical results and reports keyword hits
#[derive(Debug, Clone)]
pub struct RequestHandler {
    controller: ControllerHandle,
    metrics: Option<OffloadMetrics>,
    keyword: String,
}

impl RequestHandler {
    pub fn new(controller: ControllerHandle, keyword: impl Into<String>) -> Self {
        Self {
            controller,
            metrics: None,
            keyword: keyword.into(),
        }
    }

    pub fn with_metrics(mut self, metrics: OffloadMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn controller(&self) -> &ControllerHandle {
        &self.controller
    }

    /// Process one complete payload and return the canonical text
    pub async fn process(&self, payload: Vec<u8>) -> Result<String> {
        if payload.is_empty() {
            return Err(RouterError::EmptyPayload);
        }

        let size = payload.len();
        let outcome = self.controller.handle(payload).await?;

        let hits = count_keyword(&outcome.output, &self.keyword);
        if let Some(metrics) = &self.metrics {
            metrics.record_keyword_hits(hits);
        }

        info!(
            size,
            mode = %outcome.mode,
            venue = %outcome.venue,
            latency_secs = outcome.latency.as_secs_f64(),
            "Occurrences of '{}': {}",
            self.keyword,
            hits
        );

        Ok(outcome.output)
    }
}
