//! Mock cloud transcription service
//!
//! Speaks the remote offload protocol: `POST /` with the raw payload as body,
//! answered with `{"text": ..., "status": "success"}` or, for an empty body,
//! `{"error": ..., "status": "failure"}` and status 500.

use crate::{DevError, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

type TranscribeFn = dyn Fn(&[u8]) -> String + Send + Sync;

#[derive(Clone)]
struct ServiceState {
    transcribe: Arc<TranscribeFn>,
    delay_per_kib: Duration,
    requests: Arc<AtomicU64>,
}

/// In-process stand-in for the remote transcription service
pub struct MockRemoteService {
    bind_addr: SocketAddr,
    state: ServiceState,
    local_addr: Option<SocketAddr>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl std::fmt::Debug for MockRemoteService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRemoteService")
            .field("bind_addr", &self.bind_addr)
            .field("local_addr", &self.local_addr)
            .field("requests", &self.requests())
            .finish()
    }
}

impl MockRemoteService {
    /// Create a service answering with a size summary of each payload
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            state: ServiceState {
                transcribe: Arc::new(|audio: &[u8]| {
                    format!("transcribed {} bytes of audio", audio.len())
                }),
                delay_per_kib: Duration::ZERO,
                requests: Arc::new(AtomicU64::new(0)),
            },
            local_addr: None,
            server_handle: None,
        }
    }

    /// Produce the returned text with a custom closure
    pub fn with_transcriber<F>(mut self, transcribe: F) -> Self
    where
        F: Fn(&[u8]) -> String + Send + Sync + 'static,
    {
        self.state.transcribe = Arc::new(transcribe);
        self
    }

    /// Simulated processing time per KiB of payload
    pub fn with_delay_per_kib(mut self, delay: Duration) -> Self {
        self.state.delay_per_kib = delay;
        self
    }

    /// Start serving; returns the bound address
    pub async fn start(&mut self) -> Result<SocketAddr> {
        if self.server_handle.is_some() {
            return Err(DevError::MockService("Service already started".to_string()));
        }

        let app = Router::new()
            .route("/", post(transcribe_handler))
            .with_state(self.state.clone());
        let listener = TcpListener::bind(self.bind_addr).await?;
        let local_addr = listener.local_addr()?;

        info!("Starting mock remote transcription service on {}", local_addr);

        self.server_handle = Some(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                warn!("Mock remote service error: {}", e);
            }
        }));
        self.local_addr = Some(local_addr);
        Ok(local_addr)
    }

    /// Stop serving
    pub async fn stop(&mut self) {
        if let Some(handle) = self.server_handle.take() {
            handle.abort();
            let _ = handle.await;
        }
        self.local_addr = None;
    }

    /// Endpoint URL to configure as the remote venue, once started
    pub fn url(&self) -> Option<String> {
        self.local_addr.map(|addr| format!("http://{}/", addr))
    }

    /// Number of transcription requests received
    pub fn requests(&self) -> u64 {
        self.state.requests.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.server_handle.is_some()
    }
}

impl Drop for MockRemoteService {
    fn drop(&mut self) {
        if let Some(handle) = self.server_handle.take() {
            handle.abort();
        }
    }
}

async fn transcribe_handler(State(state): State<ServiceState>, body: Bytes) -> Response {
    state.requests.fetch_add(1, Ordering::Relaxed);
    debug!("Mock remote received {} bytes", body.len());

    if body.is_empty() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Empty audio payload", "status": "failure"})),
        )
            .into_response();
    }

    if !state.delay_per_kib.is_zero() {
        let kib = u32::try_from(body.len().div_ceil(1024)).unwrap_or(u32::MAX);
        tokio::time::sleep(state.delay_per_kib.saturating_mul(kib)).await;
    }

    let text = (state.transcribe)(&body);
    (
        StatusCode::OK,
        Json(json!({"text": text, "status": "success"})),
    )
        .into_response()
}
