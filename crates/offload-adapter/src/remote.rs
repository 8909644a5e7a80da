//! Remote venue adapter
//!
//! POSTs the raw payload to the cloud transcription service and expects a
//! JSON body of the form `{"text": "...", "status": "success"}`.

use async_trait::async_trait;
use offload_core::{Error, ExecutionAdapter, RemoteConfig, Result, Venue};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Longest response excerpt quoted in an error message
const MAX_ERROR_BODY: usize = 256;

/// Transcription service response
#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: Option<String>,
    status: Option<String>,
    error: Option<String>,
}

/// Adapter for the remote venue
#[derive(Debug, Clone)]
pub struct RemoteAdapter {
    endpoint: String,
    timeout: Duration,
    client: Client,
}

impl RemoteAdapter {
    /// Create an adapter from validated remote configuration
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        config.validate()?;
        Self::with_timeout(&config.endpoint, config.timeout())
    }

    /// Create an adapter with an explicit round-trip timeout
    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint.into();
        offload_core::config::validate_endpoint(&endpoint)?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint,
            timeout,
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn excerpt(body: &str) -> &str {
        let body = body.trim();
        match body.char_indices().nth(MAX_ERROR_BODY) {
            Some((idx, _)) => &body[..idx],
            None => body,
        }
    }
}

#[async_trait]
impl ExecutionAdapter for RemoteAdapter {
    fn venue(&self) -> Venue {
        Venue::Remote
    }

    async fn execute(&self, payload: &[u8]) -> Result<String> {
        debug!("POST {} bytes to {}", payload.len(), self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(payload.to_vec())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::remote_execution(format!(
                        "Request to {} timed out after {:?}",
                        self.endpoint, self.timeout
                    ))
                } else {
                    Error::remote_execution(format!("Request to {} failed: {}", self.endpoint, e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::remote_execution(format!("Failed to read response body: {}", e)))?;

        let parsed = serde_json::from_str::<TranscriptionResponse>(&body);

        if !status.is_success() {
            let detail = parsed
                .ok()
                .and_then(|r| r.error)
                .unwrap_or_else(|| Self::excerpt(&body).to_string());
            return Err(Error::remote_execution(format!(
                "Service returned {}: {}",
                status, detail
            )));
        }

        let parsed = parsed
            .map_err(|e| Error::remote_execution(format!("Invalid response body: {}", e)))?;

        if parsed.status.as_deref() == Some("failure") {
            return Err(Error::remote_execution(format!(
                "Service reported failure: {}",
                parsed.error.as_deref().unwrap_or("unknown error")
            )));
        }

        parsed
            .text
            .ok_or_else(|| Error::remote_execution("Response has no text field"))
    }
}
