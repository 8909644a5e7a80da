//! TCP payload server
//!
//! One connection carries exactly one payload: the peer writes its bytes and
//! closes (or half-closes) the connection. The canonical result, or an
//! `ERROR:` line, is written back on the same socket when the peer still
//! listens.

use crate::handler::RequestHandler;
use crate::router::RouterStats;
use crate::{Result, RouterError};
use offload_core::Error;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Pause after a failed accept so a persistent error does not spin
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accepts connections and hands each complete payload to the request handler
#[derive(Debug, Clone)]
pub struct PayloadServer {
    handler: Arc<RequestHandler>,
    stats: Arc<RouterStats>,
    buffer_size: usize,
}

impl PayloadServer {
    pub fn new(handler: Arc<RequestHandler>, stats: Arc<RouterStats>, buffer_size: usize) -> Self {
        Self {
            handler,
            stats,
            buffer_size: buffer_size.max(1),
        }
    }

    /// Bind the listening socket
    pub async fn bind(bind_addr: &str) -> Result<TcpListener> {
        TcpListener::bind(bind_addr)
            .await
            .map_err(|e| RouterError::Server(format!("Failed to bind to {}: {}", bind_addr, e)))
    }

    /// Accept connections until the task is cancelled.
    ///
    /// Connection failures are logged per connection and never end the loop.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        info!("Listening for payloads on {}", local_addr);

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let server = self.clone();
                    let span = info_span!(
                        "connection",
                        request_id = %Uuid::new_v4(),
                        peer = %peer
                    );
                    tokio::spawn(
                        async move {
                            server.handle_connection(stream, peer).await;
                        }
                        .instrument(span),
                    );
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }

    async fn handle_connection(&self, mut stream: TcpStream, peer: SocketAddr) {
        self.stats.increment_connections();
        self.stats.increment_active_connections();
        info!("Connection established with {}", peer);

        let payload = match read_payload(&mut stream, self.buffer_size).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(category = e.category(), "Dropping connection: {}", e);
                self.stats.increment_errors();
                self.stats.decrement_active_connections();
                return;
            }
        };
        info!("Received {} bytes of audio data", payload.len());

        let response = match self.handler.process(payload).await {
            Ok(text) => {
                self.stats.increment_payloads();
                format!("{}\n", text)
            }
            Err(RouterError::EmptyPayload) => {
                warn!("Rejecting empty payload");
                self.stats.increment_rejected();
                "ERROR: empty payload\n".to_string()
            }
            Err(e) => {
                error!("Request failed: {}", e);
                self.stats.increment_errors();
                format!("ERROR: {}\n", e)
            }
        };

        // Best-effort reply; the peer may already have closed its read half
        if let Err(e) = write_response(&mut stream, response.as_bytes()).await {
            debug!("Could not deliver response: {}", e);
        }

        self.stats.decrement_active_connections();
    }
}

/// Read `buffer_size` chunks until EOF, accumulating one payload.
///
/// A read failure discards the partial payload and surfaces as
/// `Error::Transport`.
pub async fn read_payload<R>(
    reader: &mut R,
    buffer_size: usize,
) -> offload_core::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut payload = Vec::new();
    let mut chunk = vec![0u8; buffer_size.max(1)];

    loop {
        let n = reader.read(&mut chunk).await.map_err(|e| {
            Error::transport(format!(
                "Failed to read payload after {} bytes: {}",
                payload.len(),
                e
            ))
        })?;
        if n == 0 {
            break;
        }
        payload.extend_from_slice(&chunk[..n]);
    }

    Ok(payload)
}

async fn write_response(stream: &mut TcpStream, response: &[u8]) -> std::io::Result<()> {
    stream.write_all(response).await?;
    stream.shutdown().await
}
