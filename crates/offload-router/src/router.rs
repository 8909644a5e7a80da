//! Main router implementation

use crate::handler::{ControllerHandle, RequestHandler, DEFAULT_QUEUE_DEPTH};
use crate::server::PayloadServer;
use crate::{Result, RouterError};

use offload_adapter::{LocalAdapter, RemoteAdapter};
use offload_core::{Config, NoopObserver, OffloadObserver};
use offload_metrics::PrometheusExporter;
use offload_state::OffloadingController;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Router statistics
#[derive(Debug)]
pub struct RouterStats {
    /// Connections accepted
    pub connections_total: AtomicU64,

    /// Payloads answered with a result
    pub payloads_total: AtomicU64,

    /// Empty payloads rejected
    pub rejected_total: AtomicU64,

    /// Failed reads and failed requests
    pub errors_total: AtomicU64,

    /// Connections currently being served
    pub active_connections: AtomicU64,

    /// Router start time
    pub start_time: Instant,
}

impl Default for RouterStats {
    fn default() -> Self {
        Self {
            connections_total: AtomicU64::new(0),
            payloads_total: AtomicU64::new(0),
            rejected_total: AtomicU64::new(0),
            errors_total: AtomicU64::new(0),
            active_connections: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }
}

impl RouterStats {
    pub fn increment_connections(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_payloads(&self) {
        self.payloads_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rejected(&self) {
        self.rejected_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_errors(&self) {
        self.errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_active_connections(&self) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrement_active_connections(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn total_connections(&self) -> u64 {
        self.connections_total.load(Ordering::Relaxed)
    }

    pub fn total_payloads(&self) -> u64 {
        self.payloads_total.load(Ordering::Relaxed)
    }

    pub fn total_rejected(&self) -> u64 {
        self.rejected_total.load(Ordering::Relaxed)
    }

    pub fn total_errors(&self) -> u64 {
        self.errors_total.load(Ordering::Relaxed)
    }

    pub fn active_connections(&self) -> u64 {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// Edge node service: adapters, controller actor, metrics and listener
pub struct OffloadRouter {
    config: Config,
    server: PayloadServer,
    handler: Arc<RequestHandler>,
    stats: Arc<RouterStats>,
    exporter: Option<PrometheusExporter>,
    controller_task: Option<JoinHandle<()>>,
    server_task: Option<JoinHandle<Result<()>>>,
    local_addr: Option<SocketAddr>,
}

impl OffloadRouter {
    /// Validate configuration and wire every component.
    ///
    /// Nothing is bound yet; configuration errors surface here, before any
    /// request can be served.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        info!(
            "Creating offload router: listener {}, remote {}, history capacity {}",
            config.listen_addr(),
            config.remote.endpoint,
            config.controller.history_capacity
        );

        let local = Arc::new(LocalAdapter::from_config(&config.local));
        let remote = Arc::new(RemoteAdapter::new(&config.remote)?);

        let exporter = if config.metrics.enabled {
            Some(PrometheusExporter::new(config.metrics.bind_addr)?)
        } else {
            None
        };

        let observer: Arc<dyn OffloadObserver> = match &exporter {
            Some(exporter) => Arc::new(exporter.metrics().clone()),
            None => Arc::new(NoopObserver),
        };

        let controller =
            OffloadingController::new(&config.controller, local, remote, observer)?;
        let (controller_handle, controller_task) =
            ControllerHandle::spawn(controller, DEFAULT_QUEUE_DEPTH);

        let mut handler = RequestHandler::new(controller_handle, config.local.keyword.clone());
        if let Some(exporter) = &exporter {
            handler = handler.with_metrics(exporter.metrics().clone());
        }
        let handler = Arc::new(handler);

        let stats = Arc::new(RouterStats::default());
        let server = PayloadServer::new(
            handler.clone(),
            stats.clone(),
            config.listener.buffer_size,
        );

        Ok(Self {
            config,
            server,
            handler,
            stats,
            exporter,
            controller_task: Some(controller_task),
            server_task: None,
            local_addr: None,
        })
    }

    /// Bind the configured listen address, then start serving
    pub async fn start(&mut self) -> Result<SocketAddr> {
        if self.server_task.is_some() {
            return Err(RouterError::Server("Router already started".to_string()));
        }

        let listener = PayloadServer::bind(&self.config.listen_addr()).await?;
        self.start_with_listener(listener).await
    }

    /// Start the metrics endpoint and serve payloads on an already bound listener
    pub async fn start_with_listener(&mut self, listener: TcpListener) -> Result<SocketAddr> {
        if self.server_task.is_some() {
            return Err(RouterError::Server("Router already started".to_string()));
        }

        let local_addr = listener.local_addr()?;

        if let Some(exporter) = self.exporter.as_mut() {
            exporter.start_server().await?;
        }

        let server = self.server.clone();
        self.server_task = Some(tokio::spawn(async move { server.serve(listener).await }));
        self.local_addr = Some(local_addr);

        info!("Offload router started on {}", local_addr);
        Ok(local_addr)
    }

    /// Serve and block until shutdown
    pub async fn serve(mut self) -> Result<()> {
        self.start().await?;
        wait_for_shutdown().await;
        self.shutdown().await
    }

    /// Graceful shutdown
    pub async fn shutdown(&mut self) -> Result<()> {
        info!("Shutting down offload router");

        if let Some(task) = self.server_task.take() {
            task.abort();
            let _ = task.await;
        }

        if let Some(exporter) = self.exporter.as_mut() {
            exporter.stop_server().await;
        }

        match self.handler.controller().snapshot().await {
            Ok(snapshot) => info!(
                mode = %snapshot.mode,
                requests = snapshot.requests,
                local_samples = snapshot.local.history_len,
                remote_samples = snapshot.remote.history_len,
                "Final controller state"
            ),
            Err(e) => warn!("Could not read final controller state: {}", e),
        }

        if let Some(task) = self.controller_task.take() {
            task.abort();
        }

        info!(
            "Offload router shutdown complete after {}s: {} connections, {} payloads, {} errors",
            self.stats.uptime_seconds(),
            self.stats.total_connections(),
            self.stats.total_payloads(),
            self.stats.total_errors()
        );
        Ok(())
    }

    pub fn stats(&self) -> &RouterStats {
        &self.stats
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn handler(&self) -> &RequestHandler {
        &self.handler
    }

    /// Address the payload listener is bound to, once started
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offload_dev::MockRemoteService;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn test_config(remote_endpoint: String) -> Config {
        let mut config = Config::default();
        config.listener.host = "127.0.0.1".to_string();
        config.listener.port = 1;
        config.controller.history_capacity = 2;
        config.remote.endpoint = remote_endpoint;
        config.remote.timeout_seconds = 5;
        config.local.command = "cat".to_string();
        config.metrics.bind_addr = "127.0.0.1:0".parse().unwrap();
        config
    }

    #[test]
    fn test_router_stats() {
        let stats = RouterStats::default();
        assert_eq!(stats.total_connections(), 0);

        stats.increment_connections();
        stats.increment_active_connections();
        stats.increment_payloads();
        stats.increment_errors();
        stats.decrement_active_connections();

        assert_eq!(stats.total_connections(), 1);
        assert_eq!(stats.total_payloads(), 1);
        assert_eq!(stats.total_errors(), 1);
        assert_eq!(stats.active_connections(), 0);
    }

    #[tokio::test]
    async fn test_invalid_remote_endpoint_aborts_startup() {
        let config = test_config("cloud-compute-service:8080".to_string());
        let err = OffloadRouter::new(config).await.err().unwrap();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_invalid_capacity_aborts_startup() {
        let mut config = test_config("http://127.0.0.1:9/".to_string());
        config.controller.history_capacity = 1;
        assert!(OffloadRouter::new(config).await.err().unwrap().is_fatal());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_end_to_end_warm_up() {
        let mut remote = MockRemoteService::new("127.0.0.1:0".parse().unwrap());
        let remote_addr = remote.start().await.unwrap();

        let config = test_config(format!("http://{}/", remote_addr));
        let mut router = OffloadRouter::new(config).await.unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = router.start_with_listener(listener).await.unwrap();
        assert_eq!(router.local_addr(), Some(addr));
        assert_ne!(addr.port(), 0);

        // A second start is refused while serving
        let second = TcpListener::bind("127.0.0.1:0").await.unwrap();
        assert!(matches!(
            router.start_with_listener(second).await,
            Err(RouterError::Server(_))
        ));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"call the police").await.unwrap();
        stream.shutdown().await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        // The local engine is `cat`, so the canonical text echoes the payload
        assert_eq!(response, "call the police\n");
        assert_eq!(remote.requests(), 1);

        let snapshot = router.handler().controller().snapshot().await.unwrap();
        assert_eq!(snapshot.local.history_len, 1);
        assert_eq!(snapshot.remote.history_len, 1);

        router.shutdown().await.unwrap();
        remote.stop().await;
    }
}
