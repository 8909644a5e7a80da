//! Audio-file simulator
//!
//! Streams every `.wav` file of a folder to an edge node, one TCP connection
//! per file. The write half is shut down after the last chunk to mark the end
//! of the payload, then the node's reply line is read back.

use crate::{DevError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Simulator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Edge node host
    pub host: String,

    /// Edge node port
    pub port: u16,

    /// Write chunk size in bytes
    pub buffer_size: usize,

    /// Folder scanned for `.wav` files
    pub audio_path: PathBuf,

    /// Passes over the folder; `None` loops forever
    pub rounds: Option<u64>,

    /// Pause between two files
    pub pause: Duration,

    /// Time allowed for the node's reply after the payload was sent
    pub response_timeout: Duration,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            host: "edge-compute-service".to_string(),
            port: 8081,
            buffer_size: 4096,
            audio_path: PathBuf::from("/app/audio"),
            rounds: None,
            pause: Duration::ZERO,
            response_timeout: Duration::from_secs(300),
        }
    }
}

impl SimulatorConfig {
    /// Defaults overridden by `EDGE_COMPUTE_HOST`, `EDGE_COMPUTE_PORT`,
    /// `BUFFER_SIZE` and `AUDIO_PATH`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("EDGE_COMPUTE_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("EDGE_COMPUTE_PORT") {
            config.port = port
                .parse()
                .map_err(|e| DevError::Config(format!("Invalid EDGE_COMPUTE_PORT '{}': {}", port, e)))?;
        }
        if let Ok(size) = std::env::var("BUFFER_SIZE") {
            config.buffer_size = size
                .parse()
                .map_err(|e| DevError::Config(format!("Invalid BUFFER_SIZE '{}': {}", size, e)))?;
        }
        if let Ok(path) = std::env::var("AUDIO_PATH") {
            config.audio_path = PathBuf::from(path);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(DevError::Config("Edge host cannot be empty".to_string()));
        }
        if self.port == 0 {
            return Err(DevError::Config("Edge port must be > 0".to_string()));
        }
        if self.buffer_size == 0 {
            return Err(DevError::Config("Buffer size must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Simulator statistics
#[derive(Debug, Default)]
pub struct SimulatorStats {
    pub files_sent: AtomicU64,
    pub bytes_sent: AtomicU64,
    pub files_failed: AtomicU64,
    pub files_skipped: AtomicU64,
    pub error_replies: AtomicU64,
}

impl SimulatorStats {
    pub fn files_sent(&self) -> u64 {
        self.files_sent.load(Ordering::Relaxed)
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }

    pub fn files_failed(&self) -> u64 {
        self.files_failed.load(Ordering::Relaxed)
    }

    pub fn files_skipped(&self) -> u64 {
        self.files_skipped.load(Ordering::Relaxed)
    }

    pub fn error_replies(&self) -> u64 {
        self.error_replies.load(Ordering::Relaxed)
    }
}

/// Load generator replaying audio files against an edge node
#[derive(Debug, Clone)]
pub struct AudioSimulator {
    config: SimulatorConfig,
    stats: Arc<SimulatorStats>,
}

impl AudioSimulator {
    pub fn new(config: SimulatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            stats: Arc::new(SimulatorStats::default()),
        })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn stats(&self) -> &SimulatorStats {
        &self.stats
    }

    /// Regular files of the audio folder, sorted by name.
    ///
    /// Files without a `.wav` extension are skipped with a warning.
    pub async fn discover_files(&self) -> Result<Vec<PathBuf>> {
        let folder = &self.config.audio_path;
        if !folder.is_dir() {
            return Err(DevError::Simulation(format!(
                "Audio folder '{}' does not exist",
                folder.display()
            )));
        }

        let mut entries = tokio::fs::read_dir(folder).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }

            let path = entry.path();
            if is_wav(&path) {
                files.push(path);
            } else {
                warn!("Incorrect file format for file: {}", path.display());
                self.stats.files_skipped.fetch_add(1, Ordering::Relaxed);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Send one file over a fresh connection and return the node's reply
    pub async fn send_file(&self, path: &Path) -> Result<String> {
        let mut file = tokio::fs::File::open(path).await?;
        let mut stream = TcpStream::connect(self.config.target()).await.map_err(|e| {
            DevError::Simulation(format!("Failed to connect to {}: {}", self.config.target(), e))
        })?;
        debug!("Connected to edge node {}", self.config.target());

        let mut chunk = vec![0u8; self.config.buffer_size];
        let mut sent = 0u64;
        loop {
            let n = file.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            stream.write_all(&chunk[..n]).await?;
            sent += n as u64;
        }
        stream.shutdown().await?;

        self.stats.files_sent.fetch_add(1, Ordering::Relaxed);
        self.stats.bytes_sent.fetch_add(sent, Ordering::Relaxed);
        info!("File '{}' sent successfully ({} bytes)", path.display(), sent);

        let mut reply = String::new();
        match tokio::time::timeout(self.config.response_timeout, stream.read_to_string(&mut reply))
            .await
        {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => debug!("Edge node closed without a reply: {}", e),
            Err(_) => warn!(
                "No reply for '{}' within {:?}",
                path.display(),
                self.config.response_timeout
            ),
        }

        let reply = reply.trim_end().to_string();
        if reply.starts_with("ERROR:") {
            self.stats.error_replies.fetch_add(1, Ordering::Relaxed);
        }
        Ok(reply)
    }

    /// Run one pass over the folder; per-file errors are logged, not fatal
    pub async fn run_round(&self) -> Result<usize> {
        let files = self.discover_files().await?;
        if files.is_empty() {
            warn!(
                "No audio files found in '{}'",
                self.config.audio_path.display()
            );
            return Ok(0);
        }

        info!(
            "Found {} audio file(s) in '{}'. Sending to edge node...",
            files.len(),
            self.config.audio_path.display()
        );

        let mut delivered = 0;
        for path in &files {
            let started = Instant::now();
            match self.send_file(path).await {
                Ok(reply) => {
                    delivered += 1;
                    info!(
                        elapsed_secs = started.elapsed().as_secs_f64(),
                        "Reply for '{}': {}",
                        path.display(),
                        reply
                    );
                }
                Err(e) => {
                    self.stats.files_failed.fetch_add(1, Ordering::Relaxed);
                    warn!("Failed to send file '{}': {}", path.display(), e);
                }
            }

            if !self.config.pause.is_zero() {
                tokio::time::sleep(self.config.pause).await;
            }
        }

        Ok(delivered)
    }

    /// Loop over the folder for the configured number of rounds, or forever
    pub async fn run(&self) -> Result<()> {
        let mut round = 0u64;
        loop {
            if let Some(rounds) = self.config.rounds {
                if round >= rounds {
                    break;
                }
            }
            round += 1;

            let delivered = self.run_round().await?;
            debug!("Round {} delivered {} file(s)", round, delivered);

            // An empty folder would otherwise spin
            if delivered == 0 && self.config.rounds.is_none() {
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }

        info!(
            "Simulation finished: {} sent, {} failed, {} skipped, {} error replies",
            self.stats.files_sent(),
            self.stats.files_failed(),
            self.stats.files_skipped(),
            self.stats.error_replies()
        );
        Ok(())
    }
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("wav"))
}
