//! Configuration management for edge-offload
//!
//! Provides a unified configuration system that supports YAML files,
//! environment variables, and command-line argument overrides. All options
//! are static for the lifetime of the process.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable pointing at a configuration file
pub const CONFIG_PATH_ENV: &str = "EDGE_OFFLOAD_CONFIG";

/// Prefix for environment overrides, e.g. `EDGE_OFFLOAD_LISTENER__PORT=9000`
pub const ENV_PREFIX: &str = "EDGE_OFFLOAD";

/// Endpoint scheme prefixes accepted for the remote venue
pub const REMOTE_SCHEMES: [&str; 2] = ["http://", "https://"];

/// Main configuration structure for edge-offload components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Inbound payload listener
    pub listener: ListenerConfig,

    /// Offloading controller
    pub controller: ControllerConfig,

    /// Remote venue
    pub remote: RemoteConfig,

    /// Local venue
    pub local: LocalConfig,

    /// Metrics exposition
    pub metrics: MetricsConfig,

    /// Logging
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest)
    /// 2. Configuration file
    /// 3. Defaults (lowest)
    ///
    /// Command line overrides are applied by the binaries on top of this, so
    /// the merged result is not validated here. Call [`Config::validate`]
    /// once every layer has been applied.
    pub fn load() -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
            builder = builder.add_source(config::File::with_name(&config_path).required(true));
        } else {
            for path in &["./edge-offload.yaml", "/etc/edge-offload/config.yaml"] {
                builder = builder.add_source(config::File::with_name(path).required(false));
            }
        }

        Self::finish(builder)
    }

    /// Load configuration from a specific file, still honouring environment
    /// overrides. Like [`Config::load`], the result is not validated.
    pub fn load_from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let builder = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(config::File::from(path));

        Self::finish(builder)
    }

    fn finish(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.listener.validate()?;
        self.controller.validate()?;
        self.remote.validate()?;
        self.local.validate()?;

        Ok(())
    }

    /// Address the payload listener binds to
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listener.host, self.listener.port)
    }
}

/// Inbound payload listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host to listen on
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Read chunk size in bytes
    pub buffer_size: usize,
}

impl ListenerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::config("Listen host cannot be empty"));
        }

        if self.port == 0 {
            return Err(Error::config("Listen port must be > 0"));
        }

        if self.buffer_size == 0 {
            return Err(Error::config("Read buffer size must be > 0"));
        }

        Ok(())
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
            buffer_size: 4096,
        }
    }
}

/// Offloading controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Per-venue history capacity, identical for both venues
    pub history_capacity: usize,
}

impl ControllerConfig {
    pub fn validate(&self) -> Result<()> {
        // A full history has to hold at least two samples to be trainable.
        if self.history_capacity < 2 {
            return Err(Error::config(format!(
                "History capacity must be >= 2, got {}",
                self.history_capacity
            )));
        }

        Ok(())
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            history_capacity: 10,
        }
    }
}

/// Remote venue configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Endpoint URL the payload is POSTed to
    pub endpoint: String,

    /// Round-trip timeout in seconds
    pub timeout_seconds: u64,
}

impl RemoteConfig {
    pub fn validate(&self) -> Result<()> {
        validate_endpoint(&self.endpoint)?;

        if self.timeout_seconds == 0 {
            return Err(Error::config("Remote timeout must be > 0"));
        }

        Ok(())
    }

    /// Round-trip timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://cloud-compute-service:8080/".to_string(),
            timeout_seconds: 100,
        }
    }
}

/// Check that a remote endpoint starts with a recognized scheme and parses as a URL
pub fn validate_endpoint(endpoint: &str) -> Result<()> {
    if !REMOTE_SCHEMES
        .iter()
        .any(|scheme| endpoint.starts_with(scheme))
    {
        return Err(Error::config(format!(
            "Remote endpoint '{}' must start with one of {:?}",
            endpoint, REMOTE_SCHEMES
        )));
    }

    let url = url::Url::parse(endpoint)
        .map_err(|e| Error::config(format!("Invalid remote endpoint '{}': {}", endpoint, e)))?;

    if url.host_str().map_or(true, str::is_empty) {
        return Err(Error::config(format!(
            "Remote endpoint '{}' has no host",
            endpoint
        )));
    }

    Ok(())
}

/// Local venue configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Transcription engine program
    pub command: String,

    /// Extra arguments; the spooled payload path is appended last
    pub args: Vec<String>,

    /// Directory for spooled payload files (system temp dir when unset)
    pub work_dir: Option<PathBuf>,

    /// Keyword counted in the canonical transcription
    pub keyword: String,
}

impl LocalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.command.trim().is_empty() {
            return Err(Error::config("Local engine command cannot be empty"));
        }

        Ok(())
    }
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            command: "whisper-cli".to_string(),
            args: Vec::new(),
            work_dir: None,
            keyword: "police".to_string(),
        }
    }
}

/// Metrics exposition configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Serve the pull-based metrics endpoint
    pub enabled: bool,

    /// Address of the metrics endpoint
    pub bind_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
