use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use offload_dev::{AudioSimulator, MockRemoteService, SimulatorConfig};

/// Development tools for edge-offload
#[derive(Parser)]
#[command(name = "offload-sim")]
#[command(about = "Audio payload simulator and mock cloud service for edge-offload")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream every .wav file of a folder to an edge node
    Send {
        /// Edge node host (default: EDGE_COMPUTE_HOST or edge-compute-service)
        #[arg(long)]
        host: Option<String>,

        /// Edge node port (default: EDGE_COMPUTE_PORT or 8081)
        #[arg(short, long)]
        port: Option<u16>,

        /// Write chunk size in bytes (default: BUFFER_SIZE or 4096)
        #[arg(long)]
        buffer_size: Option<usize>,

        /// Folder holding the audio files (default: AUDIO_PATH or /app/audio)
        #[arg(long)]
        audio_path: Option<PathBuf>,

        /// Passes over the folder; loops forever when omitted
        #[arg(long)]
        rounds: Option<u64>,

        /// Pause between files in milliseconds
        #[arg(long, default_value_t = 0)]
        pause_ms: u64,
    },

    /// Serve the mock cloud transcription service until Ctrl+C
    MockRemote {
        /// Bind address
        #[arg(short, long, default_value = "0.0.0.0:8080")]
        bind: SocketAddr,

        /// Simulated processing time per KiB of payload, in milliseconds
        #[arg(long, default_value_t = 0)]
        delay_per_kib_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.verbose);

    match cli.command {
        Commands::Send {
            host,
            port,
            buffer_size,
            audio_path,
            rounds,
            pause_ms,
        } => {
            let mut config = SimulatorConfig::from_env()?;
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(buffer_size) = buffer_size {
                config.buffer_size = buffer_size;
            }
            if let Some(audio_path) = audio_path {
                config.audio_path = audio_path;
            }
            config.rounds = rounds;
            config.pause = Duration::from_millis(pause_ms);

            run_simulator(config).await
        }
        Commands::MockRemote {
            bind,
            delay_per_kib_ms,
        } => serve_mock_remote(bind, Duration::from_millis(delay_per_kib_ms)).await,
    }
}

fn init_tracing(log_level: &str, verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        match log_level.to_lowercase().as_str() {
            "error" => tracing::Level::ERROR,
            "warn" => tracing::Level::WARN,
            "debug" => tracing::Level::DEBUG,
            "trace" => tracing::Level::TRACE,
            _ => tracing::Level::INFO,
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("offload_dev={},offload_sim={}", level, level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run_simulator(config: SimulatorConfig) -> Result<()> {
    info!(
        "Streaming audio from '{}' to {} ({} byte chunks)",
        config.audio_path.display(),
        config.target(),
        config.buffer_size
    );

    let simulator = AudioSimulator::new(config)?;
    simulator.run().await?;
    Ok(())
}

async fn serve_mock_remote(bind: SocketAddr, delay_per_kib: Duration) -> Result<()> {
    let mut service = MockRemoteService::new(bind).with_delay_per_kib(delay_per_kib);
    let addr = service.start().await?;
    info!("Mock remote transcription service listening on http://{}/", addr);

    tokio::signal::ctrl_c().await?;
    info!("Stopping mock remote service after {} request(s)", service.requests());
    service.stop().await;
    Ok(())
}
