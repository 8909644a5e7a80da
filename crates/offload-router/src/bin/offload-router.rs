//! offload-router binary

use clap::{Arg, ArgMatches, Command};
use offload_core::Config;
use offload_router::OffloadRouter;
use std::net::SocketAddr;
use std::process;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn cli() -> Command {
    Command::new("offload-router")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Predictive local/remote offloading for edge nodes")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("ADDRESS")
                .help("Listen host"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Listen port")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("buffer-size")
                .long("buffer-size")
                .value_name("BYTES")
                .help("Read chunk size")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("history-capacity")
                .long("history-capacity")
                .value_name("COUNT")
                .help("Samples retained per venue")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("remote-url")
                .long("remote-url")
                .value_name("URL")
                .help("Remote transcription service endpoint"),
        )
        .arg(
            Arg::new("remote-timeout")
                .long("remote-timeout")
                .value_name("SECONDS")
                .help("Remote round-trip timeout in seconds")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("metrics-addr")
                .long("metrics-addr")
                .value_name("ADDRESS")
                .help("Metrics endpoint bind address")
                .value_parser(clap::value_parser!(SocketAddr)),
        )
        .arg(
            Arg::new("disable-metrics")
                .long("disable-metrics")
                .help("Disable the metrics endpoint")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("keyword")
                .long("keyword")
                .value_name("WORD")
                .help("Keyword counted in transcriptions"),
        )
        .arg(
            Arg::new("local-command")
                .long("local-command")
                .value_name("PROGRAM")
                .help("Local transcription engine program"),
        )
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();

    let config = match build_config(&matches) {
        Ok(config) => config,
        Err(e) => {
            // Logging is not configured yet
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "offload_router={level},offload_state={level},offload_adapter={level},offload_metrics={level}",
                    level = config.log.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting offload-router with configuration:");
    info!("  Listen address: {}", config.listen_addr());
    info!("  Read buffer size: {}", config.listener.buffer_size);
    info!("  History capacity: {}", config.controller.history_capacity);
    info!("  Remote endpoint: {}", config.remote.endpoint);
    info!("  Remote timeout: {:?}", config.remote.timeout());
    info!("  Local engine: {} {:?}", config.local.command, config.local.args);
    info!("  Keyword: {}", config.local.keyword);
    if config.metrics.enabled {
        info!("  Metrics endpoint: {}", config.metrics.bind_addr);
    } else {
        info!("  Metrics endpoint: disabled");
    }

    let router = match OffloadRouter::new(config).await {
        Ok(router) => router,
        Err(e) => {
            error!("Failed to create router: {}", e);
            process::exit(1);
        }
    };

    // Blocks until shutdown
    if let Err(e) = router.serve().await {
        error!("Router error: {}", e);
        process::exit(1);
    }

    info!("offload-router shutdown complete");
}

/// Build configuration from file/environment, then apply command line overrides
fn build_config(matches: &ArgMatches) -> offload_core::Result<Config> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load()?,
    };

    if let Some(host) = matches.get_one::<String>("host") {
        config.listener.host = host.clone();
    }

    if let Some(&port) = matches.get_one::<u16>("port") {
        config.listener.port = port;
    }

    if let Some(&buffer_size) = matches.get_one::<usize>("buffer-size") {
        config.listener.buffer_size = buffer_size;
    }

    if let Some(&capacity) = matches.get_one::<usize>("history-capacity") {
        config.controller.history_capacity = capacity;
    }

    if let Some(url) = matches.get_one::<String>("remote-url") {
        config.remote.endpoint = url.clone();
    }

    if let Some(&timeout) = matches.get_one::<u64>("remote-timeout") {
        config.remote.timeout_seconds = timeout;
    }

    if let Some(&addr) = matches.get_one::<SocketAddr>("metrics-addr") {
        config.metrics.bind_addr = addr;
    }

    if matches.get_flag("disable-metrics") {
        config.metrics.enabled = false;
    }

    if let Some(keyword) = matches.get_one::<String>("keyword") {
        config.local.keyword = keyword.clone();
    }

    if let Some(command) = matches.get_one::<String>("local-command") {
        config.local.command = command.clone();
    }

    config.validate()?;
    Ok(config)
}
