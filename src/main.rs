//! SMDR Collector Binary
//!
//! Receives SMDR records from a telephone exchange and stores them as CSV.

use clap::Parser;
use smdr_collector::config::CollectorConfig;
use smdr_collector::logging::EventLog;
use smdr_collector::server::{ShutdownSignals, SmdrServer};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "smdr-collector")]
#[command(about = "Collects SMDR records from a telephone exchange into rotating CSV files")]
#[command(version)]
struct Args {
    /// Configuration file path (TOML, or JSON with a .json extension)
    #[arg(short, long, default_value = "config/collector.toml")]
    config: PathBuf,

    /// Address to bind to
    #[arg(short, long)]
    bind: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    let filter = if args.verbose {
        "smdr_collector=debug,info"
    } else {
        "smdr_collector=info,warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting SMDR collector v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    };

    let events = EventLog::create(&config.log_file);
    info!("Event log: {}", events.path().display());
    let hostname = gethostname::gethostname().to_string_lossy().to_string();
    events.info(format!(
        "SMDR collector v{} starting on {}",
        env!("CARGO_PKG_VERSION"),
        hostname
    ));
    if let Some(model) = &config.network.pbx_model {
        events.info(format!("Expecting SMDR data from a {} exchange", model));
    }
    if let Some(pbx) = &config.network.pbx_address {
        events.info(format!("Expected exchange address: {}", pbx));
    }

    let shutdown = CancellationToken::new();
    match ShutdownSignals::install() {
        Ok(signals) => {
            tokio::spawn(signals.cancel_on_signal(events.clone(), shutdown.clone()));
        }
        Err(e) => {
            events.error(format!("Failed to install signal handlers: {}", e));
            std::process::exit(1);
        }
    }

    let server = match SmdrServer::bind(config, events.clone()).await {
        Ok(server) => server,
        Err(e) => {
            events.error(format!("Failed to start listener: {}", e));
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run(shutdown).await {
        events.error(format!("Collector stopped with error: {}", e));
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> smdr_collector::Result<CollectorConfig> {
    let mut config = CollectorConfig::from_file(&args.config)?;

    // Override config with CLI arguments
    if let Some(bind) = &args.bind {
        config.network.bind_address = bind.clone();
    }
    if let Some(port) = args.port {
        config.network.port = port;
    }

    config.validate()?;
    config.prepare_directories()?;
    info!("Configuration loaded from {}", args.config.display());
    Ok(config)
}
