//! correlate: user and profile services with request correlation and
//! redacted exchange logging.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ correlation ──▶ trace ──▶ exchange log ──▶ handler
//!              (scope + id)              (redact → sink)     │
//!                                                            ▼
//!                                  OutboundClient (forward x-* + id, log)
//!                                                            │
//!                                                            ▼
//!                                                    profile-service
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use correlate::config::{load_config, ServiceConfig};
use correlate::http::HttpServer;
use correlate::lifecycle::{spawn_signal_handler, Shutdown};
use correlate::observability::{logging, metrics, TracingSink};
use correlate::services::ServiceRole;

#[derive(Parser)]
#[command(name = "correlate", version)]
#[command(about = "User and profile services with correlated, redacted exchange logging", long_about = None)]
struct Cli {
    /// Service to run
    #[arg(value_enum)]
    service: ServiceRole,

    /// TOML configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability)?;

    tracing::info!(
        service = cli.service.as_str(),
        version = env!("CARGO_PKG_VERSION"),
        "correlate starting"
    );
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        outbound_timeout_secs = config.timeouts.outbound_secs,
        exclusions = config.logbook.exclude.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start Prometheus exporter");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = HttpServer::new(&config, cli.service, Arc::new(TracingSink))?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_handler(&shutdown);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
