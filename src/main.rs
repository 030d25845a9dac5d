use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;

use paystream_auth::config::{finalize_config, load_or_default};
use paystream_auth::http::HttpServer;
use paystream_auth::lifecycle::{signals, Shutdown};
use paystream_auth::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "paystream-auth")]
#[command(about = "Payment authorization service behind a circuit breaker", long_about = None)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen port, overriding config and PORT
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_or_default(args.config.as_deref())?;
    logging::init(&config.observability.log_level);

    let mut config = finalize_config(config)?;
    if let Some(port) = args.port {
        config.listener.bind_address = format!("0.0.0.0:{port}");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        version = %config.service.version,
        latency_base_ms = config.service.latency_base_ms,
        success_rate = config.service.success_rate,
        breaker = %config.circuit_breaker.name,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();

    let prometheus = if config.observability.metrics_enabled {
        match metrics::install_exporter() {
            Ok(handle) => {
                tokio::spawn(metrics::run_upkeep(
                    handle.clone(),
                    Duration::from_secs(config.observability.upkeep_interval_secs.max(1)),
                    shutdown.subscribe(),
                ));
                Some(handle)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install Prometheus exporter");
                None
            }
        }
    } else {
        None
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(
        "paystream-auth {} starting on {}",
        config.service.version,
        local_addr
    );

    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    let server = HttpServer::new(config, prometheus);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
