use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use mirror_proxy::config::{load_config, validation::validate_config, ConfigError, MirrorConfig};
use mirror_proxy::lifecycle::signals::spawn_signal_listener;
use mirror_proxy::observability::{logging, metrics};
use mirror_proxy::{DomainTable, HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "mirror-proxy")]
#[command(about = "Subdomain mirror proxy with response URL rewriting", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => MirrorConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    logging::init_logging(&config.observability);

    tracing::info!("mirror-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    // A bad domain table is fatal before anything binds.
    let table = DomainTable::builtin()?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        origins = table.len(),
        request_timeout_secs = config.timeouts.request_secs,
        idle_timeout_secs = config.timeouts.idle_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    spawn_signal_listener(&shutdown);

    let server = HttpServer::new(config, table)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
