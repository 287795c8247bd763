//! rewrite-body gateway
//!
//! Reverse-proxies a single upstream and rewrites its response bodies.
//!
//! ```text
//!     Client ──▶ TraceLayer ──▶ TimeoutLayer ──▶ RewriteBodyLayer ──▶ proxy_handler ──▶ Upstream
//!     Client ◀── corrected headers + rewritten body ◀──────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use rewrite_body::config::load_config;
use rewrite_body::lifecycle::{wait_for_signal, Shutdown};
use rewrite_body::observability::{logging, metrics};
use rewrite_body::GatewayServer;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "rewrite-body")]
#[command(about = "Reverse proxy that rewrites upstream response bodies", long_about = None)]
struct Cli {
    /// Path to the TOML or JSON configuration file.
    #[arg(short, long, default_value = "rewrite-body.toml")]
    config: PathBuf,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    if cli.check {
        println!(
            "{}: ok ({} rewrite rules)",
            cli.config.display(),
            config.rewrite.rewrites.len()
        );
        return Ok(());
    }

    logging::init_tracing(&config.observability)?;

    tracing::info!(
        config = %cli.config.display(),
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        "rewrite-body v0.1.0 starting"
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = GatewayServer::new(config)?;

    let shutdown = Shutdown::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        signal.trigger();
    });

    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
