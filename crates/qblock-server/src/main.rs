//! qblock server binary.
//!
//! # Configuration
//!
//! A YAML file (`--config` or `QBLOCK_CONFIG`) supplies the base settings;
//! `QBLOCK_*` environment variables override individual fields. A `.env`
//! file in the working directory is loaded first if present.
//!
//! ```bash
//! QBLOCK_ADDRESS=0.0.0.0:5000 QBLOCK_LOG_FORMAT=json qblock-server
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use qblock_server::{AppState, Config, TracingConfig, create_router, init_tracing};

#[derive(Parser)]
#[command(name = "qblock-server")]
#[command(about = "Compile constraint models to QUBOs over HTTP", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long, env = "QBLOCK_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    init_tracing(&TracingConfig::from(&config.logging))
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    let addr = config.socket_addr()?;
    info!(
        %addr,
        cors = %config.server.cors_origins,
        num_reads = config.sampler.num_reads,
        num_sweeps = config.sampler.num_sweeps,
        "Starting qblock server"
    );

    let app = create_router(Arc::new(AppState::with_config(config)));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("qblock server shut down");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT"),
        () = terminate => info!("Received SIGTERM"),
    }
}
