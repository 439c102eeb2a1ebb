//! Reasoning server: REST and WebSocket surface over the behavioral
//! reasoning core.

mod cli;
mod errors;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reasoning_core::config::Config;
use reasoning_core::FrameCoordinator;

use cli::Args;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reasoning_server=info,reasoning_core=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;
            Config::from_toml_str(&text).map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?
        }
        None => {
            warn!("no --config supplied; running with built-in defaults");
            Config::default()
        }
    };

    if args.production {
        config.production = true;
    }

    let host = args.host.unwrap_or_else(|| "0.0.0.0".to_string());
    let port = args.port.unwrap_or(8088);

    info!(host = %host, port, production = config.production, "reasoning server configuration loaded");

    let production = config.production;
    let coordinator = FrameCoordinator::new(config);

    let state = AppState {
        coordinator: Arc::new(Mutex::new(coordinator)),
        host: host.clone(),
        port,
        production,
        started_at: Instant::now(),
    };

    let app = routes::create_app(state);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid host/port {host}:{port}: {e}"))?;

    info!("starting reasoning server on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
}
