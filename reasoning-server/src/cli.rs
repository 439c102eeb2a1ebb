use std::path::PathBuf;

use clap::Parser;

/// Command line arguments for the reasoning server.
#[derive(Parser, Debug)]
#[command(name = "reasoning-server")]
#[command(about = "REST and WebSocket surface for the behavioral reasoning core")]
pub struct Args {
    /// Path to the TOML configuration document.
    #[arg(long, env = "REASONING_CONFIG")]
    pub config: Option<PathBuf>,

    /// Server port (overrides config).
    #[arg(short, long, env = "SERVER_PORT")]
    pub port: Option<u16>,

    /// Server host (overrides config).
    #[arg(long, env = "SERVER_HOST")]
    pub host: Option<String>,

    /// Disable the development-only test-event endpoint (overrides config).
    #[arg(long, env = "PRODUCTION")]
    pub production: bool,
}
