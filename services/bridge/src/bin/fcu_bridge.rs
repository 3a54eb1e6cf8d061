//! FCU bridge binary
//!
//! Usage:
//!   fcu-bridge --config config/bridge.toml
//!   fcu-bridge --config config/bridge.toml --log-level debug --json-logs

use anyhow::{Context, Result};
use bridge_config::BridgeConfig;
use clap::Parser;
use fcu_bridge::Bridge;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fcu-bridge")]
#[command(about = "Bridge between the sensor bus and an autopilot link")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: String,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging format
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    info!(config = %args.config, "Starting FCU bridge");

    let config = BridgeConfig::from_file(&args.config)
        .with_context(|| format!("loading configuration from {}", args.config))
        .inspect_err(|e| error!("{:#}", e))?;

    info!(
        endpoint = %config.link.endpoint,
        units = ?config.units.enabled,
        "Configuration loaded"
    );

    Bridge::new(config).run(shutdown_signal()).await
}

fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.to_lowercase()));

    if args.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for CTRL+C, shutting down");
    }
}
