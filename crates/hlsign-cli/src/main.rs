//! hlsign - sign Hyperliquid exchange actions from the command line.
//!
//! Prints the signed payload (`{action, nonce, signature, ...}`) as JSON on
//! stdout; logs go to stderr.

use anyhow::Result;
use clap::Parser;
use hlsign_cli::{resolve_config_path, run, AppConfig, Command};
use hlsign_telemetry::{init_logging, LoggingConfig};
use tracing::info;

/// Sign Hyperliquid exchange actions
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via HLSIGN_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Print compact single-line JSON
    #[arg(long)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&LoggingConfig::from_env())?;

    let config_path = resolve_config_path(args.config);
    let output = run(&args.command, || {
        info!(config_path = %config_path, "Loading configuration");
        let config = AppConfig::from_file(&config_path)?;
        info!(is_mainnet = config.is_mainnet, "Configuration loaded");
        config.build_exchange()
    })?;

    let rendered = if args.compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    println!("{rendered}");

    Ok(())
}
