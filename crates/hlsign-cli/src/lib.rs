//! Command-line signing for Hyperliquid actions.
//!
//! Reads account settings and asset tables from TOML, loads the key from the
//! environment, and prints the signed exchange payload as JSON.

pub mod commands;
pub mod config;
pub mod error;

pub use commands::{run, Command};
pub use config::{resolve_config_path, AppConfig, DEFAULT_CONFIG_PATH};
pub use error::{CliError, CliResult};
