//! Application configuration.

use std::path::PathBuf;
use std::sync::Arc;

use alloy::primitives::Address;
use hlsign_core::{AssetTable, DEFAULT_SLIPPAGE};
use hlsign_signer::{parse_vault_address, Exchange, KeyManager, KeySource, Signer};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// Config file used when neither `--config` nor `HLSIGN_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Pick the config path: CLI arg > `HLSIGN_CONFIG` > default.
pub fn resolve_config_path(cli_arg: Option<String>) -> String {
    cli_arg
        .or_else(|| std::env::var("HLSIGN_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}

fn default_key_env() -> String {
    "HLSIGN_PRIVATE_KEY".to_string()
}

fn default_slippage() -> f64 {
    DEFAULT_SLIPPAGE
}

/// Account settings and asset metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Whether to sign for mainnet (true) or testnet (false).
    /// Default: false (testnet).
    #[serde(default)]
    pub is_mainnet: bool,

    /// Vault or subaccount to trade on behalf of. Folded into the action
    /// hash of core actions when set.
    #[serde(default)]
    pub vault_address: Option<String>,

    /// Expected address of the loaded key. Loading fails on mismatch.
    #[serde(default)]
    pub signer_address: Option<String>,

    /// Environment variable holding the hex private key.
    #[serde(default = "default_key_env")]
    pub key_env: String,

    /// Key file; takes precedence over `key_env` when set.
    #[serde(default)]
    pub key_file: Option<PathBuf>,

    /// Default slippage for market orders (0.005 = 0.5%).
    #[serde(default = "default_slippage")]
    pub slippage: f64,

    /// Millisecond deadline appended to core action hashes.
    #[serde(default)]
    pub expires_after: Option<u64>,

    #[serde(default)]
    pub perp_assets: AssetTable,

    #[serde(default)]
    pub spot_assets: AssetTable,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            is_mainnet: false,
            vault_address: None,
            signer_address: None,
            key_env: default_key_env(),
            key_file: None,
            slippage: default_slippage(),
            expires_after: None,
            perp_assets: AssetTable::new(),
            spot_assets: AssetTable::new(),
        }
    }
}

impl AppConfig {
    /// Load and validate a TOML config file.
    pub fn from_file(path: &str) -> CliResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("Failed to read config {path}: {e}")))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> CliResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| CliError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would only fail later at signing time.
    pub fn validate(&self) -> CliResult<()> {
        if !self.slippage.is_finite() || !(0.0..1.0).contains(&self.slippage) {
            return Err(CliError::Config(format!(
                "slippage must be in [0, 1), got {}",
                self.slippage
            )));
        }
        if let Some(vault) = &self.vault_address {
            parse_vault_address(vault)?;
        }
        self.expected_signer()?;
        Ok(())
    }

    pub fn key_source(&self) -> KeySource {
        match &self.key_file {
            Some(path) => KeySource::File { path: path.clone() },
            None => KeySource::EnvVar {
                var_name: self.key_env.clone(),
            },
        }
    }

    pub fn expected_signer(&self) -> CliResult<Option<Address>> {
        self.signer_address
            .as_deref()
            .map(|s| {
                s.trim()
                    .parse::<Address>()
                    .map_err(|e| CliError::Config(format!("invalid signer_address {s}: {e}")))
            })
            .transpose()
    }

    /// Load the key and assemble an [`Exchange`] for this account.
    pub fn build_exchange(&self) -> CliResult<Exchange> {
        let key_manager = KeyManager::load(&self.key_source(), self.expected_signer()?)?;
        self.exchange_with_key(key_manager)
    }

    pub fn exchange_with_key(&self, key_manager: KeyManager) -> CliResult<Exchange> {
        let signer = Signer::new(Arc::new(key_manager), self.is_mainnet)?;
        let mut exchange = Exchange::new(signer, self.perp_assets.clone())
            .with_spot_assets(self.spot_assets.clone())
            .with_slippage(self.slippage)
            .with_expires_after(self.expires_after);
        if let Some(vault) = &self.vault_address {
            exchange = exchange.with_vault_address(vault)?;
        }
        Ok(exchange)
    }
}
