//! Subcommands and their dispatch.

use clap::Subcommand;
use hlsign_core::{ClientOrderId, MarketKind};
use hlsign_signer::{next_nonce, Exchange, SignedAction};
use serde_json::{json, Value};
use tracing::info;

use crate::error::CliResult;

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Sign a perp limit order. A negative size sells.
    Order {
        coin: String,
        #[arg(allow_negative_numbers = true)]
        size: f64,
        price: f64,
        /// Gtc, Ioc or Alo.
        #[arg(long, default_value = "Gtc")]
        tif: String,
        #[arg(long)]
        reduce_only: bool,
        /// 0x-prefixed 128-bit client order id.
        #[arg(long)]
        cloid: Option<String>,
    },
    /// Sign an IOC order priced at mid +/- slippage. A negative size sells.
    Market {
        coin: String,
        #[arg(allow_negative_numbers = true)]
        size: f64,
        mid: f64,
        /// Overrides the configured slippage.
        #[arg(long)]
        slippage: Option<f64>,
        #[arg(long)]
        spot: bool,
    },
    /// Sign a cancel by exchange order id.
    Cancel { coin: String, oid: u64 },
    /// Sign a cancel by client order id.
    CancelCloid { coin: String, cloid: String },
    /// Sign a leverage update. Cross margin unless --isolated.
    Leverage {
        coin: String,
        leverage: u32,
        #[arg(long)]
        isolated: bool,
    },
    /// Sign a USDC withdrawal.
    Withdraw { destination: String, amount: f64 },
    /// Print the next nonce.
    Nonce,
}

/// Execute a command and return the JSON to print.
///
/// `exchange` is only invoked for commands that sign, so `nonce` works
/// without a key.
pub fn run<F>(command: &Command, exchange: F) -> CliResult<Value>
where
    F: FnOnce() -> CliResult<Exchange>,
{
    let signed = match command {
        Command::Nonce => return Ok(json!({ "nonce": next_nonce() })),
        Command::Order {
            coin,
            size,
            price,
            tif,
            reduce_only,
            cloid,
        } => exchange()?.limit_order(
            coin,
            *size,
            *price,
            tif,
            *reduce_only,
            cloid.as_deref().map(ClientOrderId::from),
        )?,
        Command::Market {
            coin,
            size,
            mid,
            slippage,
            spot,
        } => {
            let kind = if *spot {
                MarketKind::Spot
            } else {
                MarketKind::Perp
            };
            exchange()?.market_order(coin, *size, *mid, kind, *slippage, None)?
        }
        Command::Cancel { coin, oid } => exchange()?.cancel(coin, *oid)?,
        Command::CancelCloid { coin, cloid } => {
            exchange()?.cancel_by_cloid(coin, ClientOrderId::from(cloid.as_str()))?
        }
        Command::Leverage {
            coin,
            leverage,
            isolated,
        } => exchange()?.update_leverage(coin, *leverage, !*isolated)?,
        Command::Withdraw {
            destination,
            amount,
        } => exchange()?.withdraw(destination, *amount)?,
    };

    log_signed(&signed);
    Ok(serde_json::to_value(&signed)?)
}

fn log_signed(signed: &SignedAction) {
    info!(
        action_type = signed.action.action_type(),
        nonce = signed.nonce,
        vault = signed.vault_address.as_deref().unwrap_or("-"),
        "Action signed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::error::CliError;
    use hlsign_signer::{KeyManager, SignerError};

    const TEST_PRIVATE_KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    const CONFIG: &str = r#"
[perp_assets.ETH]
asset_id = 1
sz_decimals = 4

[spot_assets.PURR]
asset_id = 0
sz_decimals = 0
"#;

    fn exchange() -> CliResult<Exchange> {
        let config = AppConfig::from_toml(CONFIG)?;
        config.exchange_with_key(KeyManager::from_hex(TEST_PRIVATE_KEY, None)?)
    }

    #[test]
    fn test_nonce_needs_no_key() {
        let out = run(&Command::Nonce, || {
            Err(CliError::Config("no key".to_string()))
        })
        .unwrap();
        assert!(out["nonce"].as_u64().unwrap() > 1_600_000_000_000);
    }

    #[test]
    fn test_order_command() {
        let command = Command::Order {
            coin: "ETH".to_string(),
            size: -0.25,
            price: 2500.0,
            tif: "Alo".to_string(),
            reduce_only: true,
            cloid: Some("0x0de3e244a8f44fc28a6b7bc852d66d19".to_string()),
        };
        let out = run(&command, exchange).unwrap();

        let order = &out["action"]["orders"][0];
        assert_eq!(order["a"], 1);
        assert_eq!(order["b"], false);
        assert_eq!(order["s"], "0.25");
        assert_eq!(order["r"], true);
        assert_eq!(order["t"]["limit"]["tif"], "Alo");
        assert_eq!(order["c"], "0x0de3e244a8f44fc28a6b7bc852d66d19");
        assert!(out["signature"]["r"].as_str().unwrap().starts_with("0x"));
    }

    #[test]
    fn test_market_spot_command() {
        let command = Command::Market {
            coin: "PURR".to_string(),
            size: 100.0,
            mid: 0.2,
            slippage: Some(0.05),
            spot: true,
        };
        let out = run(&command, exchange).unwrap();

        let order = &out["action"]["orders"][0];
        assert_eq!(order["a"], 10000);
        assert_eq!(order["p"], "0.21");
        assert_eq!(order["t"]["limit"]["tif"], "Ioc");
    }

    #[test]
    fn test_leverage_isolated() {
        let command = Command::Leverage {
            coin: "ETH".to_string(),
            leverage: 5,
            isolated: true,
        };
        let out = run(&command, exchange).unwrap();
        assert_eq!(out["action"]["type"], "updateLeverage");
        assert_eq!(out["action"]["isCross"], false);
        assert_eq!(out["action"]["leverage"], 5);
    }

    #[test]
    fn test_withdraw_command() {
        let command = Command::Withdraw {
            destination: "0x0000000000000000000000000000000000000001".to_string(),
            amount: 12.5,
        };
        let out = run(&command, exchange).unwrap();
        assert_eq!(out["action"]["type"], "withdraw3");
        assert_eq!(out["action"]["amount"], "12.5");
        assert_eq!(out["action"]["time"], out["nonce"]);
    }

    #[test]
    fn test_unknown_coin_surfaces_signer_error() {
        let command = Command::Cancel {
            coin: "DOGE".to_string(),
            oid: 1,
        };
        let err = run(&command, exchange).unwrap_err();
        assert!(matches!(err, CliError::Signer(SignerError::Core(_))));
    }
}
