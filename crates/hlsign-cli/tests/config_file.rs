//! Integration tests for loading config files and keys from disk.

use std::io::Write;

use hlsign_cli::{run, AppConfig, CliError, Command};
use hlsign_signer::SignerError;
use tempfile::NamedTempFile;

const TEST_PRIVATE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write temp file");
    file
}

fn config_with_key(key_path: &str, extra: &str) -> NamedTempFile {
    write_temp(&format!(
        r#"
key_file = "{key_path}"
{extra}

[perp_assets.ETH]
asset_id = 1
sz_decimals = 4
"#
    ))
}

/// The shipped default config parses and validates.
#[test]
fn test_default_config_file_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/default.toml");
    let config = AppConfig::from_file(path).expect("default config");

    assert!(!config.is_mainnet);
    assert_eq!(config.key_env, "HLSIGN_PRIVATE_KEY");
    assert_eq!(config.perp_assets.get("ETH").expect("ETH").asset_id, 1);
}

#[test]
fn test_missing_config_file() {
    let err = AppConfig::from_file("/nonexistent/hlsign.toml").unwrap_err();
    assert!(matches!(err, CliError::Config(_)));
}

/// Key file plus matching expected address signs an order.
#[test]
fn test_sign_with_key_file() {
    let key = write_temp(&format!("{TEST_PRIVATE_KEY}\n"));
    let key_path = key.path().to_str().expect("utf8 path");
    let config_file = config_with_key(key_path, &format!(r#"signer_address = "{TEST_ADDRESS}""#));

    let config =
        AppConfig::from_file(config_file.path().to_str().expect("utf8 path")).expect("config");
    let command = Command::Order {
        coin: "ETH".to_string(),
        size: 0.1,
        price: 2500.0,
        tif: "Ioc".to_string(),
        reduce_only: false,
        cloid: None,
    };
    let out = run(&command, || config.build_exchange()).expect("signed order");

    assert_eq!(out["action"]["orders"][0]["s"], "0.1");
    assert_eq!(out["action"]["orders"][0]["p"], "2500");
    assert!(out.get("vaultAddress").is_none());
}

/// A key that does not derive the configured address is rejected.
#[test]
fn test_signer_address_mismatch() {
    let key = write_temp(TEST_PRIVATE_KEY);
    let key_path = key.path().to_str().expect("utf8 path");
    let config_file = config_with_key(
        key_path,
        r#"signer_address = "0x0000000000000000000000000000000000000001""#,
    );

    let config =
        AppConfig::from_file(config_file.path().to_str().expect("utf8 path")).expect("config");
    let err = config.build_exchange().unwrap_err();
    assert!(matches!(
        err,
        CliError::Signer(SignerError::AddressMismatch { .. })
    ));
}

#[test]
fn test_vault_address_in_payload() {
    let key = write_temp(TEST_PRIVATE_KEY);
    let key_path = key.path().to_str().expect("utf8 path");
    let config_file = config_with_key(
        key_path,
        r#"vault_address = "0x1719884eb866cb12b2287399b15f7db5e7d775ea""#,
    );

    let config =
        AppConfig::from_file(config_file.path().to_str().expect("utf8 path")).expect("config");
    let command = Command::Cancel {
        coin: "ETH".to_string(),
        oid: 77,
    };
    let out = run(&command, || config.build_exchange()).expect("signed cancel");

    assert_eq!(
        out["vaultAddress"],
        "0x1719884eb866cb12b2287399b15f7db5e7d775ea"
    );
    assert_eq!(out["action"]["cancels"][0]["o"], 77);
}
