//! Key management and EIP-712 signing.
//!
//! Core actions are signed in two stages:
//! 1. Calculate `action_hash` from action + nonce + vault_address + expires_after
//! 2. Sign the phantom agent `{source, connectionId: action_hash}` using EIP-712
//!
//! User-signed actions skip stage 1 and sign their own fields.

use std::path::PathBuf;
use std::sync::Arc;

use alloy::primitives::{Address, Signature as PrimitiveSignature, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use serde::Serialize;
use tracing::debug;
use zeroize::Zeroizing;

use crate::action::{Action, SigningInput, Withdraw3};
use crate::envelope::{withdraw_fields, SignEnvelope, TypedField, WITHDRAW_PRIMARY_TYPE};
use crate::error::{SignerError, SignerResult};

// =============================================================================
// KeySource and KeyManager
// =============================================================================

/// Source of the private key.
#[derive(Debug, Clone)]
pub enum KeySource {
    /// Load from environment variable (development).
    EnvVar { var_name: String },
    /// Load from file (production, recommend 0600 permissions).
    File { path: PathBuf },
}

/// Holds the trading key.
///
/// Never log private key material.
pub struct KeyManager {
    trading_signer: Option<PrivateKeySigner>,
}

impl KeyManager {
    /// Load the key from the given source and verify its address.
    ///
    /// # Errors
    /// - `KeyEnvVarNotFound` / `Io` if the source cannot be read
    /// - `HexDecode` / `InvalidKey` for malformed key material
    /// - `AddressMismatch` if `expected_address` differs from the derived one
    pub fn load(source: &KeySource, expected_address: Option<Address>) -> SignerResult<Self> {
        match source {
            KeySource::EnvVar { var_name } => {
                let key_hex = Zeroizing::new(
                    std::env::var(var_name)
                        .map_err(|_| SignerError::KeyEnvVarNotFound(var_name.clone()))?,
                );
                Self::from_hex(&key_hex, expected_address)
            }
            KeySource::File { path } => {
                let content = Zeroizing::new(std::fs::read_to_string(path)?);
                Self::from_hex(&content, expected_address)
            }
        }
    }

    /// Parse a hex key (optional `0x`, surrounding whitespace ignored).
    pub fn from_hex(hex_str: &str, expected_address: Option<Address>) -> SignerResult<Self> {
        let trimmed = hex_str.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let secret_bytes = Zeroizing::new(hex::decode(digits)?);
        Self::from_bytes(&secret_bytes, expected_address)
    }

    pub fn from_bytes(secret_bytes: &[u8], expected_address: Option<Address>) -> SignerResult<Self> {
        let signer = PrivateKeySigner::from_slice(secret_bytes)
            .map_err(|e| SignerError::InvalidKey(e.to_string()))?;

        if let Some(expected) = expected_address {
            if signer.address() != expected {
                return Err(SignerError::AddressMismatch {
                    expected,
                    actual: signer.address(),
                });
            }
        }

        Ok(Self {
            trading_signer: Some(signer),
        })
    }

    /// Key manager without a key. Signing through it fails with `NoTradingKey`.
    pub fn empty() -> Self {
        Self {
            trading_signer: None,
        }
    }

    pub fn trading_signer(&self) -> Option<&PrivateKeySigner> {
        self.trading_signer.as_ref()
    }

    pub fn trading_address(&self) -> Option<Address> {
        self.trading_signer.as_ref().map(PrivateKeySigner::address)
    }
}

impl std::fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyManager")
            .field("trading_address", &self.trading_address())
            .finish()
    }
}

// =============================================================================
// Signature
// =============================================================================

/// Recoverable secp256k1 signature with `v` in {27, 28}.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub r: B256,
    pub s: B256,
    pub v: u8,
}

impl Signature {
    /// `r || s || v`
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[..32].copy_from_slice(self.r.as_slice());
        bytes[32..64].copy_from_slice(self.s.as_slice());
        bytes[64] = self.v;
        bytes
    }
}

impl From<&PrimitiveSignature> for Signature {
    fn from(sig: &PrimitiveSignature) -> Self {
        Self {
            r: B256::from(sig.r().to_be_bytes::<32>()),
            s: B256::from(sig.s().to_be_bytes::<32>()),
            // alloy reports the y-parity bit; the exchange expects 27/28
            v: 27 + u8::from(sig.v()),
        }
    }
}

/// Sign an envelope's EIP-712 hash.
///
/// # Errors
/// `TypedData` for an inconsistent envelope, `Signing` if ECDSA fails.
pub fn sign_envelope(envelope: &SignEnvelope, key: &PrivateKeySigner) -> SignerResult<Signature> {
    let hash = envelope.signing_hash()?;
    let signature = key.sign_hash_sync(&hash)?;
    Ok(Signature::from(&signature))
}

// =============================================================================
// Signer
// =============================================================================

/// Signs Hyperliquid actions for one network.
pub struct Signer {
    key_manager: Arc<KeyManager>,
    is_mainnet: bool,
}

impl Signer {
    /// # Errors
    /// Returns `SignerError::NoTradingKey` if the KeyManager has no trading key.
    pub fn new(key_manager: Arc<KeyManager>, is_mainnet: bool) -> SignerResult<Self> {
        if key_manager.trading_signer().is_none() {
            return Err(SignerError::NoTradingKey);
        }
        Ok(Self {
            key_manager,
            is_mainnet,
        })
    }

    fn key(&self) -> SignerResult<&PrivateKeySigner> {
        self.key_manager
            .trading_signer()
            .ok_or(SignerError::NoTradingKey)
    }

    /// Sign any envelope with the trading key.
    pub fn sign_envelope(&self, envelope: &SignEnvelope) -> SignerResult<Signature> {
        sign_envelope(envelope, self.key()?)
    }

    /// Sign an action, choosing the envelope from the action kind.
    pub fn sign_action(&self, input: &SigningInput) -> SignerResult<Signature> {
        match &input.action {
            Action::Withdraw3(withdraw) => self.sign_withdraw(withdraw),
            _ => self.sign_l1_action(input),
        }
    }

    /// Hash the action and sign the phantom agent over it.
    pub fn sign_l1_action(&self, input: &SigningInput) -> SignerResult<Signature> {
        let action_hash = input.action_hash()?;
        debug!(
            action_type = input.action.action_type(),
            nonce = input.nonce,
            vault = input.vault_address.is_some(),
            "Signing L1 action"
        );
        self.sign_envelope(&SignEnvelope::l1_action(action_hash, self.is_mainnet))
    }

    /// Sign a user-signed action over its own fields.
    pub fn sign_user_signed_action<T: Serialize>(
        &self,
        action: &T,
        fields: Vec<TypedField>,
        primary_type: &str,
    ) -> SignerResult<Signature> {
        let envelope = SignEnvelope::user_signed(action, fields, primary_type, self.is_mainnet)?;
        debug!(primary_type, "Signing user-signed action");
        self.sign_envelope(&envelope)
    }

    pub fn sign_withdraw(&self, action: &Withdraw3) -> SignerResult<Signature> {
        self.sign_user_signed_action(action, withdraw_fields(), WITHDRAW_PRIMARY_TYPE)
    }

    pub fn trading_address(&self) -> Option<Address> {
        self.key_manager.trading_address()
    }

    pub fn is_mainnet(&self) -> bool {
        self.is_mainnet
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{BulkCancel, CancelWire};

    // Well-known test private key (DO NOT use in production)
    const TEST_PRIVATE_KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn test_key_bytes() -> Vec<u8> {
        hex::decode(TEST_PRIVATE_KEY.trim_start_matches("0x")).unwrap()
    }

    fn signer(is_mainnet: bool) -> Signer {
        let manager = Arc::new(KeyManager::from_hex(TEST_PRIVATE_KEY, None).unwrap());
        Signer::new(manager, is_mainnet).unwrap()
    }

    fn withdraw() -> Withdraw3 {
        Withdraw3 {
            destination: "0x5e9ee1089755c3435139848e47e6635505d5a13a".to_string(),
            amount: "1".to_string(),
            time: 1_700_000_000_000,
            hyperliquid_chain: "Testnet".to_string(),
            signature_chain_id: "0x66eee".to_string(),
        }
    }

    #[test]
    fn test_key_manager_from_bytes() {
        let manager = KeyManager::from_bytes(&test_key_bytes(), None).unwrap();
        assert!(manager.trading_signer().is_some());
        assert_eq!(
            manager.trading_address().unwrap(),
            TEST_ADDRESS.parse::<Address>().unwrap()
        );
    }

    #[test]
    fn test_key_manager_from_hex_trims() {
        let padded = format!("  {TEST_PRIVATE_KEY}\n");
        let manager = KeyManager::from_hex(&padded, None).unwrap();
        let unprefixed = KeyManager::from_hex(&TEST_PRIVATE_KEY[2..], None).unwrap();
        assert_eq!(manager.trading_address(), unprefixed.trading_address());
    }

    #[test]
    fn test_key_manager_address_mismatch() {
        let result = KeyManager::from_bytes(&test_key_bytes(), Some(Address::ZERO));
        assert!(matches!(result, Err(SignerError::AddressMismatch { .. })));
    }

    #[test]
    fn test_key_manager_invalid_material() {
        assert!(matches!(
            KeyManager::from_hex("0xnothex", None),
            Err(SignerError::HexDecode(_))
        ));
        assert!(matches!(
            KeyManager::from_bytes(&[0u8; 32], None),
            Err(SignerError::InvalidKey(_))
        ));
        assert!(matches!(
            KeyManager::from_bytes(&[1u8; 5], None),
            Err(SignerError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_key_manager_missing_env_var() {
        let source = KeySource::EnvVar {
            var_name: "HLSIGN_TEST_KEY_THAT_IS_NOT_SET".to_string(),
        };
        assert!(matches!(
            KeyManager::load(&source, None),
            Err(SignerError::KeyEnvVarNotFound(_))
        ));
    }

    #[test]
    fn test_key_manager_debug_hides_key() {
        let manager = KeyManager::from_hex(TEST_PRIVATE_KEY, None).unwrap();
        let debug = format!("{manager:?}");
        assert!(!debug.contains(&TEST_PRIVATE_KEY[2..]));
    }

    #[test]
    fn test_signer_no_trading_key() {
        let result = Signer::new(Arc::new(KeyManager::empty()), true);
        assert!(matches!(result, Err(SignerError::NoTradingKey)));
    }

    /// The exchange re-derives the signer from this exact signature.
    #[test]
    fn test_signature_matches_reference_vector() {
        let key = PrivateKeySigner::from_slice(&test_key_bytes()).unwrap();
        let action_hash: B256 = "0xf01fa6eaca0b8cbd2afe65f8852a2e00d35eae3d19560ece9b8a28614646e849"
            .parse()
            .unwrap();

        let envelope = SignEnvelope::l1_action(action_hash, false);
        let signature = sign_envelope(&envelope, &key).unwrap();

        assert_eq!(
            hex::encode(signature.r),
            "a9e728f2faea4febc0b6eb9c3dbbac04b375eb3869f051030d205318425faebc"
        );
        assert_eq!(
            hex::encode(signature.s),
            "7b21be7030bb979352b71494708b99d789266f0d0e1242a21e74905b683e4698"
        );
        assert_eq!(signature.v, 27);
    }

    #[test]
    fn test_signature_recovers_signer() {
        let key = PrivateKeySigner::from_slice(&test_key_bytes()).unwrap();
        let envelope = SignEnvelope::l1_action(B256::repeat_byte(0xab), true);
        let hash = envelope.signing_hash().unwrap();

        let raw = key.sign_hash_sync(&hash).unwrap();
        let recovered = raw.recover_address_from_prehash(&hash).unwrap();
        assert_eq!(recovered, key.address());

        let signature = Signature::from(&raw);
        assert!(signature.v == 27 || signature.v == 28);
        assert_eq!(signature.to_bytes()[64], signature.v);
    }

    #[test]
    fn test_sign_l1_action() {
        let input = SigningInput::new(
            Action::Cancel(BulkCancel {
                cancels: vec![CancelWire { asset: 0, oid: 42 }],
            }),
            1_234_567_890,
        );
        let signature = signer(true).sign_action(&input).unwrap();
        assert!(!signature.r.is_zero());
        assert!(!signature.s.is_zero());
        assert!(signature.v == 27 || signature.v == 28);
    }

    #[test]
    fn test_network_changes_signature() {
        let input = SigningInput::new(
            Action::Cancel(BulkCancel {
                cancels: vec![CancelWire { asset: 0, oid: 42 }],
            }),
            1_234_567_890,
        );
        let mainnet = signer(true).sign_l1_action(&input).unwrap();
        let testnet = signer(false).sign_l1_action(&input).unwrap();
        assert_ne!(mainnet, testnet);
    }

    #[test]
    fn test_sign_withdraw_uses_user_signed_envelope() {
        let signer = signer(false);
        let withdraw = withdraw();

        let via_dispatch = signer
            .sign_action(&SigningInput::new(
                Action::Withdraw3(withdraw.clone()),
                withdraw.time,
            ))
            .unwrap();
        let envelope =
            SignEnvelope::user_signed(&withdraw, withdraw_fields(), WITHDRAW_PRIMARY_TYPE, false)
                .unwrap();
        let direct = signer.sign_envelope(&envelope).unwrap();

        assert_eq!(via_dispatch, direct);
    }
}
