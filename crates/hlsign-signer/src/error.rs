//! Signer error types.

use alloy::primitives::Address;
use hlsign_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Canonical encoding failed: {0}")]
    CanonicalEncoding(String),

    #[error("Invalid vault address: {0}")]
    InvalidVaultAddress(String),

    #[error("Typed data error: {0}")]
    TypedData(String),

    #[error("Signing failed: {0}")]
    Signing(#[from] alloy::signers::Error),

    #[error("No trading key available")]
    NoTradingKey,

    #[error("Environment variable not found: {0}")]
    KeyEnvVarNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Address mismatch: expected {expected}, got {actual}")]
    AddressMismatch { expected: Address, actual: Address },

    #[error("Failed to decode hex: {0}")]
    HexDecode(#[from] hex::FromHexError),
}

pub type SignerResult<T> = Result<T, SignerError>;
