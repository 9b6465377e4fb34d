//! Action signing for Hyperliquid.
//!
//! Pipeline: request -> wire action -> action hash -> EIP-712 envelope -> signature.
//!
//! # Key Components
//!
//! - [`Action`]: tagged sum of every signable action, in exchange field order
//! - [`action_hash`]: Keccak-256 over msgpack(action) + nonce + vault marker
//! - [`SignEnvelope`]: EIP-712 domain, types and message for either signing shape
//! - [`Signer`]: secp256k1 signatures with `v` in {27, 28}
//! - [`NonceManager`] / [`next_nonce`]: lock-free monotonic nonces
//! - [`Exchange`]: builds signed payloads for orders, cancels, leverage and withdrawals

pub mod action;
pub mod envelope;
pub mod error;
pub mod exchange;
pub mod nonce;
pub mod signer;

// Error types
pub use error::{SignerError, SignerResult};

// Actions and hashing
pub use action::{
    action_hash, hash_action, parse_vault_address, Action, BuilderInfo, BulkCancel,
    BulkCancelCloid, BulkModify, BulkOrder, CancelCloidWire, CancelWire, LimitOrderType,
    ModifyWire, OrderTypeWire, OrderWire, SigningInput, TriggerOrderType, UpdateLeverage,
    Withdraw3,
};

// EIP-712
pub use envelope::{
    agent_fields, withdraw_fields, SignEnvelope, TypedField, ARBITRUM_CHAIN_ID,
    ARBITRUM_TESTNET_CHAIN_ID, CORE_CHAIN_ID, CORE_DOMAIN_NAME, USER_SIGNED_DOMAIN_NAME,
    WITHDRAW_PRIMARY_TYPE,
};

// Signing
pub use signer::{sign_envelope, KeyManager, KeySource, Signature, Signer};

// Nonce management
pub use nonce::{next_nonce, Clock, GlobalNonce, NonceManager, NonceSource, SystemClock};

// Exchange builder
pub use exchange::{
    ActionSignature, CancelByCloidRequest, CancelRequest, Exchange, SignedAction, UnsignedAction,
    USDC_SZ_DECIMALS,
};
