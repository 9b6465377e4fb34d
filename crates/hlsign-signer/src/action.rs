//! Action wire types and the action hash.
//!
//! Every struct here is serialized twice: as MessagePack for the hash preimage
//! and as JSON for the outgoing payload. Both encodings follow declared field
//! order, so field order in these definitions is part of the exchange contract.
//!
//! IMPORTANT: `Option<T>` fields must use `skip_serializing_if`. The exchange
//! omits missing keys, but serde defaults to serializing `None` as `nil`.

use alloy::primitives::{keccak256, Address, B256};
use hlsign_core::{
    AssetInfo, CoreResult, Grouping, MarketKind, OrderKind, OrderRequest, TimeInForce, TpSl,
};
use serde::Serialize;

use crate::error::{SignerError, SignerResult};

// =============================================================================
// Actions
// =============================================================================

/// A signable action, discriminated by its `type` field.
///
/// The tag is serialized first, followed by the payload's fields in
/// declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    Order(BulkOrder),
    Cancel(BulkCancel),
    CancelByCloid(BulkCancelCloid),
    BatchModify(BulkModify),
    UpdateLeverage(UpdateLeverage),
    Withdraw3(Withdraw3),
}

impl Action {
    /// Wire discriminator ("order", "cancel", ...).
    pub fn action_type(&self) -> &'static str {
        match self {
            Self::Order(_) => "order",
            Self::Cancel(_) => "cancel",
            Self::CancelByCloid(_) => "cancelByCloid",
            Self::BatchModify(_) => "batchModify",
            Self::UpdateLeverage(_) => "updateLeverage",
            Self::Withdraw3(_) => "withdraw3",
        }
    }

    /// Whether the action is signed with its own fields rather than through
    /// the "Agent" envelope.
    pub fn is_user_signed(&self) -> bool {
        matches!(self, Self::Withdraw3(_))
    }
}

/// Order batch: `{type, orders, grouping, builder?}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkOrder {
    pub orders: Vec<OrderWire>,
    pub grouping: Grouping,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builder: Option<BuilderInfo>,
}

/// Builder fee attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuilderInfo {
    /// Builder address, lowercase hex.
    #[serde(rename = "b")]
    pub address: String,
    /// Fee in tenths of a basis point.
    #[serde(rename = "f")]
    pub fee: u64,
}

/// Cancel batch by exchange order id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkCancel {
    pub cancels: Vec<CancelWire>,
}

/// Cancel batch by client order id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkCancelCloid {
    pub cancels: Vec<CancelCloidWire>,
}

/// Modify batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkModify {
    pub modifies: Vec<ModifyWire>,
}

/// Leverage change for one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeverage {
    pub asset: u32,
    pub is_cross: bool,
    pub leverage: u32,
}

/// USDC withdrawal to an external address.
///
/// Signed through the "HyperliquidSignTransaction" domain, so
/// `signature_chain_id` travels with the action but is not part of the
/// signed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdraw3 {
    pub destination: String,
    pub amount: String,
    pub time: u64,
    pub hyperliquid_chain: String,
    pub signature_chain_id: String,
}

// =============================================================================
// Wire Format Types
// =============================================================================

/// Order wire format.
///
/// Keys are the exchange's short names: `a`, `b`, `p`, `s`, `r`, `t`, `c`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderWire {
    /// Asset index
    #[serde(rename = "a")]
    pub asset: u32,
    /// Buy (true) or Sell (false)
    #[serde(rename = "b")]
    pub is_buy: bool,
    /// Limit price as string
    #[serde(rename = "p")]
    pub limit_px: String,
    /// Size as string
    #[serde(rename = "s")]
    pub sz: String,
    /// Reduce-only flag
    #[serde(rename = "r")]
    pub reduce_only: bool,
    /// Order type
    #[serde(rename = "t")]
    pub order_type: OrderTypeWire,
    /// Client order ID (optional)
    #[serde(rename = "c", skip_serializing_if = "Option::is_none")]
    pub cloid: Option<String>,
}

impl OrderWire {
    /// Encode an order request with the asset's precision rules.
    ///
    /// # Errors
    /// Propagates `CoreError` from the numeric encoder (non-finite price or
    /// size, out-of-range precision).
    pub fn from_request(
        request: &OrderRequest,
        info: &AssetInfo,
        kind: MarketKind,
    ) -> CoreResult<Self> {
        Ok(Self {
            asset: kind.wire_asset(info.asset_id)?,
            is_buy: request.is_buy,
            limit_px: info.render_price(request.limit_price, kind)?,
            sz: info.render_size(request.size)?,
            reduce_only: request.reduce_only,
            order_type: OrderTypeWire::from_kind(&request.order_kind, info, kind)?,
            cloid: request.cloid.as_ref().map(ToString::to_string),
        })
    }
}

/// Order type wire format.
///
/// - Limit: `{"limit": {"tif": "Gtc"|"Ioc"|"Alo"}}`
/// - Trigger: `{"trigger": {"isMarket": true, "triggerPx": "...", "tpsl": "tp"}}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OrderTypeWire {
    Limit { limit: LimitOrderType },
    Trigger { trigger: TriggerOrderType },
}

impl OrderTypeWire {
    pub fn limit(tif: TimeInForce) -> Self {
        Self::Limit {
            limit: LimitOrderType { tif },
        }
    }

    pub fn ioc() -> Self {
        Self::limit(TimeInForce::ImmediateOrCancel)
    }

    pub fn gtc() -> Self {
        Self::limit(TimeInForce::GoodTilCancelled)
    }

    pub fn alo() -> Self {
        Self::limit(TimeInForce::AddLiquidityOnly)
    }

    /// Trigger prices follow the same rendering rules as limit prices.
    fn from_kind(kind: &OrderKind, info: &AssetInfo, market: MarketKind) -> CoreResult<Self> {
        Ok(match kind {
            OrderKind::Limit { tif } => Self::limit(*tif),
            OrderKind::Trigger {
                trigger_price,
                is_market,
                tpsl,
            } => Self::Trigger {
                trigger: TriggerOrderType {
                    is_market: *is_market,
                    trigger_px: info.render_price(*trigger_price, market)?,
                    tpsl: *tpsl,
                },
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitOrderType {
    pub tif: TimeInForce,
}

/// Trigger order type.
///
/// Field order: isMarket -> triggerPx -> tpsl
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerOrderType {
    #[serde(rename = "isMarket")]
    pub is_market: bool,
    #[serde(rename = "triggerPx")]
    pub trigger_px: String,
    pub tpsl: TpSl,
}

/// Cancel by oid: `{"a": 5, "o": 123456789}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelWire {
    #[serde(rename = "a")]
    pub asset: u32,
    #[serde(rename = "o")]
    pub oid: u64,
}

/// Cancel by cloid: `{"asset": 5, "cloid": "0x..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelCloidWire {
    pub asset: u32,
    pub cloid: String,
}

/// Modify: `{"oid": 123, "order": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModifyWire {
    pub oid: u64,
    pub order: OrderWire,
}

// =============================================================================
// SigningInput and action_hash
// =============================================================================

/// Parse a vault address. The `0x` prefix is optional.
///
/// # Errors
/// `InvalidVaultAddress` unless the input is exactly 20 hex-encoded bytes.
pub fn parse_vault_address(vault: &str) -> SignerResult<Address> {
    let trimmed = vault.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes =
        hex::decode(digits).map_err(|e| SignerError::InvalidVaultAddress(format!("{vault}: {e}")))?;
    if bytes.len() != Address::len_bytes() {
        return Err(SignerError::InvalidVaultAddress(format!(
            "{vault}: expected 20 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(Address::from_slice(&bytes))
}

/// Hash an action with an optional hex vault address.
///
/// # Errors
/// `InvalidVaultAddress` for malformed vault hex, `CanonicalEncoding` if the
/// action cannot be encoded.
pub fn action_hash(action: &Action, vault_address: Option<&str>, nonce: u64) -> SignerResult<B256> {
    let vault = vault_address.map(parse_vault_address).transpose()?;
    hash_action(action, nonce, vault, None)
}

/// Keccak-256 over the hash preimage:
///
/// ```text
/// msgpack(action) || nonce (8 bytes BE) || 0x00
/// msgpack(action) || nonce (8 bytes BE) || 0x01 || vault (20 bytes)
/// ... || 0x00 || expires_after (8 bytes BE)      when an expiry is set
/// ```
///
/// The vault marker is always present; the expiry suffix only when set.
pub fn hash_action(
    action: &Action,
    nonce: u64,
    vault_address: Option<Address>,
    expires_after: Option<u64>,
) -> SignerResult<B256> {
    let mut data = rmp_serde::to_vec_named(action)
        .map_err(|e| SignerError::CanonicalEncoding(e.to_string()))?;

    data.extend_from_slice(&nonce.to_be_bytes());

    match vault_address {
        None => data.push(0x00),
        Some(addr) => {
            data.push(0x01);
            data.extend_from_slice(addr.as_slice());
        }
    }

    if let Some(expires) = expires_after {
        data.push(0x00);
        data.extend_from_slice(&expires.to_be_bytes());
    }

    Ok(keccak256(&data))
}

/// Signing input parameters.
#[derive(Debug, Clone)]
pub struct SigningInput {
    pub action: Action,
    pub nonce: u64,
    /// None = normal trading, Some = vault trading
    pub vault_address: Option<Address>,
    /// Signature expiration (optional)
    pub expires_after: Option<u64>,
}

impl SigningInput {
    pub fn new(action: Action, nonce: u64) -> Self {
        Self {
            action,
            nonce,
            vault_address: None,
            expires_after: None,
        }
    }

    pub fn with_vault(mut self, vault_address: Option<Address>) -> Self {
        self.vault_address = vault_address;
        self
    }

    pub fn with_expires_after(mut self, expires_after: Option<u64>) -> Self {
        self.expires_after = expires_after;
        self
    }

    /// # Errors
    /// Returns `SignerError::CanonicalEncoding` if msgpack serialization fails.
    pub fn action_hash(&self) -> SignerResult<B256> {
        hash_action(
            &self.action,
            self.nonce,
            self.vault_address,
            self.expires_after,
        )
    }
}

// =============================================================================
// Tests
// =============================================================================
