//! Exchange action builder.
//!
//! Turns caller requests into signed payloads ready for the `/exchange`
//! endpoint. Transport is out of scope: the output is a [`SignedAction`]
//! that serializes to the request body.

use std::sync::Arc;

use alloy::primitives::Address;
use hlsign_core::{
    is_buy, render_size, slippage_price, AssetInfo, AssetTable, ClientOrderId, CoreError,
    Grouping, MarketKind, ModifyRequest, OrderKind, OrderRequest, TimeInForce, DEFAULT_SLIPPAGE,
};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::action::{
    parse_vault_address, Action, BuilderInfo, BulkCancel, BulkCancelCloid, BulkModify, BulkOrder,
    CancelCloidWire, CancelWire, ModifyWire, OrderWire, SigningInput, UpdateLeverage, Withdraw3,
};
use crate::envelope::SignEnvelope;
use crate::error::SignerResult;
use crate::nonce::{GlobalNonce, NonceSource};
use crate::signer::{Signature, Signer};

/// USDC amounts are rendered with two decimals.
pub const USDC_SZ_DECIMALS: u32 = 2;

// =============================================================================
// Payloads
// =============================================================================

/// Signature components as the exchange expects them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionSignature {
    /// r component (hex with 0x prefix, e.g., "0x1a2b...").
    pub r: String,
    /// s component (hex with 0x prefix, e.g., "0x3c4d...").
    pub s: String,
    /// v component (recovery id, 27 or 28).
    pub v: u8,
}

impl ActionSignature {
    /// Create from raw signature bytes (65 bytes: r(32) + s(32) + v(1)).
    ///
    /// Normalizes v from 0/1 to 27/28.
    pub fn from_bytes(bytes: &[u8; 65]) -> Self {
        let v_raw = bytes[64];
        let v = if v_raw < 27 { v_raw + 27 } else { v_raw };
        Self {
            r: format!("0x{}", hex::encode(&bytes[0..32])),
            s: format!("0x{}", hex::encode(&bytes[32..64])),
            v,
        }
    }
}

impl From<Signature> for ActionSignature {
    fn from(signature: Signature) -> Self {
        Self::from_bytes(&signature.to_bytes())
    }
}

/// Action and nonce, not yet signed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnsignedAction {
    pub action: Action,
    pub nonce: u64,
}

/// Signed action ready for transmission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedAction {
    pub action: Action,
    pub nonce: u64,
    pub signature: ActionSignature,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_after: Option<u64>,
}

/// Cancel by exchange order id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelRequest {
    pub coin: String,
    pub oid: u64,
}

/// Cancel by client order id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelByCloidRequest {
    pub coin: String,
    pub cloid: ClientOrderId,
}

// =============================================================================
// Exchange
// =============================================================================

/// Builds and signs exchange actions for one account.
pub struct Exchange {
    signer: Signer,
    perp_assets: AssetTable,
    spot_assets: AssetTable,
    vault_address: Option<Address>,
    expires_after: Option<u64>,
    slippage: f64,
    nonces: Arc<dyn NonceSource>,
}

impl Exchange {
    /// Exchange over perp assets, using the process-wide nonce counter.
    pub fn new(signer: Signer, perp_assets: AssetTable) -> Self {
        Self {
            signer,
            perp_assets,
            spot_assets: AssetTable::new(),
            vault_address: None,
            expires_after: None,
            slippage: DEFAULT_SLIPPAGE,
            nonces: Arc::new(GlobalNonce),
        }
    }

    pub fn with_spot_assets(mut self, spot_assets: AssetTable) -> Self {
        self.spot_assets = spot_assets;
        self
    }

    /// Trade on behalf of a vault or sub-account.
    ///
    /// # Errors
    /// `InvalidVaultAddress` if `vault` is not 20 hex-encoded bytes.
    pub fn with_vault_address(mut self, vault: &str) -> SignerResult<Self> {
        self.vault_address = Some(parse_vault_address(vault)?);
        Ok(self)
    }

    pub fn with_expires_after(mut self, expires_after: Option<u64>) -> Self {
        self.expires_after = expires_after;
        self
    }

    /// Default slippage for market orders.
    pub fn with_slippage(mut self, slippage: f64) -> Self {
        self.slippage = slippage;
        self
    }

    pub fn with_nonce_source(mut self, nonces: Arc<dyn NonceSource>) -> Self {
        self.nonces = nonces;
        self
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    pub fn is_mainnet(&self) -> bool {
        self.signer.is_mainnet()
    }

    fn assets(&self, kind: MarketKind) -> &AssetTable {
        match kind {
            MarketKind::Perp => &self.perp_assets,
            MarketKind::Spot => &self.spot_assets,
        }
    }

    /// Perp table first, then spot.
    fn resolve(&self, coin: &str) -> SignerResult<(&AssetInfo, MarketKind)> {
        if let Ok(info) = self.perp_assets.get(coin) {
            return Ok((info, MarketKind::Perp));
        }
        let info = self.spot_assets.get(coin)?;
        Ok((info, MarketKind::Spot))
    }

    fn order_wire(&self, request: &OrderRequest, kind: MarketKind) -> SignerResult<OrderWire> {
        let info = self.assets(kind).get(&request.coin)?;
        Ok(OrderWire::from_request(request, info, kind)?)
    }

    /// `(signatureChainId, hyperliquidChain)` for user-signed actions.
    fn chain_params(&self) -> (&'static str, &'static str) {
        if self.is_mainnet() {
            ("0xa4b1", "Mainnet")
        } else {
            ("0x66eee", "Testnet")
        }
    }

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    /// Encode an order batch without signing it.
    pub fn create_unsigned_order(
        &self,
        requests: &[OrderRequest],
        kind: MarketKind,
        grouping: Grouping,
        builder: Option<BuilderInfo>,
    ) -> SignerResult<UnsignedAction> {
        let orders = requests
            .iter()
            .map(|request| self.order_wire(request, kind))
            .collect::<SignerResult<Vec<_>>>()?;
        let nonce = self.nonces.next_nonce();
        debug!(orders = orders.len(), %kind, nonce, "Built order action");
        Ok(UnsignedAction {
            action: Action::Order(BulkOrder {
                orders,
                grouping,
                builder,
            }),
            nonce,
        })
    }

    /// Sign a previously built action with this exchange's vault and expiry.
    pub fn sign_unsigned(&self, unsigned: UnsignedAction) -> SignerResult<SignedAction> {
        self.sign(unsigned.action, unsigned.nonce)
    }

    /// Typed-data document an external wallet would sign for `unsigned`.
    pub fn build_order_typed_data(&self, unsigned: &UnsignedAction) -> SignerResult<Value> {
        let input = SigningInput::new(unsigned.action.clone(), unsigned.nonce)
            .with_vault(self.vault_address)
            .with_expires_after(self.expires_after);
        let envelope = SignEnvelope::l1_action(input.action_hash()?, self.is_mainnet());
        Ok(envelope.to_typed_data())
    }

    pub fn bulk_orders(
        &self,
        requests: &[OrderRequest],
        kind: MarketKind,
        grouping: Grouping,
        builder: Option<BuilderInfo>,
    ) -> SignerResult<SignedAction> {
        let unsigned = self.create_unsigned_order(requests, kind, grouping, builder)?;
        self.sign_unsigned(unsigned)
    }

    pub fn order(&self, request: &OrderRequest, kind: MarketKind) -> SignerResult<SignedAction> {
        self.bulk_orders(std::slice::from_ref(request), kind, Grouping::Na, None)
    }

    /// Perp limit order. The sign of `size` picks the side.
    ///
    /// # Errors
    /// `InvalidOrder` unless `tif` is one of "Gtc", "Ioc", "Alo".
    pub fn limit_order(
        &self,
        coin: &str,
        size: f64,
        price: f64,
        tif: &str,
        reduce_only: bool,
        cloid: Option<ClientOrderId>,
    ) -> SignerResult<SignedAction> {
        let tif: TimeInForce = tif.parse()?;
        let request = OrderRequest {
            coin: coin.to_string(),
            is_buy: is_buy(size),
            size: size.abs(),
            limit_price: price,
            order_kind: OrderKind::limit(tif),
            reduce_only,
            cloid,
        };
        self.order(&request, MarketKind::Perp)
    }

    /// IOC order at `mid_price` moved by the slippage. The sign of `size`
    /// picks the side.
    pub fn market_order(
        &self,
        coin: &str,
        size: f64,
        mid_price: f64,
        kind: MarketKind,
        slippage: Option<f64>,
        cloid: Option<ClientOrderId>,
    ) -> SignerResult<SignedAction> {
        let buy = is_buy(size);
        let price = slippage_price(buy, mid_price, slippage.unwrap_or(self.slippage))?;
        let request = OrderRequest {
            coin: coin.to_string(),
            is_buy: buy,
            size: size.abs(),
            limit_price: price,
            order_kind: OrderKind::ioc(),
            reduce_only: false,
            cloid,
        };
        self.order(&request, kind)
    }

    pub fn bulk_modify(
        &self,
        modifies: &[ModifyRequest],
        kind: MarketKind,
    ) -> SignerResult<SignedAction> {
        let modifies = modifies
            .iter()
            .map(|m| -> SignerResult<ModifyWire> {
                Ok(ModifyWire {
                    oid: m.oid,
                    order: self.order_wire(&m.order, kind)?,
                })
            })
            .collect::<SignerResult<Vec<_>>>()?;
        self.sign_next(Action::BatchModify(BulkModify { modifies }))
    }

    // -------------------------------------------------------------------------
    // Cancels
    // -------------------------------------------------------------------------

    pub fn cancel(&self, coin: &str, oid: u64) -> SignerResult<SignedAction> {
        self.bulk_cancel(&[CancelRequest {
            coin: coin.to_string(),
            oid,
        }])
    }

    pub fn bulk_cancel(&self, cancels: &[CancelRequest]) -> SignerResult<SignedAction> {
        let cancels = cancels
            .iter()
            .map(|c| -> SignerResult<CancelWire> {
                let (info, kind) = self.resolve(&c.coin)?;
                Ok(CancelWire {
                    asset: kind.wire_asset(info.asset_id)?,
                    oid: c.oid,
                })
            })
            .collect::<SignerResult<Vec<_>>>()?;
        self.sign_next(Action::Cancel(BulkCancel { cancels }))
    }

    pub fn cancel_by_cloid(&self, coin: &str, cloid: ClientOrderId) -> SignerResult<SignedAction> {
        self.bulk_cancel_by_cloid(&[CancelByCloidRequest {
            coin: coin.to_string(),
            cloid,
        }])
    }

    pub fn bulk_cancel_by_cloid(
        &self,
        cancels: &[CancelByCloidRequest],
    ) -> SignerResult<SignedAction> {
        let cancels = cancels
            .iter()
            .map(|c| -> SignerResult<CancelCloidWire> {
                let (info, kind) = self.resolve(&c.coin)?;
                Ok(CancelCloidWire {
                    asset: kind.wire_asset(info.asset_id)?,
                    cloid: c.cloid.to_string(),
                })
            })
            .collect::<SignerResult<Vec<_>>>()?;
        self.sign_next(Action::CancelByCloid(BulkCancelCloid { cancels }))
    }

    // -------------------------------------------------------------------------
    // Account
    // -------------------------------------------------------------------------

    /// Set leverage for a perp asset.
    ///
    /// # Errors
    /// `InvalidOrder` for zero leverage, `UnknownAsset` for unknown coins.
    pub fn update_leverage(
        &self,
        coin: &str,
        leverage: u32,
        is_cross: bool,
    ) -> SignerResult<SignedAction> {
        if leverage == 0 {
            return Err(CoreError::InvalidOrder("leverage must be at least 1".to_string()).into());
        }
        let info = self.perp_assets.get(coin)?;
        self.sign_next(Action::UpdateLeverage(UpdateLeverage {
            asset: info.asset_id,
            is_cross,
            leverage,
        }))
    }

    /// Withdraw USDC to `destination`. The nonce doubles as the action time.
    pub fn withdraw(&self, destination: &str, amount: f64) -> SignerResult<SignedAction> {
        let nonce = self.nonces.next_nonce();
        let (signature_chain_id, hyperliquid_chain) = self.chain_params();
        let action = Action::Withdraw3(Withdraw3 {
            destination: destination.to_string(),
            amount: render_size(amount, USDC_SZ_DECIMALS)?,
            time: nonce,
            hyperliquid_chain: hyperliquid_chain.to_string(),
            signature_chain_id: signature_chain_id.to_string(),
        });
        self.sign(action, nonce)
    }

    // -------------------------------------------------------------------------
    // Signing
    // -------------------------------------------------------------------------

    fn sign_next(&self, action: Action) -> SignerResult<SignedAction> {
        let nonce = self.nonces.next_nonce();
        self.sign(action, nonce)
    }

    /// Vault and expiry apply to core actions only; user-signed actions carry
    /// neither.
    fn sign(&self, action: Action, nonce: u64) -> SignerResult<SignedAction> {
        let (vault_address, expires_after) = if action.is_user_signed() {
            (None, None)
        } else {
            (self.vault_address, self.expires_after)
        };

        let input = SigningInput::new(action, nonce)
            .with_vault(vault_address)
            .with_expires_after(expires_after);
        let signature = self.signer.sign_action(&input)?;

        debug!(
            action_type = input.action.action_type(),
            nonce,
            "Signed action"
        );

        Ok(SignedAction {
            action: input.action,
            nonce,
            signature: signature.into(),
            vault_address: vault_address.map(|addr| format!("0x{}", hex::encode(addr))),
            expires_after,
        })
    }
}

impl std::fmt::Debug for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exchange")
            .field("address", &self.signer.trading_address())
            .field("is_mainnet", &self.is_mainnet())
            .field("perp_assets", &self.perp_assets.len())
            .field("spot_assets", &self.spot_assets.len())
            .field("vault_address", &self.vault_address)
            .finish()
    }
}
