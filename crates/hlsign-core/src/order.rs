//! Order request types and identifiers.
//!
//! These are the caller-facing shapes. Conversion into wire structs happens
//! in the signer crate, which owns the canonical encoding.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;

/// Time-in-force for limit orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good-til-cancelled.
    #[default]
    #[serde(rename = "Gtc")]
    GoodTilCancelled,
    /// Immediate-or-cancel.
    #[serde(rename = "Ioc")]
    ImmediateOrCancel,
    /// Add-liquidity-only.
    #[serde(rename = "Alo")]
    AddLiquidityOnly,
}

impl TimeInForce {
    /// Wire name ("Gtc", "Ioc", "Alo").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GoodTilCancelled => "Gtc",
            Self::ImmediateOrCancel => "Ioc",
            Self::AddLiquidityOnly => "Alo",
        }
    }
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeInForce {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Gtc" => Ok(Self::GoodTilCancelled),
            "Ioc" => Ok(Self::ImmediateOrCancel),
            "Alo" => Ok(Self::AddLiquidityOnly),
            other => Err(CoreError::InvalidOrder(format!(
                "invalid time in force: {other}. Available types: Gtc, Ioc, Alo"
            ))),
        }
    }
}

/// Trigger kind: take profit or stop loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TpSl {
    Tp,
    Sl,
}

impl TpSl {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tp => "tp",
            Self::Sl => "sl",
        }
    }
}

impl fmt::Display for TpSl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order grouping for a batch.
///
/// "na" = independent orders, "normalTpsl" / "positionTpsl" = TP/SL linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Grouping {
    #[default]
    #[serde(rename = "na")]
    Na,
    #[serde(rename = "normalTpsl")]
    NormalTpsl,
    #[serde(rename = "positionTpsl")]
    PositionTpsl,
}

/// Order type as requested by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    Limit {
        tif: TimeInForce,
    },
    Trigger {
        trigger_price: f64,
        is_market: bool,
        tpsl: TpSl,
    },
}

impl OrderKind {
    pub fn limit(tif: TimeInForce) -> Self {
        Self::Limit { tif }
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
}

/// Order request in caller units (floats, coin symbol).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub coin: String,
    pub is_buy: bool,
    pub size: f64,
    pub limit_price: f64,
    pub order_kind: OrderKind,
    pub reduce_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloid: Option<ClientOrderId>,
}

impl OrderRequest {
    /// Limit order with the given time-in-force.
    pub fn limit(
        coin: impl Into<String>,
        is_buy: bool,
        size: f64,
        limit_price: f64,
        tif: TimeInForce,
    ) -> Self {
        Self {
            coin: coin.into(),
            is_buy,
            size,
            limit_price,
            order_kind: OrderKind::limit(tif),
            reduce_only: false,
            cloid: None,
        }
    }

    pub fn with_reduce_only(mut self, reduce_only: bool) -> Self {
        self.reduce_only = reduce_only;
        self
    }

    pub fn with_cloid(mut self, cloid: ClientOrderId) -> Self {
        self.cloid = Some(cloid);
        self
    }
}

/// Modification of a resting order, addressed by exchange order id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifyRequest {
    pub oid: u64,
    pub order: OrderRequest,
}

/// Client order ID.
///
/// The exchange expects a 128-bit value rendered as `0x` + 32 hex chars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientOrderId(String);

impl ClientOrderId {
    /// Create a new random client order ID.
    pub fn new() -> Self {
        Self(format!("0x{}", hex::encode(Uuid::new_v4().as_bytes())))
    }

    /// Create from an existing string (opaque, not validated).
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClientOrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ClientOrderId {
    fn from(s: String) -> Self {
        Self::from_string(s)
    }
}

impl From<&str> for ClientOrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ClientOrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Side implied by a signed size: positive buys, zero or negative sells.
pub fn is_buy(signed_size: f64) -> bool {
    signed_size > 0.0
}
