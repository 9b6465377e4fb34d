//! Asset metadata consumed by the wire encoder.
//!
//! The metadata table is built by an external collaborator (usually from the
//! `meta` / `spotMeta` info endpoints) and treated as read-only here.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::wire::{self, PERP_MAX_DECIMALS, SPOT_MAX_DECIMALS};

/// Offset added to spot asset indices on the wire.
///
/// Reference: <https://hyperliquid.gitbook.io/hyperliquid-docs/for-developers/api/asset-ids>
pub const SPOT_ASSET_OFFSET: u32 = 10_000;

/// Market category, which decides the price decimal limit and asset id space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketKind {
    #[default]
    Perp,
    Spot,
}

impl MarketKind {
    /// Maximum price decimals for this category (6 perp, 8 spot).
    pub fn max_decimals(&self) -> u32 {
        match self {
            Self::Perp => PERP_MAX_DECIMALS,
            Self::Spot => SPOT_MAX_DECIMALS,
        }
    }

    /// Asset id as it appears in order and cancel wires.
    ///
    /// # Errors
    /// `InvalidOrder` if a spot index is too large to take the offset.
    pub fn wire_asset(&self, asset_id: u32) -> CoreResult<u32> {
        match self {
            Self::Perp => Ok(asset_id),
            Self::Spot => asset_id.checked_add(SPOT_ASSET_OFFSET).ok_or_else(|| {
                CoreError::InvalidOrder(format!("spot asset id {asset_id} out of range"))
            }),
        }
    }
}

impl fmt::Display for MarketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Perp => write!(f, "perp"),
            Self::Spot => write!(f, "spot"),
        }
    }
}

/// Per-asset precision and identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    /// Size decimals (szDecimals).
    pub sz_decimals: u32,

    /// Asset index in the universe.
    pub asset_id: u32,

    /// Spot pair name (e.g., "@107"), spot assets only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spot_name: Option<String>,

    /// Token wei decimals, spot assets only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wei_decimals: Option<u32>,
}

impl AssetInfo {
    pub fn new(asset_id: u32, sz_decimals: u32) -> Self {
        Self {
            sz_decimals,
            asset_id,
            spot_name: None,
            wei_decimals: None,
        }
    }

    /// Render a price using this asset's size decimals.
    pub fn render_price(&self, price: f64, kind: MarketKind) -> CoreResult<String> {
        wire::render_price(price, kind.max_decimals(), self.sz_decimals)
    }

    /// Render a size using this asset's size decimals.
    pub fn render_size(&self, size: f64) -> CoreResult<String> {
        wire::render_size(size, self.sz_decimals)
    }
}

/// Coin symbol -> asset metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetTable(HashMap<String, AssetInfo>);

impl AssetTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, coin: impl Into<String>, info: AssetInfo) {
        self.0.insert(coin.into(), info);
    }

    /// Look up a coin.
    ///
    /// # Errors
    /// Returns `CoreError::UnknownAsset` if the coin is not in the table.
    pub fn get(&self, coin: &str) -> CoreResult<&AssetInfo> {
        self.0
            .get(coin)
            .ok_or_else(|| CoreError::UnknownAsset(coin.to_string()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
