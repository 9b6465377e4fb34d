//! Core domain types for Hyperliquid action signing.
//!
//! This crate provides the inputs of the signing pipeline:
//! - `AssetInfo` / `AssetTable`: coin metadata consumed from the info service
//! - `OrderRequest`, `OrderKind`, `TimeInForce`: caller-facing order shapes
//! - `wire`: float -> canonical decimal string encoding for prices and sizes

pub mod error;
pub mod market;
pub mod order;
pub mod wire;

pub use error::{CoreError, CoreResult};
pub use market::{AssetInfo, AssetTable, MarketKind, SPOT_ASSET_OFFSET};
pub use order::{
    is_buy, ClientOrderId, Grouping, ModifyRequest, OrderKind, OrderRequest, TimeInForce, TpSl,
};
pub use wire::{
    render_price, render_size, slippage_price, DEFAULT_SLIPPAGE, MAX_SIG_FIGS, PERP_MAX_DECIMALS,
    SPOT_MAX_DECIMALS,
};
