//! Error types for hlsign-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid decimal precision: {param}={value} (max {max})")]
    InvalidDecimalPrecision {
        param: &'static str,
        value: u32,
        max: u32,
    },

    #[error("Non-finite value: {0}")]
    NonFiniteValue(f64),

    #[error("Value out of representable range: {0}")]
    ValueOutOfRange(f64),

    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),
}

/// Result type alias for core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;
