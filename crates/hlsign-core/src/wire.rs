//! Wire-number encoding for order prices and sizes.
//!
//! Hyperliquid accepts prices and sizes only as decimal strings that satisfy
//! the tick and lot rules of the asset:
//! - Size: at most `sz_decimals` decimal places
//! - Price: at most 5 significant figures and at most
//!   `max_decimals - sz_decimals` decimal places (integers are exempt)
//!
//! `max_decimals` is 6 for perps and 8 for spot.
//!
//! Floats are converted through their shortest round-trip representation into
//! `Decimal`, so rounding happens on the digits the caller actually wrote and
//! not on the binary approximation. Rounding is half away from zero.
//!
//! Reference: <https://hyperliquid.gitbook.io/hyperliquid-docs/for-developers/api/tick-and-lot-size>

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{CoreError, CoreResult};

/// Maximum price decimals for perp markets.
pub const PERP_MAX_DECIMALS: u32 = 6;

/// Maximum price decimals for spot markets.
pub const SPOT_MAX_DECIMALS: u32 = 8;

/// Maximum significant figures for non-integer prices.
pub const MAX_SIG_FIGS: u32 = 5;

/// Largest scale a `Decimal` can represent.
const MAX_SCALE: u32 = 28;

const ROUNDING: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

/// Render an order size as a wire string.
///
/// Integer sizes, and every size when `sz_decimals == 0`, are rendered as
/// the truncated integer. Otherwise the size is rounded to `sz_decimals`
/// places and trailing zeros are stripped.
///
/// # Errors
/// - `NonFiniteValue` for NaN or infinities
/// - `InvalidDecimalPrecision` if `sz_decimals` exceeds the decimal scale
/// - `ValueOutOfRange` if the magnitude does not fit in a `Decimal`
pub fn render_size(value: f64, sz_decimals: u32) -> CoreResult<String> {
    check_precision("sz_decimals", sz_decimals)?;
    let size = to_decimal(value)?;
    Ok(render_size_decimal(size, sz_decimals))
}

/// Render an order price as a wire string.
///
/// # Arguments
/// * `value` - Price to render
/// * `max_decimals` - 6 for perps, 8 for spot
/// * `sz_decimals` - Size decimals of the asset
///
/// # Errors
/// Same conditions as [`render_size`], applied to both precision parameters.
pub fn render_price(value: f64, max_decimals: u32, sz_decimals: u32) -> CoreResult<String> {
    check_precision("max_decimals", max_decimals)?;
    check_precision("sz_decimals", sz_decimals)?;
    let price = to_decimal(value)?;
    Ok(render_price_decimal(price, max_decimals, sz_decimals))
}

/// `Decimal` variant of [`render_size`]. Parameters are assumed valid.
pub fn render_size_decimal(size: Decimal, sz_decimals: u32) -> String {
    if sz_decimals == 0 || size.fract().is_zero() {
        return size.trunc().normalize().to_string();
    }
    size.round_dp_with_strategy(sz_decimals.min(MAX_SCALE), ROUNDING)
        .normalize()
        .to_string()
}

/// `Decimal` variant of [`render_price`]. Parameters are assumed valid.
pub fn render_price_decimal(price: Decimal, max_decimals: u32, sz_decimals: u32) -> String {
    if price.fract().is_zero() {
        return price.trunc().normalize().to_string();
    }
    let allowed = allowed_price_decimals(price, max_decimals, sz_decimals);
    price
        .round_dp_with_strategy(allowed, ROUNDING)
        .normalize()
        .to_string()
}

/// Number of decimal places a non-integer price may carry.
///
/// `min(tick cap, significant-figure cap)`, floored at zero, where the tick
/// cap is `max_decimals - sz_decimals` and the significant-figure cap is
/// `5 - integer digits` for prices >= 1 and `4 + ceil(-log10(price))` for
/// prices below 1.
pub fn allowed_price_decimals(price: Decimal, max_decimals: u32, sz_decimals: u32) -> u32 {
    let tick_cap = max_decimals.saturating_sub(sz_decimals);
    let sig_cap = significant_decimals(price);
    tick_cap.min(sig_cap).min(MAX_SCALE)
}

/// Round to [`MAX_SIG_FIGS`] significant figures (half away from zero).
///
/// # Errors
/// `ValueOutOfRange` if the rounded value no longer fits in a `Decimal`.
pub fn round_sig_figs(value: Decimal) -> CoreResult<Decimal> {
    if value.is_zero() {
        return Ok(value);
    }
    let scale = MAX_SIG_FIGS as i32 - 1 - magnitude(value);
    if scale >= 0 {
        return Ok(value.round_dp_with_strategy((scale as u32).min(MAX_SCALE), ROUNDING));
    }
    let out_of_range = || CoreError::ValueOutOfRange(to_f64(value).unwrap_or(f64::INFINITY));
    let factor = 10i128
        .checked_pow(scale.unsigned_abs())
        .and_then(|pow| Decimal::try_from_i128_with_scale(pow, 0).ok())
        .ok_or_else(out_of_range)?;
    (value / factor)
        .round_dp_with_strategy(0, ROUNDING)
        .checked_mul(factor)
        .ok_or_else(out_of_range)
}

/// Convert a float into a `Decimal` through its shortest round-trip form.
pub fn to_decimal(value: f64) -> CoreResult<Decimal> {
    if !value.is_finite() {
        return Err(CoreError::NonFiniteValue(value));
    }
    value
        .to_string()
        .parse::<Decimal>()
        .map_err(|_| CoreError::ValueOutOfRange(value))
}

/// Convert a rendered `Decimal` back into a float.
pub fn to_f64(value: Decimal) -> CoreResult<f64> {
    value
        .to_string()
        .parse::<f64>()
        .map_err(|_| CoreError::ValueOutOfRange(f64::NAN))
}

/// Default slippage for market orders (0.5%).
pub const DEFAULT_SLIPPAGE: f64 = 0.005;

/// Aggressive price for a market order: `price * (1 +/- slippage)` rounded to
/// [`MAX_SIG_FIGS`] significant figures. Buys move up, sells move down.
///
/// # Errors
/// `NonFiniteValue` / `ValueOutOfRange` for unrepresentable inputs.
pub fn slippage_price(is_buy: bool, price: f64, slippage: f64) -> CoreResult<f64> {
    let px = to_decimal(price)?;
    let slip = to_decimal(slippage)?;
    let factor = if is_buy {
        Decimal::ONE + slip
    } else {
        Decimal::ONE - slip
    };
    let adjusted = px
        .checked_mul(factor)
        .ok_or(CoreError::ValueOutOfRange(price))?;
    to_f64(round_sig_figs(adjusted)?)
}

fn check_precision(param: &'static str, value: u32) -> CoreResult<()> {
    if value > MAX_SCALE {
        return Err(CoreError::InvalidDecimalPrecision {
            param,
            value,
            max: MAX_SCALE,
        });
    }
    Ok(())
}

/// Decimal places left for significant figures once the magnitude is spent.
fn significant_decimals(value: Decimal) -> u32 {
    let scale = MAX_SIG_FIGS as i32 - 1 - magnitude(value);
    scale.max(0) as u32
}

/// Order of magnitude of a non-zero decimal.
/// 12345 -> 4, 1234.5 -> 3, 1.5 -> 0, 0.123 -> -1, 0.00123 -> -3
fn magnitude(value: Decimal) -> i32 {
    let abs_value = value.abs();
    let int_part = abs_value.trunc();

    if !int_part.is_zero() {
        return int_part.to_string().len() as i32 - 1;
    }

    let mut magnitude = 0;
    let mut scaled = abs_value;
    while !scaled.is_zero() && scaled < Decimal::ONE {
        scaled *= Decimal::TEN;
        magnitude -= 1;
    }
    magnitude
}
