//! Primitive indicators.
//!
//! Indicators are pure functions: candle history in, numeric series out, one
//! value per candle. The first `lookback()` values are `f64::NAN` (warm-up).
//! The pipeline turns those NaNs into neutral placeholders plus a `warm` flag;
//! nothing downstream of the pipeline ever sees a NaN.
//!
//! # Look-ahead contamination guard
//! No value at candle t may depend on data from candle t+1 or later. Every
//! indicator must pass the truncated-vs-full series test.

pub mod adx;
pub mod atr;
pub mod ema;
pub mod rolling;
pub mod rsi;
pub mod sma;

pub use adx::{directional_movement, Adx, DirectionalSeries};
pub use atr::{true_range, wilder_smooth, Atr};
pub use ema::{ema_of_series, Ema};
pub use rsi::{rsi_of_series, Rsi};
pub use sma::{sma_of_series, Sma};

use crate::domain::Candle;

/// Trait for single-series indicators.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "ema_50", "atr_14").
    fn name(&self) -> &str;

    /// Number of candles needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire candle series.
    ///
    /// Returns a `Vec<f64>` of the same length as `candles`.
    fn compute(&self, candles: &[Candle]) -> Vec<f64>;
}

/// Floor for every ratio denominator (rolling means, ATR, standard deviation).
pub const EPSILON: f64 = 1e-9;

/// Guard a denominator against zero and near-zero magnitudes, keeping its sign.
pub fn guard_denominator(value: f64) -> f64 {
    if value.abs() < EPSILON {
        if value.is_sign_negative() {
            -EPSILON
        } else {
            EPSILON
        }
    } else {
        value
    }
}

/// Replace a NaN/inf with a neutral placeholder.
pub fn or_neutral(value: f64, neutral: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        neutral
    }
}

/// Create synthetic candles from close prices for testing.
///
/// open = prev_close (or close for the first candle),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000,
/// one candle every 5 minutes.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    use chrono::{Duration, TimeZone, Utc};
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                timestamp: base + Duration::minutes(5 * i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Create candles from explicit (open, high, low, close) tuples.
#[cfg(test)]
pub fn make_ohlc_candles(data: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
    use chrono::{Duration, TimeZone, Utc};
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Candle {
            timestamp: base + Duration::minutes(5 * i as i64),
            open,
            high,
            low,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
