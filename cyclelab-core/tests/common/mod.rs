//! Shared fixtures for integration tests.
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use cyclelab_core::domain::{Candle, CandleHistory, Regime, Timeframe};
use cyclelab_core::pipeline::IndicatorRow;

pub fn t0() -> DateTime<Utc> {
    // A Monday.
    Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap()
}

fn candle(i: usize, step: i64, prev_close: f64, close: f64, volume: f64) -> Candle {
    let open = prev_close;
    Candle {
        timestamp: t0() + Duration::minutes(step * i as i64),
        open,
        high: open.max(close) + 0.5,
        low: open.min(close) - 0.5,
        close,
        volume,
    }
}

fn from_closes(closes: &[f64], step: i64) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let prev = if i == 0 { close } else { closes[i - 1] };
            let volume = 1_000.0 + (i % 7) as f64 * 150.0;
            candle(i, step, prev, close, volume)
        })
        .collect()
}

/// Deterministic pseudo-random walk on five-minute candles.
pub fn random_walk(n: usize) -> Vec<Candle> {
    let mut price = 100.0_f64;
    let closes: Vec<f64> = (0..n)
        .map(|i| {
            let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let change = ((seed >> 33) % 200) as f64 / 100.0 - 1.0;
            price = (price + change).max(10.0);
            price
        })
        .collect();
    from_closes(&closes, 5)
}

/// Stationary white noise around 100 (splitmix64, amplitude ±3).
///
/// Its dominant-cycle phase wanders back and forth, so both trough and peak
/// crossings occur, unlike on a clean sine.
pub fn choppy(n: usize) -> Vec<Candle> {
    let closes: Vec<f64> = (0..n as u64)
        .map(|i| {
            let mut x = i
                .wrapping_mul(0x9E37_79B9_7F4A_7C15)
                .wrapping_add(0x2545_F491_4F6C_DD1D);
            x ^= x >> 30;
            x = x.wrapping_mul(0xBF58_476D_1CE4_E5B9);
            x ^= x >> 27;
            x = x.wrapping_mul(0x94D0_49BB_1331_11EB);
            x ^= x >> 31;
            let unit = (x >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0;
            100.0 + 3.0 * unit
        })
        .collect();
    from_closes(&closes, 5)
}

/// Pure sine around 100 with the given period in candles.
pub fn sinusoid(n: usize, period: f64, amplitude: f64) -> Vec<Candle> {
    let closes: Vec<f64> = (0..n)
        .map(|i| 100.0 + amplitude * (i as f64 * std::f64::consts::TAU / period).sin())
        .collect();
    from_closes(&closes, 5)
}

/// Candles on an arbitrary timeframe step (minutes).
pub fn trending(n: usize, step: i64, slope: f64) -> Vec<Candle> {
    let closes: Vec<f64> = (0..n).map(|i| 100.0 + slope * i as f64).collect();
    from_closes(&closes, step)
}

pub fn history(pair: &str, candles: Vec<Candle>) -> CandleHistory {
    CandleHistory::from_candles(pair, Timeframe::M5, candles).unwrap()
}

/// A warm row with unremarkable values; tests override what they need.
pub fn warm_row(close: f64) -> IndicatorRow {
    IndicatorRow {
        timestamp: t0(),
        close,
        dc_period: 20.0,
        phase: 0.0,
        lead_phase: 0.0,
        cycle_strength: 0.5,
        atr: 1.0,
        atr_pct: 1.0 / close,
        atr_ratio: 1.0,
        volatility_rank: 0.5,
        adx: 22.5,
        di_spread: 0.0,
        regime: Regime::Transitional,
        rsi: 50.0,
        momentum_rank: 0.5,
        ema_fast: close,
        ema_long: close,
        rvol: 1.0,
        close_change: 0.0,
        htf_trend_up: false,
        hurst: 0.5,
        entropy: 10f64.log2(),
        efficiency: 0.0,
        warm: true,
    }
}
