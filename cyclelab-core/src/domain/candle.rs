//! Candle and CandleHistory: the fundamental market data units.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, EngineError};

use super::Timeframe;

/// OHLCV candle for a single pair, stamped with its open time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Returns true if any OHLCV field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan()
            || self.high.is_nan()
            || self.low.is_nan()
            || self.close.is_nan()
            || self.volume.is_nan()
    }

    /// Basic OHLCV sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.close > 0.0
            && self.volume >= 0.0
    }
}

/// Ordered, append-only candle sequence for one pair at one timeframe.
///
/// Timestamps are strictly increasing. Once a candle is pushed it is never
/// modified or removed; the pipeline relies on this to stay causal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandleHistory {
    pair: String,
    timeframe: Timeframe,
    candles: Vec<Candle>,
}

impl CandleHistory {
    pub fn new(pair: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            pair: pair.into(),
            timeframe,
            candles: Vec::new(),
        }
    }

    /// Build a history from an already-ordered candle list.
    pub fn from_candles(
        pair: impl Into<String>,
        timeframe: Timeframe,
        candles: impl IntoIterator<Item = Candle>,
    ) -> Result<Self, EngineError> {
        let mut history = Self::new(pair, timeframe);
        for candle in candles {
            history.push(candle)?;
        }
        Ok(history)
    }

    /// Append a closed candle.
    ///
    /// A non-finite field would stall every recursive indicator from that
    /// candle on, so such candles are refused.
    pub fn push(&mut self, candle: Candle) -> Result<(), EngineError> {
        ensure_finite("open", candle.open)?;
        ensure_finite("high", candle.high)?;
        ensure_finite("low", candle.low)?;
        ensure_finite("close", candle.close)?;
        ensure_finite("volume", candle.volume)?;
        if let Some(last) = self.candles.last() {
            if candle.timestamp <= last.timestamp {
                return Err(EngineError::NonMonotonicTimestamp {
                    pair: self.pair.clone(),
                    last: last.timestamp,
                    next: candle.timestamp,
                });
            }
        }
        self.candles.push(candle);
        Ok(())
    }

    pub fn pair(&self) -> &str {
        &self.pair
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }
}
