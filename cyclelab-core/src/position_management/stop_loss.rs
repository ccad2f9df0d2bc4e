//! ATR stop-loss with profit-dependent multiplier.
//!
//! Distances are fractions of the current rate, always returned as a
//! non-positive number: "how far price may fall before forced exit".
//!
//! ```text
//! raw   = −multiplier × ATR / rate          (multiplier 2.5 / 2.0 / 1.2 by profit)
//! bound = tightest(volatility cap, pair ceiling, hard floor)
//! stop  = max(raw, bound), clamped to (−1, 0]
//! ```
//!
//! The bound includes the hard floor, so the stop is never looser than it.

use crate::config::{EngineConfig, StopLossConfig, TrailingConfig};
use crate::error::{ensure_finite, EngineError};
use crate::indicators::EPSILON;
use crate::pipeline::IndicatorRow;

#[derive(Debug, Clone)]
pub struct StopLossController {
    config: StopLossConfig,
    trailing: TrailingConfig,
}

impl StopLossController {
    pub fn new(config: StopLossConfig, trailing: TrailingConfig) -> Self {
        Self { config, trailing }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.stop_loss.clone(), config.trailing.clone())
    }

    /// The base hard stop; also the safe default. Always inside (−1, 0].
    pub fn hard_floor(&self) -> f64 {
        clamp_stop(self.config.hard_floor)
    }

    /// ATR multiple for the given profit. Non-increasing in profit.
    pub fn multiplier(&self, profit: f64) -> f64 {
        if profit < 0.0 {
            self.config.loss_multiplier
        } else if profit < self.config.profit_breakpoint {
            self.config.base_multiplier
        } else {
            self.config.profit_multiplier
        }
    }

    /// Unbounded stop distance. ATR and rate are floored at `EPSILON`.
    pub fn raw_distance(&self, profit: f64, atr: f64, rate: f64) -> f64 {
        -self.multiplier(profit) * atr.max(EPSILON) / rate.max(EPSILON)
    }

    /// Loosest stop allowed for this pair at this volatility.
    pub fn bound(&self, pair: &str, atr_pct: f64) -> f64 {
        let volatility_cap =
            -(self.config.volatility_cap_min).max(self.config.volatility_cap_atr_mult * atr_pct);
        let mut bound = volatility_cap.max(self.config.hard_floor);
        if let Some(&ceiling) = self.config.pair_ceilings.get(pair) {
            bound = bound.max(ceiling);
        }
        bound
    }

    /// Stop distance for the latest row, or an error on non-finite input.
    pub fn try_stop(
        &self,
        pair: &str,
        row: &IndicatorRow,
        current_rate: f64,
        current_profit: f64,
    ) -> Result<f64, EngineError> {
        let rate = ensure_finite("current_rate", current_rate)?;
        let profit = ensure_finite("current_profit", current_profit)?;
        let atr = ensure_finite("atr", row.atr)?;
        let atr_pct = ensure_finite("atr_pct", row.atr_pct)?;

        // Placeholder ATR would put the stop at the current price.
        if !row.warm {
            return Ok(self.hard_floor());
        }

        let mut stop = self
            .raw_distance(profit, atr, rate)
            .max(self.bound(pair, atr_pct));

        if self.trailing.enabled && profit > self.trailing.positive_offset {
            stop = stop.max(-self.trailing.positive);
        }

        Ok(clamp_stop(stop))
    }

    /// Stop distance with every failure mapped to the hard floor.
    pub fn stop_loss(
        &self,
        pair: &str,
        row: &IndicatorRow,
        current_rate: f64,
        current_profit: f64,
    ) -> f64 {
        match self.try_stop(pair, row, current_rate, current_profit) {
            Ok(stop) => stop,
            Err(e) => {
                tracing::warn!(pair, error = %e, "stop-loss fell back to hard floor");
                self.hard_floor()
            }
        }
    }
}

/// Keep a stop inside (−1, 0].
fn clamp_stop(stop: f64) -> f64 {
    if stop.is_nan() {
        return -1.0 + EPSILON;
    }
    stop.max(-1.0 + EPSILON).min(0.0)
}
