//! Regime/Volatility Sizer
//!
//! Shrinks the proposed stake as relative volatility rises, when the detected
//! cycle is weak, and outside trending regimes.

use crate::config::SizingConfig;
use crate::domain::Regime;
use crate::pipeline::IndicatorRow;
use crate::sizers::{clamp_stake, Sizer, StakeRequest};

/// Regime- and volatility-adjusted sizer
///
/// # Formula
/// ```text
/// volatility_factor = 1 / (1 + atr_ratio)
/// cycle_factor      = min(cycle_strength × 2 + 0.5, 1)
/// regime_factor     = 1.0 if Trending else 0.7
/// stake = clamp(proposed × volatility_factor × cycle_factor × regime_factor,
///               min_stake, max_stake)
/// ```
///
/// # Example
/// - Proposed: 100, ATR ratio 1.0 → ×0.5
/// - Cycle strength 0.1 → ×0.7
/// - Ranging → ×0.7
/// - Stake: 100 × 0.5 × 0.7 × 0.7 = 24.5
#[derive(Debug, Clone)]
pub struct RegimeVolatilitySizer {
    config: SizingConfig,
}

impl RegimeVolatilitySizer {
    pub fn new(config: SizingConfig) -> Self {
        Self { config }
    }

    pub fn volatility_factor(&self, atr_ratio: f64) -> f64 {
        1.0 / (1.0 + atr_ratio.max(0.0))
    }

    pub fn cycle_factor(&self, cycle_strength: f64) -> f64 {
        (cycle_strength * self.config.cycle_weight + self.config.cycle_offset).clamp(0.0, 1.0)
    }

    pub fn regime_factor(&self, regime: Regime) -> f64 {
        match regime {
            Regime::Trending => 1.0,
            Regime::Ranging | Regime::Transitional => self.config.non_trending_factor,
        }
    }
}

impl Sizer for RegimeVolatilitySizer {
    fn size(&self, request: &StakeRequest, row: &IndicatorRow) -> f64 {
        if !row.warm {
            return request.fallback();
        }

        let stake = request.proposed
            * self.volatility_factor(row.atr_ratio)
            * self.cycle_factor(row.cycle_strength)
            * self.regime_factor(row.regime);

        if stake.is_finite() {
            clamp_stake(stake, request.min_stake, request.max_stake)
        } else {
            request.fallback()
        }
    }

    fn name(&self) -> &str {
        "RegimeVolatility"
    }
}
