//! ADX regime classification and normalized directional spread.

use crate::config::RegimeConfig;
use crate::domain::{Candle, Regime};
use crate::indicators::directional_movement;

#[derive(Debug, Clone)]
pub struct RegimeSeries {
    pub adx: Vec<f64>,
    /// (+DI − −DI) / 100, in [−1, 1]. NaN before warm-up.
    pub di_spread: Vec<f64>,
    /// Transitional wherever ADX is not yet defined.
    pub regime: Vec<Regime>,
}

#[derive(Debug, Clone)]
pub struct TrendRegimeClassifier {
    adx_period: usize,
    trending_above: f64,
    ranging_below: f64,
}

impl TrendRegimeClassifier {
    pub fn from_config(config: &RegimeConfig) -> Self {
        Self {
            adx_period: config.adx_period.max(1),
            trending_above: config.trending_above,
            ranging_below: config.ranging_below,
        }
    }

    pub fn lookback(&self) -> usize {
        2 * self.adx_period
    }

    /// Map a single ADX reading onto a regime.
    pub fn classify(&self, adx: f64) -> Regime {
        if adx.is_nan() {
            Regime::Transitional
        } else if adx > self.trending_above {
            Regime::Trending
        } else if adx < self.ranging_below {
            Regime::Ranging
        } else {
            Regime::Transitional
        }
    }

    pub fn analyze(&self, candles: &[Candle]) -> RegimeSeries {
        let dm = directional_movement(candles, self.adx_period);
        let di_spread = dm
            .plus_di
            .iter()
            .zip(&dm.minus_di)
            .map(|(p, m)| ((p - m) / 100.0).clamp(-1.0, 1.0))
            .collect();
        let regime = dm.adx.iter().map(|&a| self.classify(a)).collect();

        RegimeSeries {
            adx: dm.adx,
            di_spread,
            regime,
        }
    }
}
