//! ATR-based volatility measures.
//!
//! `atr_pct = atr / close` is ranked against its own trailing window, so the
//! same threshold means the same thing on a quiet pair and a wild one.
//! `atr_ratio = atr / SMA(atr)` tells the sizer whether volatility is
//! expanding (> 1) or contracting (< 1).

use crate::config::VolatilityConfig;
use crate::domain::Candle;
use crate::indicators::rolling::percentile_rank;
use crate::indicators::{guard_denominator, sma_of_series, Atr, Indicator};

#[derive(Debug, Clone)]
pub struct VolatilitySeries {
    pub atr: Vec<f64>,
    pub atr_pct: Vec<f64>,
    /// Always finite: 0.5 until enough observations exist.
    pub volatility_rank: Vec<f64>,
    pub atr_ratio: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct VolatilityAnalyzer {
    atr: Atr,
    rank_window: usize,
    min_observations: usize,
    atr_mean_period: usize,
}

impl VolatilityAnalyzer {
    pub fn from_config(config: &VolatilityConfig) -> Self {
        Self {
            atr: Atr::new(config.atr_period.max(1)),
            rank_window: config.rank_window,
            min_observations: config.min_observations,
            atr_mean_period: config.atr_mean_period.max(1),
        }
    }

    /// Candles before `atr_ratio` is defined.
    pub fn lookback(&self) -> usize {
        self.atr.lookback() + self.atr_mean_period - 1
    }

    /// Candles before the rank leaves its neutral placeholder.
    pub fn rank_lookback(&self) -> usize {
        self.atr.lookback() + self.min_observations.saturating_sub(1)
    }

    pub fn analyze(&self, candles: &[Candle]) -> VolatilitySeries {
        let atr = self.atr.compute(candles);
        let atr_pct: Vec<f64> = atr
            .iter()
            .zip(candles)
            .map(|(a, c)| a / guard_denominator(c.close))
            .collect();
        let volatility_rank = percentile_rank(&atr_pct, self.rank_window, self.min_observations);

        let atr_mean = sma_of_series(&atr, self.atr_mean_period);
        let atr_ratio = atr
            .iter()
            .zip(&atr_mean)
            .map(|(a, m)| a / guard_denominator(*m))
            .collect();

        VolatilitySeries {
            atr,
            atr_pct,
            volatility_rank,
            atr_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, make_ohlc_candles};

    fn config() -> VolatilityConfig {
        VolatilityConfig {
            atr_period: 3,
            rank_window: 10,
            min_observations: 3,
            atr_mean_period: 4,
        }
    }

    #[test]
    fn constant_range_gives_unit_ratio() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i % 2) as f64).collect();
        let candles = make_candles(&closes);
        let series = VolatilityAnalyzer::from_config(&config()).analyze(&candles);
        // Every true range is 3.0 after the first candle.
        assert_approx(series.atr[39], 3.0, 1e-9);
        assert_approx(series.atr_ratio[39], 1.0, 1e-9);
        assert!(series.atr_ratio[5].is_nan());
    }

    #[test]
    fn rank_is_neutral_before_min_observations() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let series = VolatilityAnalyzer::from_config(&config()).analyze(&make_candles(&closes));
        for &r in &series.volatility_rank[..5] {
            assert_eq!(r, 0.5);
        }
        assert!(series.volatility_rank.iter().all(|r| (0.0..=1.0).contains(r)));
    }

    #[test]
    fn expanding_ranges_rank_at_the_top() {
        let data: Vec<_> = (0..30)
            .map(|i| {
                let spread = 1.0 + i as f64;
                (100.0, 100.0 + spread, 100.0 - spread, 100.0)
            })
            .collect();
        let series =
            VolatilityAnalyzer::from_config(&config()).analyze(&make_ohlc_candles(&data));
        assert_approx(series.volatility_rank[29], 1.0, 1e-12);
        assert!(series.atr_ratio[29] > 1.0);
    }

    #[test]
    fn lookbacks() {
        let analyzer = VolatilityAnalyzer::from_config(&VolatilityConfig::default());
        assert_eq!(analyzer.lookback(), 14 + 49);
        assert_eq!(analyzer.rank_lookback(), 14 + 19);
    }
}
