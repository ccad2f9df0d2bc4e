//! Fractal/order measures: Hurst estimate, return entropy, efficiency ratio.
//!
//! All three use the same trailing window. Entropy and Hurst are O(n·window).

use crate::config::FractalConfig;
use crate::domain::Candle;
use crate::indicators::rolling::{rolling_max, rolling_min, rolling_std};
use crate::indicators::EPSILON;

#[derive(Debug, Clone)]
pub struct FractalSeries {
    /// ln(range / std) / ln(window). Above 0.5 suggests persistence.
    pub hurst: Vec<f64>,
    /// Shannon entropy in bits of the window's percentage changes.
    pub entropy: Vec<f64>,
    /// Net move over total movement, in [0, 1].
    pub efficiency: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct FractalOrderAnalyzer {
    window: usize,
    bins: usize,
}

impl FractalOrderAnalyzer {
    pub fn new(window: usize, bins: usize) -> Self {
        Self {
            window: window.max(3),
            bins: bins.max(2),
        }
    }

    pub fn from_config(config: &FractalConfig) -> Self {
        Self::new(config.window, config.bins)
    }

    /// Entropy and efficiency read `window` changes, so `window + 1` closes.
    pub fn lookback(&self) -> usize {
        self.window
    }

    /// Entropy of a uniform histogram; the neutral placeholder.
    pub fn max_entropy(&self) -> f64 {
        (self.bins as f64).log2()
    }

    pub fn analyze(&self, candles: &[Candle]) -> FractalSeries {
        let n = candles.len();
        let w = self.window;
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
        let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();

        let max_high = rolling_max(&highs, w);
        let min_low = rolling_min(&lows, w);
        let std = rolling_std(&closes, w);
        let log_w = (w as f64).ln();

        let hurst = (0..n)
            .map(|i| {
                let range = max_high[i] - min_low[i];
                if range.is_nan() || std[i].is_nan() {
                    return f64::NAN;
                }
                (range.max(EPSILON) / std[i].max(EPSILON)).ln() / log_w
            })
            .collect();

        let changes: Vec<f64> = (0..n)
            .map(|i| {
                if i == 0 {
                    f64::NAN
                } else {
                    closes[i] / closes[i - 1].max(EPSILON) - 1.0
                }
            })
            .collect();

        let mut entropy = vec![f64::NAN; n];
        let mut efficiency = vec![f64::NAN; n];
        for i in w..n {
            let window_changes = &changes[i + 1 - w..=i];
            if window_changes.iter().any(|c| !c.is_finite()) {
                continue;
            }
            entropy[i] = shannon_entropy(window_changes, self.bins);

            let net = (closes[i] - closes[i - w]).abs();
            let churn: f64 = (i + 1 - w..=i)
                .map(|k| (closes[k] - closes[k - 1]).abs())
                .sum();
            efficiency[i] = if churn < EPSILON { 0.0 } else { net / churn };
        }

        FractalSeries {
            hurst,
            entropy,
            efficiency,
        }
    }
}

/// Shannon entropy (bits) of `values` over a `bins`-bucket histogram spanning
/// their min..max. Zero when every value is equal.
pub fn shannon_entropy(values: &[f64], bins: usize) -> f64 {
    if values.is_empty() || bins == 0 {
        return 0.0;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    if span < EPSILON {
        return 0.0;
    }

    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - min) / span) * bins as f64) as usize;
        counts[idx.min(bins - 1)] += 1;
    }

    let total = values.len() as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum()
}
