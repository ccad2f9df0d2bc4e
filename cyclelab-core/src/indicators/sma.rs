//! Rolling arithmetic mean, applied to closes, volume and ATR.

use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    label: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "sma needs a positive period");
        Self {
            period,
            label: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.label
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        sma_of_series(&closes, self.period)
    }
}

/// Mean of each trailing `period` window; undefined where the window holds a NaN.
pub fn sma_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    // Running sum over finite members plus a count of the gaps in the window.
    let mut total = 0.0;
    let mut gaps = 0usize;
    for (idx, &incoming) in values.iter().enumerate() {
        match incoming.is_nan() {
            true => gaps += 1,
            false => total += incoming,
        }
        if let Some(outgoing) = idx.checked_sub(period).map(|j| values[j]) {
            match outgoing.is_nan() {
                true => gaps -= 1,
                false => total -= outgoing,
            }
        }
        if idx + 1 >= period && gaps == 0 {
            out[idx] = total / period as f64;
        }
    }
    out
}
