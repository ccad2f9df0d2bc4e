//! Exponential moving average of closes.
//!
//! The first defined value sits at index `period - 1` and is the plain mean
//! of the opening window; afterwards each value blends the new input with
//! the previous average using `alpha = 2 / (period + 1)`.

use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    label: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "ema needs a positive period");
        Self {
            period,
            label: format!("ema_{period}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.label
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        ema_of_series(&closes, self.period)
    }
}

/// EMA over any series. A NaN inside the seed window leaves the whole output
/// undefined; a NaN after the seed ends the series there.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let seed_window = &values[..period];
    if seed_window.iter().any(|v| v.is_nan()) {
        return out;
    }
    let mut avg = seed_window.iter().sum::<f64>() / period as f64;
    out[period - 1] = avg;

    let alpha = 2.0 / (period as f64 + 1.0);
    for (slot, &x) in out[period..].iter_mut().zip(&values[period..]) {
        if x.is_nan() {
            break;
        }
        avg += alpha * (x - avg);
        *slot = avg;
    }
    out
}
