//! Wilder's relative strength index.
//!
//! Gains and losses are averaged separately with `alpha = 1 / period`; the
//! first value is at index `period`. A window with no movement reads 50.

use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    label: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "rsi needs a positive period");
        Self {
            period,
            label: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.label
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        rsi_of_series(&closes, self.period)
    }
}

pub fn rsi_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() <= period {
        return out;
    }

    let deltas: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let (head, tail) = deltas.split_at(period);
    if head.iter().any(|d| d.is_nan()) {
        return out;
    }

    let n = period as f64;
    let mut up = head.iter().map(|d| d.max(0.0)).sum::<f64>() / n;
    let mut down = head.iter().map(|d| (-d).max(0.0)).sum::<f64>() / n;
    out[period] = strength(up, down);

    for (slot, &d) in out[period + 1..].iter_mut().zip(tail) {
        if d.is_nan() {
            break;
        }
        up += (d.max(0.0) - up) / n;
        down += ((-d).max(0.0) - down) / n;
        *slot = strength(up, down);
    }
    out
}

fn strength(up: f64, down: f64) -> f64 {
    match (up == 0.0, down == 0.0) {
        (true, true) => 50.0,
        (_, true) => 100.0,
        (true, _) => 0.0,
        _ => 100.0 * up / (up + down),
    }
}
