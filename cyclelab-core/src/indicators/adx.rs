//! Wilder's directional movement system: +DI, -DI and ADX.
//!
//! Directional moves and true range are each Wilder-smoothed, turned into
//! the two directional indices, and their normalized spread (DX) is smoothed
//! once more into ADX. ADX needs `2 * period` candles before it is defined.

use super::atr::{true_range, wilder_smooth};
use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    label: String,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "adx needs a positive period");
        Self {
            period,
            label: format!("adx_{period}"),
        }
    }
}

/// Directional indices and ADX, index-aligned with the candles.
#[derive(Debug, Clone)]
pub struct DirectionalSeries {
    pub plus_di: Vec<f64>,
    pub minus_di: Vec<f64>,
    pub adx: Vec<f64>,
}

impl DirectionalSeries {
    fn undefined(len: usize) -> Self {
        Self {
            plus_di: vec![f64::NAN; len],
            minus_di: vec![f64::NAN; len],
            adx: vec![f64::NAN; len],
        }
    }
}

/// Raw +DM/-DM for each candle; the first candle has none.
fn raw_moves(candles: &[Candle]) -> (Vec<f64>, Vec<f64>) {
    let mut plus = vec![f64::NAN];
    let mut minus = vec![f64::NAN];
    for w in candles.windows(2) {
        let rise = w[1].high - w[0].high;
        let drop = w[0].low - w[1].low;
        if rise.is_nan() || drop.is_nan() {
            plus.push(f64::NAN);
            minus.push(f64::NAN);
            continue;
        }
        plus.push(if rise > drop && rise > 0.0 { rise } else { 0.0 });
        minus.push(if drop > rise && drop > 0.0 { drop } else { 0.0 });
    }
    (plus, minus)
}

pub fn directional_movement(candles: &[Candle], period: usize) -> DirectionalSeries {
    let len = candles.len();
    let mut series = DirectionalSeries::undefined(len);
    if period == 0 || len < 2 {
        return series;
    }

    let (plus_dm, minus_dm) = raw_moves(candles);
    let mut ranges = true_range(candles);
    if let Some(head) = ranges.first_mut() {
        *head = f64::NAN;
    }
    let range = wilder_smooth(&ranges, period);
    let plus = wilder_smooth(&plus_dm, period);
    let minus = wilder_smooth(&minus_dm, period);

    let mut dx = vec![f64::NAN; len];
    for i in 0..len {
        let (r, p, m) = (range[i], plus[i], minus[i]);
        if r.is_nan() || p.is_nan() || m.is_nan() || r == 0.0 {
            continue;
        }
        let pdi = 100.0 * p / r;
        let mdi = 100.0 * m / r;
        series.plus_di[i] = pdi;
        series.minus_di[i] = mdi;
        let total = pdi + mdi;
        dx[i] = if total > 0.0 {
            100.0 * (pdi - mdi).abs() / total
        } else {
            0.0
        };
    }

    series.adx = wilder_smooth(&dx, period);
    series
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        &self.label
    }

    fn lookback(&self) -> usize {
        self.period * 2
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        directional_movement(candles, self.period).adx
    }
}
