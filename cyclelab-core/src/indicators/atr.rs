//! Average true range with Wilder smoothing.
//!
//! The first candle has no prior close, so its range is dropped before
//! smoothing and the first defined ATR lands at index `period`.

use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    label: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "atr needs a positive period");
        Self {
            period,
            label: format!("atr_{period}"),
        }
    }
}

/// Per-candle true range. The first entry is the bar's own high-low span;
/// later entries also cover any gap from the previous close.
pub fn true_range(candles: &[Candle]) -> Vec<f64> {
    let first = candles.first().map(|c| c.high - c.low);
    let rest = candles.windows(2).map(|pair| {
        let (prev_close, bar) = (pair[0].close, &pair[1]);
        let span = bar.high - bar.low;
        let up = (bar.high - prev_close).abs();
        let down = (bar.low - prev_close).abs();
        if span.is_nan() || up.is_nan() || down.is_nan() {
            f64::NAN
        } else {
            span.max(up).max(down)
        }
    });
    first.into_iter().chain(rest).collect()
}

/// Wilder's running average (`alpha = 1 / period`).
///
/// The seed is the mean of the first run of `period` consecutive finite
/// values. A NaN after the seed ends the series.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let Some(seed_at) = first_full_run(values, period) else {
        return out;
    };
    let mut avg = values[seed_at + 1 - period..=seed_at].iter().sum::<f64>() / period as f64;
    out[seed_at] = avg;

    let keep = (period - 1) as f64 / period as f64;
    for (slot, &x) in out[seed_at + 1..].iter_mut().zip(&values[seed_at + 1..]) {
        if x.is_nan() {
            break;
        }
        avg = avg * keep + x / period as f64;
        *slot = avg;
    }
    out
}

/// Index closing the earliest run of `len` consecutive non-NaN values.
fn first_full_run(values: &[f64], len: usize) -> Option<usize> {
    let mut streak = 0;
    values.iter().position(|v| {
        streak = if v.is_nan() { 0 } else { streak + 1 };
        streak == len
    })
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.label
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let mut ranges = true_range(candles);
        if let Some(head) = ranges.first_mut() {
            *head = f64::NAN;
        }
        wilder_smooth(&ranges, self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_candles, DEFAULT_EPSILON};

    fn bars() -> Vec<Candle> {
        make_ohlc_candles(&[
            (50.0, 52.0, 49.0, 51.0), // span 3
            (51.0, 54.0, 50.0, 53.0), // span 4
            (53.0, 53.5, 47.0, 48.0), // span 6.5, down gap 6
            (48.0, 49.0, 46.0, 47.0), // span 3, up gap 1
            (47.0, 51.0, 46.0, 50.0), // span 5, up gap 4
        ])
    }

    #[test]
    fn true_range_takes_widest_of_span_and_gaps() {
        let tr = true_range(&bars());
        assert_eq!(tr.len(), 5);
        assert_approx(tr[0], 3.0, DEFAULT_EPSILON);
        assert_approx(tr[1], 4.0, DEFAULT_EPSILON);
        assert_approx(tr[2], 6.5, DEFAULT_EPSILON);
        assert_approx(tr[3], 3.0, DEFAULT_EPSILON);
        assert_approx(tr[4], 5.0, DEFAULT_EPSILON);
    }

    #[test]
    fn overnight_gap_dominates_small_bar() {
        let tr = true_range(&make_ohlc_candles(&[
            (20.0, 21.0, 19.0, 20.0),
            (26.0, 27.0, 25.5, 26.5), // span 1.5, gap 7
        ]));
        assert_approx(tr[1], 7.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_seeds_from_second_bar() {
        let atr = Atr::new(2).compute(&bars());
        // ranges after dropping the first: [4, 6.5, 3, 5]
        assert!(atr[0].is_nan() && atr[1].is_nan());
        assert_approx(atr[2], 5.25, DEFAULT_EPSILON);
        assert_approx(atr[3], 4.125, DEFAULT_EPSILON);
        assert_approx(atr[4], 4.5625, DEFAULT_EPSILON);
    }

    #[test]
    fn seed_waits_for_a_clean_run() {
        let out = wilder_smooth(&[1.0, f64::NAN, 4.0, 8.0, 2.0], 2);
        assert!(out[..3].iter().all(|v| v.is_nan()));
        assert_approx(out[3], 6.0, DEFAULT_EPSILON);
        assert_approx(out[4], 4.0, DEFAULT_EPSILON);
    }

    #[test]
    fn motionless_market_has_no_range() {
        let atr = Atr::new(4).compute(&make_ohlc_candles(&[(3.0, 3.0, 3.0, 3.0); 7]));
        assert_approx(atr[6], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn lookback_and_label() {
        let atr = Atr::new(10);
        assert_eq!(atr.lookback(), 10);
        assert_eq!(atr.name(), "atr_10");
    }
}
