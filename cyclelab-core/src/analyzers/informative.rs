//! Higher-timeframe confirmation.
//!
//! Informative candles are mapped onto the base timeline using only candles
//! that had already closed when the base candle closed:
//! `t_inf + D_inf <= t_base + D_base`. The last closed value is carried
//! forward until the next informative candle closes. Using the informative
//! candle that is still forming would leak its future close into the past.

use crate::config::InformativeConfig;
use crate::domain::{Candle, Timeframe};
use crate::error::EngineError;
use crate::indicators::{ema_of_series, rsi_of_series};

/// Supplier of higher-timeframe candles. Fetches may fail; the engine then
/// falls back to same-timeframe confirmation.
pub trait InformativeSource: Send + Sync {
    fn informative(&self, pair: &str, timeframe: Timeframe) -> Result<Vec<Candle>, EngineError>;
}

/// Forward-fill `values` (one per informative candle) onto the base timeline.
///
/// Base candles before the first informative close get NaN.
pub fn align_closed(
    base: &[Candle],
    base_tf: Timeframe,
    informative: &[Candle],
    informative_tf: Timeframe,
    values: &[f64],
) -> Vec<f64> {
    debug_assert_eq!(informative.len(), values.len());

    let mut aligned = Vec::with_capacity(base.len());
    let mut closed = 0usize;
    for candle in base {
        let base_close = candle.timestamp + base_tf.duration();
        while closed < informative.len()
            && informative[closed].timestamp + informative_tf.duration() <= base_close
        {
            closed += 1;
        }
        aligned.push(if closed == 0 {
            f64::NAN
        } else {
            values[closed - 1]
        });
    }
    aligned
}

#[derive(Debug, Clone)]
pub struct InformativeAligner {
    timeframe: Timeframe,
    ema_period: usize,
    rsi_period: usize,
    rsi_min: f64,
}

impl InformativeAligner {
    pub fn from_config(config: &InformativeConfig) -> Self {
        Self {
            timeframe: config.timeframe,
            ema_period: config.ema_period.max(1),
            rsi_period: config.rsi_period.max(1),
            rsi_min: config.rsi_min,
        }
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// Per-base-candle "higher timeframe trend is up" from informative candles.
    ///
    /// False until the informative EMA and RSI are defined.
    pub fn trend_up(&self, base: &[Candle], base_tf: Timeframe, informative: &[Candle]) -> Vec<bool> {
        let closes: Vec<f64> = informative.iter().map(|c| c.close).collect();
        let ema = ema_of_series(&closes, self.ema_period);
        let rsi = rsi_of_series(&closes, self.rsi_period);

        let flags: Vec<f64> = closes
            .iter()
            .zip(ema.iter().zip(&rsi))
            .map(|(&c, (&e, &r))| {
                if e.is_nan() || r.is_nan() {
                    f64::NAN
                } else if c > e && r > self.rsi_min {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();

        align_closed(base, base_tf, informative, self.timeframe, &flags)
            .into_iter()
            .map(|v| v == 1.0)
            .collect()
    }

    /// Same-timeframe substitute used when informative data is unavailable.
    pub fn fallback(&self, close: f64, ema_long: f64, rsi: f64) -> bool {
        close > ema_long && rsi > self.rsi_min
    }
}
