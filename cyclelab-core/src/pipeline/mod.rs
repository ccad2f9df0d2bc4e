//! Indicator pipeline orchestration.
//!
//! One synchronous batch pass per refresh: every analyzer runs over the full
//! history, then the NaN warm-up values are replaced by neutral placeholders
//! and the `warm` flag is set. Entry and exit columns are evaluated on the
//! finished rows and published with them.

pub mod frame;

pub use frame::{IndicatorFrame, IndicatorRow};

use crate::analyzers::{
    CycleAnalyzer, FractalOrderAnalyzer, InformativeAligner, TrendRegimeClassifier,
    VolatilityAnalyzer,
};
use crate::config::EngineConfig;
use crate::domain::{Candle, CandleHistory};
use crate::indicators::rolling::percentile_rank;
use crate::indicators::{
    ema_of_series, guard_denominator, or_neutral, rsi_of_series, sma_of_series,
};
use crate::signals::{evaluate_entries, evaluate_exits};

/// Pure function from candle history to indicator frame.
#[derive(Debug, Clone)]
pub struct IndicatorPipeline {
    config: EngineConfig,
    cycle: CycleAnalyzer,
    volatility: VolatilityAnalyzer,
    regime: TrendRegimeClassifier,
    fractal: FractalOrderAnalyzer,
    informative: InformativeAligner,
}

impl IndicatorPipeline {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            config: config.clone(),
            cycle: CycleAnalyzer::from_config(&config.cycle),
            volatility: VolatilityAnalyzer::from_config(&config.volatility),
            regime: TrendRegimeClassifier::from_config(&config.regime),
            fractal: FractalOrderAnalyzer::from_config(&config.fractal),
            informative: InformativeAligner::from_config(&config.informative),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of leading rows that can never be warm.
    ///
    /// The maximum window across every enabled indicator.
    pub fn warmup(&self) -> usize {
        let trend = &self.config.trend;
        let momentum = &self.config.momentum;
        let mut lookbacks = vec![
            self.cycle.warmup(),
            self.volatility.lookback(),
            self.volatility.rank_lookback(),
            self.regime.lookback(),
            momentum.rsi_period + self.config.volatility.min_observations.saturating_sub(1),
            trend.ema_fast.saturating_sub(1),
            trend.ema_long.saturating_sub(1),
            trend.volume_window.saturating_sub(1),
            trend.structure_lookback,
        ];
        if self.config.features.fractal_gate {
            lookbacks.push(self.fractal.lookback());
        }
        lookbacks.into_iter().max().unwrap_or(0)
    }

    /// Compute the full frame, signal columns included.
    ///
    /// `informative` is `None` when higher-timeframe data is unavailable; the
    /// same-timeframe fallback then fills `htf_trend_up`.
    pub fn run(&self, history: &CandleHistory, informative: Option<&[Candle]>) -> IndicatorFrame {
        let rows = self.compute_rows(history, informative);
        let entry = evaluate_entries(&rows, &self.config);
        let exit = evaluate_exits(&rows, &self.config);
        IndicatorFrame::new(rows, entry, exit)
    }

    /// Compute the indicator rows only.
    pub fn compute_rows(
        &self,
        history: &CandleHistory,
        informative: Option<&[Candle]>,
    ) -> Vec<IndicatorRow> {
        let candles = history.candles();
        let n = candles.len();
        if n == 0 {
            return Vec::new();
        }

        let cfg = &self.config;
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();

        let cycle = self.cycle.analyze(candles);
        let vol = self.volatility.analyze(candles);
        let regime = self.regime.analyze(candles);

        let rsi = rsi_of_series(&closes, cfg.momentum.rsi_period.max(1));
        let momentum_rank = percentile_rank(
            &rsi,
            cfg.momentum.rank_window,
            cfg.volatility.min_observations,
        );
        let ema_fast = ema_of_series(&closes, cfg.trend.ema_fast.max(1));
        let ema_long = ema_of_series(&closes, cfg.trend.ema_long.max(1));
        let volume_mean = sma_of_series(&volumes, cfg.trend.volume_window.max(1));
        let lookback = cfg.trend.structure_lookback;

        let fractal_on = cfg.features.fractal_gate;
        let fractal = fractal_on.then(|| self.fractal.analyze(candles));
        let max_entropy = self.fractal.max_entropy();

        let htf = informative.map(|inf| self.informative.trend_up(candles, history.timeframe(), inf));

        let warmup = self.warmup();
        let neutral_adx = (cfg.regime.trending_above + cfg.regime.ranging_below) / 2.0;

        (0..n)
            .map(|i| {
                let close = closes[i];
                let rvol = volumes[i] / guard_denominator(volume_mean[i]);
                let close_change = if i >= lookback {
                    close / guard_denominator(closes[i - lookback]) - 1.0
                } else {
                    f64::NAN
                };

                let (hurst, entropy, efficiency) = match &fractal {
                    Some(f) => (f.hurst[i], f.entropy[i], f.efficiency[i]),
                    None => (0.5, max_entropy, 0.0),
                };

                let required = [
                    cycle.dc_period[i],
                    cycle.phase[i],
                    cycle.lead_phase[i],
                    cycle.strength[i],
                    vol.atr[i],
                    vol.atr_pct[i],
                    vol.atr_ratio[i],
                    regime.adx[i],
                    regime.di_spread[i],
                    rsi[i],
                    ema_fast[i],
                    ema_long[i],
                    rvol,
                    close_change,
                ];
                let all_defined = required.iter().all(|v| v.is_finite())
                    && (!fractal_on || [hurst, entropy, efficiency].iter().all(|v| v.is_finite()));

                let ema_long = or_neutral(ema_long[i], close);
                let rsi = or_neutral(rsi[i], 50.0);
                let htf_trend_up = match &htf {
                    Some(flags) => flags[i],
                    None => self.informative.fallback(close, ema_long, rsi),
                };

                IndicatorRow {
                    timestamp: candles[i].timestamp,
                    close,
                    dc_period: or_neutral(cycle.dc_period[i], 0.0),
                    phase: or_neutral(cycle.phase[i], 0.0),
                    lead_phase: or_neutral(cycle.lead_phase[i], 0.0),
                    cycle_strength: or_neutral(cycle.strength[i], 0.0),
                    atr: or_neutral(vol.atr[i], 0.0),
                    atr_pct: or_neutral(vol.atr_pct[i], 0.0),
                    atr_ratio: or_neutral(vol.atr_ratio[i], 1.0),
                    volatility_rank: vol.volatility_rank[i],
                    adx: or_neutral(regime.adx[i], neutral_adx),
                    di_spread: or_neutral(regime.di_spread[i], 0.0),
                    regime: regime.regime[i],
                    rsi,
                    momentum_rank: momentum_rank[i],
                    ema_fast: or_neutral(ema_fast[i], close),
                    ema_long,
                    rvol: or_neutral(rvol, 1.0),
                    close_change: or_neutral(close_change, 0.0),
                    htf_trend_up,
                    hurst: or_neutral(hurst, 0.5),
                    entropy: or_neutral(entropy, max_entropy),
                    efficiency: or_neutral(efficiency, 0.0),
                    warm: i >= warmup && all_defined && candles[i].is_sane(),
                }
            })
            .collect()
    }
}
