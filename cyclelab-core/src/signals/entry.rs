//! Entry signal: cycle trough confirmed by regime, momentum and volatility.

use serde::{Deserialize, Serialize};

use super::{cycle_in_bounds, trough_crossing, SignalEvaluator};
use crate::config::{CycleConfig, EngineConfig, EntryConfig, FeatureFlags, FractalConfig};
use crate::domain::Regime;
use crate::pipeline::IndicatorRow;

/// Outcome of an entry check, naming the first predicate that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryVerdict {
    Passed,
    NotWarm,
    NoTroughCrossing,
    WeakCrossing,
    CycleOutOfBounds,
    WeakCycle,
    FilteredByRegime,
    FilteredByMomentum,
    FilteredByVolatility,
    FilteredByHigherTimeframe,
    FilteredByFractalGate,
}

#[derive(Debug, Clone)]
pub struct EntrySignalEvaluator {
    features: FeatureFlags,
    cycle: CycleConfig,
    entry: EntryConfig,
    fractal: FractalConfig,
}

impl EntrySignalEvaluator {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            features: config.features.clone(),
            cycle: config.cycle.clone(),
            entry: config.entry.clone(),
            fractal: config.fractal.clone(),
        }
    }

    /// Full verdict for the transition `prev → row`.
    pub fn verdict(&self, prev: &IndicatorRow, row: &IndicatorRow) -> EntryVerdict {
        let e = &self.entry;

        if !(prev.warm && row.warm) {
            return EntryVerdict::NotWarm;
        }
        if !trough_crossing(prev, row) {
            return EntryVerdict::NoTroughCrossing;
        }
        if row.phase - row.lead_phase <= e.min_cross_magnitude {
            return EntryVerdict::WeakCrossing;
        }
        if !cycle_in_bounds(row, &self.cycle) {
            return EntryVerdict::CycleOutOfBounds;
        }
        if self.features.cycle_strength_filter && row.cycle_strength < self.cycle.min_strength {
            return EntryVerdict::WeakCycle;
        }
        if !self.regime_allows(row) {
            return EntryVerdict::FilteredByRegime;
        }

        let momentum_ok = if self.features.percentile_thresholds {
            e.rank_floor < row.momentum_rank && row.momentum_rank < e.rank_ceiling
        } else {
            e.rsi_floor < row.rsi && row.rsi < e.rsi_ceiling
        };
        if !momentum_ok {
            return EntryVerdict::FilteredByMomentum;
        }

        let volatility_ok = if self.features.percentile_thresholds {
            row.volatility_rank <= e.max_volatility_rank
        } else {
            row.atr_pct <= e.max_atr_pct
        };
        if !volatility_ok {
            return EntryVerdict::FilteredByVolatility;
        }

        if self.features.higher_timeframe && !row.htf_trend_up {
            return EntryVerdict::FilteredByHigherTimeframe;
        }
        if self.features.fractal_gate && !self.fractal_allows(row) {
            return EntryVerdict::FilteredByFractalGate;
        }

        EntryVerdict::Passed
    }

    fn regime_allows(&self, row: &IndicatorRow) -> bool {
        let e = &self.entry;
        match row.regime {
            Regime::Trending => row.close > row.ema_long && row.rvol >= e.trending_rvol_min,
            Regime::Ranging => {
                row.lead_phase <= e.ranging_max_lead
                    && row.rvol >= e.ranging_rvol_min
                    && row.close < row.ema_fast
            }
            Regime::Transitional => {
                row.rvol >= e.transitional_rvol_min && row.close_change > 0.0
            }
        }
    }

    fn fractal_allows(&self, row: &IndicatorRow) -> bool {
        row.hurst >= self.fractal.hurst_min
            && row.entropy <= self.fractal.entropy_max
            && row.efficiency >= self.fractal.efficiency_min
    }
}

impl SignalEvaluator for EntrySignalEvaluator {
    fn name(&self) -> &str {
        "cycle_trough_entry"
    }

    fn check(&self, prev: &IndicatorRow, row: &IndicatorRow) -> bool {
        self.verdict(prev, row) == EntryVerdict::Passed
    }
}

/// Entry column for a frame.
pub fn evaluate_entries(rows: &[IndicatorRow], config: &EngineConfig) -> Vec<bool> {
    EntrySignalEvaluator::from_config(config).evaluate(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::frame::neutral_row;
    use chrono::{Duration, TimeZone, Utc};

    /// A pair of rows that passes every default predicate in a trending regime.
    fn passing_pair() -> (IndicatorRow, IndicatorRow) {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let mut prev = neutral_row(ts, 100.0);
        prev.phase = -0.9;
        prev.lead_phase = -0.7;

        let mut row = neutral_row(ts + Duration::minutes(5), 102.0);
        row.phase = -0.3;
        row.lead_phase = -0.5;
        row.regime = Regime::Trending;
        row.ema_long = 100.0;
        row.rvol = 1.5;
        row.cycle_strength = 0.6;
        (prev, row)
    }

    fn evaluator() -> EntrySignalEvaluator {
        EntrySignalEvaluator::from_config(&EngineConfig::default())
    }

    #[test]
    fn passing_pair_passes() {
        let (prev, row) = passing_pair();
        assert_eq!(evaluator().verdict(&prev, &row), EntryVerdict::Passed);
        assert_eq!(
            evaluate_entries(&[prev, row], &EngineConfig::default()),
            vec![false, true]
        );
    }

    #[test]
    fn cold_rows_never_enter() {
        let (mut prev, row) = passing_pair();
        prev.warm = false;
        assert_eq!(evaluator().verdict(&prev, &row), EntryVerdict::NotWarm);
    }

    #[test]
    fn crossing_must_exceed_magnitude() {
        let (prev, mut row) = passing_pair();
        row.phase = -0.47;
        assert_eq!(evaluator().verdict(&prev, &row), EntryVerdict::WeakCrossing);
    }

    #[test]
    fn cycle_filters() {
        let (prev, mut row) = passing_pair();
        row.dc_period = 45.0;
        assert_eq!(evaluator().verdict(&prev, &row), EntryVerdict::CycleOutOfBounds);

        let (prev, mut row) = passing_pair();
        row.cycle_strength = 0.1;
        assert_eq!(evaluator().verdict(&prev, &row), EntryVerdict::WeakCycle);

        let mut config = EngineConfig::default();
        config.features.cycle_strength_filter = false;
        let lenient = EntrySignalEvaluator::from_config(&config);
        assert_eq!(lenient.verdict(&prev, &row), EntryVerdict::Passed);
    }

    #[test]
    fn ranging_entries_buy_deep_dips_only() {
        let (prev, mut row) = passing_pair();
        row.regime = Regime::Ranging;
        // Close is not below the fast EMA.
        assert_eq!(evaluator().verdict(&prev, &row), EntryVerdict::FilteredByRegime);

        let mut prev = prev;
        prev.phase = -0.95;
        prev.lead_phase = -0.9;
        row.phase = -0.6;
        row.lead_phase = -0.7;
        row.ema_fast = 103.0;
        assert_eq!(evaluator().verdict(&prev, &row), EntryVerdict::Passed);
    }

    #[test]
    fn transitional_needs_structure() {
        let (prev, mut row) = passing_pair();
        row.regime = Regime::Transitional;
        row.close_change = -0.01;
        assert_eq!(evaluator().verdict(&prev, &row), EntryVerdict::FilteredByRegime);
        row.close_change = 0.01;
        assert_eq!(evaluator().verdict(&prev, &row), EntryVerdict::Passed);
    }

    #[test]
    fn momentum_uses_rank_or_raw_rsi() {
        let (prev, mut row) = passing_pair();
        row.momentum_rank = 0.95;
        assert_eq!(evaluator().verdict(&prev, &row), EntryVerdict::FilteredByMomentum);

        let mut config = EngineConfig::default();
        config.features.percentile_thresholds = false;
        let raw = EntrySignalEvaluator::from_config(&config);
        assert_eq!(raw.verdict(&prev, &row), EntryVerdict::Passed);
        row.rsi = 75.0;
        assert_eq!(raw.verdict(&prev, &row), EntryVerdict::FilteredByMomentum);
    }

    #[test]
    fn volatility_ceiling() {
        let (prev, mut row) = passing_pair();
        row.volatility_rank = 0.95;
        assert_eq!(evaluator().verdict(&prev, &row), EntryVerdict::FilteredByVolatility);

        let mut config = EngineConfig::default();
        config.features.percentile_thresholds = false;
        let raw = EntrySignalEvaluator::from_config(&config);
        row.atr_pct = 0.06;
        assert_eq!(raw.verdict(&prev, &row), EntryVerdict::FilteredByVolatility);
    }

    #[test]
    fn optional_tiers() {
        let (prev, mut row) = passing_pair();
        let mut config = EngineConfig::default();
        config.features.higher_timeframe = true;
        config.features.fractal_gate = true;
        let strict = EntrySignalEvaluator::from_config(&config);

        assert_eq!(strict.verdict(&prev, &row), EntryVerdict::FilteredByHigherTimeframe);
        row.htf_trend_up = true;
        // Neutral fractal values: hurst 0.5, max entropy, zero efficiency.
        assert_eq!(strict.verdict(&prev, &row), EntryVerdict::FilteredByFractalGate);
        row.hurst = 0.6;
        row.entropy = 2.0;
        row.efficiency = 0.5;
        assert_eq!(strict.verdict(&prev, &row), EntryVerdict::Passed);
    }
}
