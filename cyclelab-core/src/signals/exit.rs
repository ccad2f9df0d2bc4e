//! Exit signal: cycle peak with either a strong lead or fading momentum.
//!
//! Per-trade exits (duration tiers, maturity, overheat, trend break) live in
//! `position_management::custom_exit`; this column is trade-agnostic.

use super::{cycle_in_bounds, peak_crossing, SignalEvaluator};
use crate::config::{CycleConfig, EngineConfig, ExitConfig};
use crate::pipeline::IndicatorRow;

#[derive(Debug, Clone)]
pub struct ExitSignalEvaluator {
    cycle: CycleConfig,
    exit: ExitConfig,
}

impl ExitSignalEvaluator {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            cycle: config.cycle.clone(),
            exit: config.exit.clone(),
        }
    }
}

impl SignalEvaluator for ExitSignalEvaluator {
    fn name(&self) -> &str {
        "cycle_peak_exit"
    }

    fn check(&self, prev: &IndicatorRow, row: &IndicatorRow) -> bool {
        let x = &self.exit;
        if !peak_crossing(prev, row) || row.lead_phase - row.phase <= x.min_cross_magnitude {
            return false;
        }
        if !cycle_in_bounds(row, &self.cycle) {
            return false;
        }
        let weak_momentum = row.close < row.ema_fast && row.rsi < x.weak_momentum;
        row.lead_phase >= x.strong_lead || weak_momentum
    }
}

/// Exit column for a frame.
pub fn evaluate_exits(rows: &[IndicatorRow], config: &EngineConfig) -> Vec<bool> {
    ExitSignalEvaluator::from_config(config).evaluate(rows)
}
