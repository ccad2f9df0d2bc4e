//! Signal generation: per-candle entry and exit columns.
//!
//! Signals read indicator rows only; they never look at open trades. A row is
//! judged together with its predecessor (crossings are strict one-candle
//! events), and both rows must be warm.

pub mod entry;
pub mod exit;

pub use entry::{evaluate_entries, EntrySignalEvaluator, EntryVerdict};
pub use exit::{evaluate_exits, ExitSignalEvaluator};

use crate::config::CycleConfig;
use crate::pipeline::IndicatorRow;

/// Row-pair signal evaluator.
///
/// # Invariants
/// - `check` MUST be deterministic for the same rows
/// - `evaluate` never signals row 0 or any row whose predecessor is cold
pub trait SignalEvaluator: Send + Sync {
    /// Evaluator name for logging.
    fn name(&self) -> &str;

    /// Does the transition `prev → row` fire? Warm-up is checked by `evaluate`.
    fn check(&self, prev: &IndicatorRow, row: &IndicatorRow) -> bool;

    /// Evaluate the whole frame into a boolean column.
    fn evaluate(&self, rows: &[IndicatorRow]) -> Vec<bool> {
        let mut column = vec![false; rows.len()];
        for i in 1..rows.len() {
            let (prev, row) = (&rows[i - 1], &rows[i]);
            column[i] = prev.warm && row.warm && self.check(prev, row);
        }
        column
    }
}

/// Phase crosses above lead phase below the zero line.
pub fn trough_crossing(prev: &IndicatorRow, row: &IndicatorRow) -> bool {
    prev.phase <= prev.lead_phase && row.phase > row.lead_phase && row.lead_phase < 0.0
}

/// Phase crosses below lead phase above the zero line.
pub fn peak_crossing(prev: &IndicatorRow, row: &IndicatorRow) -> bool {
    prev.phase >= prev.lead_phase && row.phase < row.lead_phase && row.lead_phase > 0.0
}

/// Dominant cycle length inside the tradable band.
pub fn cycle_in_bounds(row: &IndicatorRow, cycle: &CycleConfig) -> bool {
    row.dc_period >= cycle.min_period && row.dc_period <= cycle.max_period
}
