//! IndicatorRow and IndicatorFrame: the pipeline's published output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Regime;

/// Every derived value for one candle. All numeric fields are finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub dc_period: f64,
    pub phase: f64,
    pub lead_phase: f64,
    pub cycle_strength: f64,
    pub atr: f64,
    pub atr_pct: f64,
    pub atr_ratio: f64,
    pub volatility_rank: f64,
    pub adx: f64,
    pub di_spread: f64,
    pub regime: Regime,
    pub rsi: f64,
    pub momentum_rank: f64,
    pub ema_fast: f64,
    pub ema_long: f64,
    pub rvol: f64,
    /// close / close `structure_lookback` candles ago − 1.
    pub close_change: f64,
    pub htf_trend_up: bool,
    pub hurst: f64,
    pub entropy: f64,
    pub efficiency: f64,
    /// False while any enabled indicator still holds a placeholder.
    pub warm: bool,
}

impl IndicatorRow {
    /// phase − lead_phase; negative once the wave has turned down.
    pub fn wave_gap(&self) -> f64 {
        self.phase - self.lead_phase
    }
}

/// Rows aligned 1:1 with a candle history, plus the signal columns.
///
/// Built once per refresh and never mutated after publication.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorFrame {
    rows: Vec<IndicatorRow>,
    entry: Vec<bool>,
    exit: Vec<bool>,
}

impl IndicatorFrame {
    pub fn new(rows: Vec<IndicatorRow>, entry: Vec<bool>, exit: Vec<bool>) -> Self {
        debug_assert_eq!(rows.len(), entry.len());
        debug_assert_eq!(rows.len(), exit.len());
        Self { rows, entry, exit }
    }

    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn entry(&self) -> &[bool] {
        &self.entry
    }

    pub fn exit(&self) -> &[bool] {
        &self.exit
    }

    /// Latest completed row.
    pub fn last(&self) -> Option<&IndicatorRow> {
        self.rows.last()
    }

    pub fn get(&self, index: usize) -> Option<&IndicatorRow> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Indices of candles carrying an entry signal.
    pub fn entry_indices(&self) -> Vec<usize> {
        flagged(&self.entry)
    }

    /// Indices of candles carrying an exit signal.
    pub fn exit_indices(&self) -> Vec<usize> {
        flagged(&self.exit)
    }
}

fn flagged(column: &[bool]) -> Vec<usize> {
    column
        .iter()
        .enumerate()
        .filter_map(|(i, &f)| f.then_some(i))
        .collect()
}

#[cfg(test)]
pub(crate) fn neutral_row(timestamp: DateTime<Utc>, close: f64) -> IndicatorRow {
    IndicatorRow {
        timestamp,
        close,
        dc_period: 20.0,
        phase: 0.0,
        lead_phase: 0.0,
        cycle_strength: 0.5,
        atr: 1.0,
        atr_pct: 1.0 / close,
        atr_ratio: 1.0,
        volatility_rank: 0.5,
        adx: 22.5,
        di_spread: 0.0,
        regime: Regime::Transitional,
        rsi: 50.0,
        momentum_rank: 0.5,
        ema_fast: close,
        ema_long: close,
        rvol: 1.0,
        close_change: 0.0,
        htf_trend_up: false,
        hurst: 0.5,
        entropy: 10f64.log2(),
        efficiency: 0.0,
        warm: true,
    }
}
