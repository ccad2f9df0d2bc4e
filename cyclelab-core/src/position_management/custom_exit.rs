//! Tiered, duration-aware custom exit for a single open trade.
//!
//! Rules are checked in a fixed order and the first match wins:
//! 1. wave pullback tier for the trade's holding time
//! 2. cycle maturity
//! 3. overheat
//! 4. trend break

use chrono::{DateTime, Utc};

use crate::config::{CustomExitConfig, EngineConfig};
use crate::domain::{ExitDecision, ExitTag, Timeframe, Trade};
use crate::pipeline::IndicatorRow;

#[derive(Debug, Clone)]
pub struct CustomExitEvaluator {
    config: CustomExitConfig,
    timeframe: Timeframe,
    enabled: bool,
}

impl CustomExitEvaluator {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            config: config.custom_exit.clone(),
            timeframe: config.timeframe,
            enabled: config.features.tiered_exits,
        }
    }

    /// Which rule fires for `trade` at `now`, if any.
    ///
    /// A cold row or a disabled feature always holds.
    pub fn evaluate(
        &self,
        trade: &Trade,
        row: &IndicatorRow,
        now: DateTime<Utc>,
        current_profit: f64,
    ) -> Option<ExitDecision> {
        if !self.enabled || !row.warm || !current_profit.is_finite() {
            return None;
        }

        let tag = self
            .wave_tier(trade, row, now, current_profit)
            .or_else(|| self.cycle_maturity(trade, row, now, current_profit))
            .or_else(|| self.overheat(row, current_profit))
            .or_else(|| self.trend_break(row, current_profit))?;

        Some(ExitDecision {
            tag,
            emitted_at: now,
        })
    }

    fn wave_tier(
        &self,
        trade: &Trade,
        row: &IndicatorRow,
        now: DateTime<Utc>,
        profit: f64,
    ) -> Option<ExitTag> {
        let c = &self.config;
        let minutes = trade.elapsed_minutes(now);
        let gap = row.wave_gap();

        let (tag, min_profit, pullback) = if minutes < c.early_max_minutes {
            (ExitTag::WaveEarly, c.early_profit, c.early_pullback)
        } else if minutes < c.mature_max_minutes {
            (ExitTag::WaveMature, c.mature_profit, c.mature_pullback)
        } else {
            (ExitTag::WaveLongTerm, c.long_profit, c.long_pullback)
        };

        (profit > min_profit && gap <= -pullback).then_some(tag)
    }

    fn cycle_maturity(
        &self,
        trade: &Trade,
        row: &IndicatorRow,
        now: DateTime<Utc>,
        profit: f64,
    ) -> Option<ExitTag> {
        let c = &self.config;
        let held = trade.elapsed_candles(now, self.timeframe) as f64;
        let lo = c.maturity_min_candles.min(c.maturity_max_candles);
        let hi = c.maturity_min_candles.max(c.maturity_max_candles);
        let mature_after = (c.maturity_fraction * row.dc_period).max(lo).min(hi);
        let profit_floor = c.maturity_min_profit.max(c.maturity_atr_share * row.atr_pct);

        (held > mature_after && profit > profit_floor).then_some(ExitTag::CycleMaturity)
    }

    fn overheat(&self, row: &IndicatorRow, profit: f64) -> Option<ExitTag> {
        let c = &self.config;
        (row.volatility_rank > c.overheat_rank
            && row.momentum_rank > c.overheat_rank
            && profit > c.overheat_profit)
            .then_some(ExitTag::Overheat)
    }

    fn trend_break(&self, row: &IndicatorRow, profit: f64) -> Option<ExitTag> {
        (row.close < row.ema_long
            && row.di_spread < self.config.trend_break_spread
            && profit >= 0.0)
            .then_some(ExitTag::TrendBreak)
    }
}
