//! Signal engine: per-pair published frames and the per-tick decision calls.
//!
//! `refresh` is the only writer: it recomputes a pair's frame from its full
//! history and swaps in a new immutable snapshot. Decision calls read the
//! latest published row of that snapshot:
//!
//! 1. `stop_loss`: ATR stop distance in (−1, 0]
//! 2. `custom_exit`: tiered exit tag, or hold
//! 3. `stake_size`: regime/volatility-adjusted stake
//! 4. `confirm_entry`: low-liquidity window gate
//!
//! Decision calls never fail. Any error is logged and replaced by a safe
//! default (base hard stop, hold, clamped proposed stake).

pub mod liquidity;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rayon::prelude::*;
use serde::Serialize;

use crate::analyzers::InformativeSource;
use crate::config::EngineConfig;
use crate::domain::{Candle, CandleHistory, ExitDecision, Trade};
use crate::error::{ensure_finite, EngineError};
use crate::pipeline::{IndicatorFrame, IndicatorPipeline, IndicatorRow};
use crate::position_management::{CustomExitEvaluator, StopLossController};
use crate::sizers::{RegimeVolatilitySizer, Sizer, StakeRequest};

/// An immutable published frame for one pair.
#[derive(Debug, Clone, Serialize)]
pub struct PairSnapshot {
    pub pair: String,
    /// Monotonic across the engine; a newer refresh always has a larger one.
    pub version: u64,
    pub frame: IndicatorFrame,
}

impl PairSnapshot {
    pub fn latest(&self) -> Option<&IndicatorRow> {
        self.frame.last()
    }

    /// Entry signal on the latest candle.
    pub fn entry_signal(&self) -> bool {
        self.frame.entry().last().copied().unwrap_or(false)
    }

    /// Exit signal on the latest candle.
    pub fn exit_signal(&self) -> bool {
        self.frame.exit().last().copied().unwrap_or(false)
    }
}

pub struct SignalEngine {
    config: EngineConfig,
    pipeline: IndicatorPipeline,
    stop_loss: StopLossController,
    custom_exit: CustomExitEvaluator,
    sizer: RegimeVolatilitySizer,
    snapshots: DashMap<String, Arc<PairSnapshot>>,
    version: AtomicU64,
    informative: Option<Arc<dyn InformativeSource>>,
}

impl SignalEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            pipeline: IndicatorPipeline::new(&config),
            stop_loss: StopLossController::from_config(&config),
            custom_exit: CustomExitEvaluator::from_config(&config),
            sizer: RegimeVolatilitySizer::new(config.sizing.clone()),
            snapshots: DashMap::new(),
            version: AtomicU64::new(0),
            informative: None,
            config,
        }
    }

    /// Attach a higher-timeframe candle source.
    pub fn with_informative(mut self, source: Arc<dyn InformativeSource>) -> Self {
        self.informative = Some(source);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &IndicatorPipeline {
        &self.pipeline
    }

    /// Recompute and publish the frame for `history`'s pair.
    ///
    /// Returns the snapshot that is current for the pair afterwards, which
    /// is a newer one if a concurrent refresh of the same pair won.
    pub fn refresh(&self, history: &CandleHistory) -> Arc<PairSnapshot> {
        let pair = history.pair();
        let informative = self.fetch_informative(history);
        let frame = self.pipeline.run(history, informative.as_deref());

        let version = self.version.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(pair, rows = frame.len(), version, "published frame");

        self.publish(Arc::new(PairSnapshot {
            pair: pair.to_string(),
            version,
            frame,
        }))
    }

    /// Store `snapshot` unless the pair already holds a newer version.
    fn publish(&self, snapshot: Arc<PairSnapshot>) -> Arc<PairSnapshot> {
        match self.snapshots.entry(snapshot.pair.clone()) {
            Entry::Occupied(mut slot) => {
                if slot.get().version < snapshot.version {
                    slot.insert(Arc::clone(&snapshot));
                    snapshot
                } else {
                    tracing::debug!(
                        pair = %snapshot.pair,
                        stale = snapshot.version,
                        current = slot.get().version,
                        "dropped stale frame"
                    );
                    Arc::clone(slot.get())
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&snapshot));
                snapshot
            }
        }
    }

    /// Refresh independent pairs in parallel.
    pub fn refresh_many(&self, histories: &[CandleHistory]) -> Vec<Arc<PairSnapshot>> {
        histories.par_iter().map(|h| self.refresh(h)).collect()
    }

    /// Latest published snapshot for `pair`.
    pub fn snapshot(&self, pair: &str) -> Option<Arc<PairSnapshot>> {
        self.snapshots.get(pair).map(|s| Arc::clone(s.value()))
    }

    pub fn pairs(&self) -> Vec<String> {
        let mut pairs: Vec<String> = self.snapshots.iter().map(|e| e.key().clone()).collect();
        pairs.sort();
        pairs
    }

    fn fetch_informative(&self, history: &CandleHistory) -> Option<Vec<Candle>> {
        if !self.config.features.higher_timeframe {
            return None;
        }
        let source = self.informative.as_ref()?;
        match source.informative(history.pair(), self.config.informative.timeframe) {
            Ok(candles) => Some(candles),
            Err(e) => {
                tracing::warn!(
                    pair = history.pair(),
                    error = %e,
                    "informative fetch failed, using same-timeframe fallback"
                );
                None
            }
        }
    }

    fn latest_row(&self, pair: &str) -> Result<IndicatorRow, EngineError> {
        let snapshot = self
            .snapshot(pair)
            .ok_or_else(|| EngineError::UnknownPair(pair.to_string()))?;
        snapshot
            .latest()
            .cloned()
            .ok_or_else(|| EngineError::EmptyFrame(pair.to_string()))
    }

    /// Stop distance for an open trade, in (−1, 0].
    pub fn stop_loss(
        &self,
        pair: &str,
        trade: &Trade,
        now: DateTime<Utc>,
        current_rate: f64,
        current_profit: f64,
    ) -> f64 {
        match self.try_stop_loss(pair, current_rate, current_profit) {
            Ok(stop) => stop,
            Err(e) => {
                tracing::warn!(
                    pair,
                    opened = %trade.open_timestamp,
                    %now,
                    error = %e,
                    "stop_loss fell back to hard floor"
                );
                self.stop_loss.hard_floor()
            }
        }
    }

    fn try_stop_loss(
        &self,
        pair: &str,
        current_rate: f64,
        current_profit: f64,
    ) -> Result<f64, EngineError> {
        let row = self.latest_row(pair)?;
        self.stop_loss
            .try_stop(pair, &row, current_rate, current_profit)
    }

    /// Tiered custom exit for an open trade; `None` means hold.
    pub fn custom_exit(
        &self,
        pair: &str,
        trade: &Trade,
        now: DateTime<Utc>,
        current_rate: f64,
        current_profit: f64,
    ) -> Option<ExitDecision> {
        match self.try_custom_exit(pair, trade, now, current_rate, current_profit) {
            Ok(decision) => decision,
            Err(e) => {
                tracing::warn!(pair, error = %e, "custom_exit fell back to hold");
                None
            }
        }
    }

    fn try_custom_exit(
        &self,
        pair: &str,
        trade: &Trade,
        now: DateTime<Utc>,
        current_rate: f64,
        current_profit: f64,
    ) -> Result<Option<ExitDecision>, EngineError> {
        ensure_finite("current_rate", current_rate)?;
        let profit = ensure_finite("current_profit", current_profit)?;
        let row = self.latest_row(pair)?;
        Ok(self.custom_exit.evaluate(trade, &row, now, profit))
    }

    /// Stake for a proposed entry, always within the request's bounds.
    pub fn stake_size(
        &self,
        pair: &str,
        now: DateTime<Utc>,
        current_rate: f64,
        request: &StakeRequest,
    ) -> f64 {
        match self.try_stake_size(pair, current_rate, request) {
            Ok(stake) => stake,
            Err(e) => {
                tracing::warn!(pair, %now, error = %e, "stake_size fell back to proposed stake");
                request.fallback()
            }
        }
    }

    fn try_stake_size(
        &self,
        pair: &str,
        current_rate: f64,
        request: &StakeRequest,
    ) -> Result<f64, EngineError> {
        ensure_finite("current_rate", current_rate)?;
        ensure_finite("proposed_stake", request.proposed)?;
        let row = self.latest_row(pair)?;
        Ok(self.sizer.size(request, &row))
    }

    /// Last-moment entry gate. Depends only on the clock and the config.
    pub fn confirm_entry(&self, pair: &str, now: DateTime<Utc>, rate: f64, amount: f64) -> bool {
        if !self.config.features.liquidity_gate {
            return true;
        }
        let blocked = self.config.liquidity.contains(now);
        if blocked {
            tracing::debug!(pair, %now, rate, amount, "entry rejected in low-liquidity window");
        }
        !blocked
    }

    /// Whether the ROI ladder closes `trade` at `now` with `current_profit`.
    pub fn roi_reached(&self, trade: &Trade, now: DateTime<Utc>, current_profit: f64) -> bool {
        current_profit.is_finite()
            && self
                .config
                .roi
                .roi_reached(trade.elapsed_minutes(now), current_profit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Timeframe, TradeSide};
    use chrono::{Duration, TimeZone};

    fn history(pair: &str, n: usize) -> CandleHistory {
        let base = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
        let candles = (0..n).map(|i| {
            let close = 100.0 + 5.0 * (i as f64 * std::f64::consts::TAU / 20.0).sin();
            Candle {
                timestamp: base + Duration::minutes(5 * i as i64),
                open: close - 0.2,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000.0,
            }
        });
        CandleHistory::from_candles(pair, Timeframe::M5, candles).unwrap()
    }

    fn trade(pair: &str) -> Trade {
        Trade {
            pair: pair.into(),
            entry_price: 100.0,
            open_timestamp: Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap(),
            current_stake: 100.0,
        }
    }

    fn request() -> StakeRequest {
        StakeRequest {
            proposed: 100.0,
            min_stake: 10.0,
            max_stake: 80.0,
            leverage: 1.0,
            entry_tag: None,
            side: TradeSide::Long,
        }
    }

    #[test]
    fn refresh_publishes_increasing_versions() {
        let engine = SignalEngine::new(EngineConfig::default());
        let first = engine.refresh(&history("SOL/USDT", 120));
        let second = engine.refresh(&history("SOL/USDT", 121));
        assert!(second.version > first.version);
        assert_eq!(engine.snapshot("SOL/USDT").unwrap().version, second.version);
        // The earlier snapshot is untouched.
        assert_eq!(first.frame.len(), 120);
    }

    #[test]
    fn stale_snapshot_never_replaces_newer_one() {
        let engine = SignalEngine::new(EngineConfig::default());
        let newer = engine.refresh(&history("SOL/USDT", 121));
        let stale = Arc::new(PairSnapshot {
            pair: "SOL/USDT".into(),
            version: newer.version - 1,
            frame: IndicatorFrame::default(),
        });
        let current = engine.publish(stale);
        assert_eq!(current.version, newer.version);
        assert_eq!(engine.snapshot("SOL/USDT").unwrap().frame.len(), 121);
    }

    #[test]
    fn duplicate_pairs_in_one_batch_keep_the_highest_version() {
        let engine = SignalEngine::new(EngineConfig::default());
        let histories: Vec<_> = (0..8).map(|k| history("SOL/USDT", 100 + k)).collect();
        let returned = engine.refresh_many(&histories);
        let highest = returned.iter().map(|s| s.version).max().unwrap();
        assert_eq!(engine.snapshot("SOL/USDT").unwrap().version, highest);
        assert_eq!(highest, 8);
    }

    #[test]
    fn unknown_pair_returns_safe_defaults() {
        let engine = SignalEngine::new(EngineConfig::default());
        let now = Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap();
        let t = trade("ETH/USDT");
        assert_eq!(engine.stop_loss("ETH/USDT", &t, now, 100.0, 0.0), -0.10);
        assert!(engine.custom_exit("ETH/USDT", &t, now, 100.0, 0.05).is_none());
        assert_eq!(engine.stake_size("ETH/USDT", now, 100.0, &request()), 80.0);
    }

    #[test]
    fn empty_history_returns_safe_defaults() {
        let engine = SignalEngine::new(EngineConfig::default());
        engine.refresh(&CandleHistory::new("SOL/USDT", Timeframe::M5));
        let now = Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap();
        assert_eq!(
            engine.stop_loss("SOL/USDT", &trade("SOL/USDT"), now, 100.0, 0.0),
            -0.10
        );
        assert_eq!(engine.stake_size("SOL/USDT", now, 100.0, &request()), 80.0);
    }

    #[test]
    fn decisions_on_published_pair_stay_in_bounds() {
        let engine = SignalEngine::new(EngineConfig::default());
        engine.refresh(&history("SOL/USDT", 200));
        let now = Utc.with_ymd_and_hms(2024, 3, 4, 16, 40, 0).unwrap();
        let stop = engine.stop_loss("SOL/USDT", &trade("SOL/USDT"), now, 100.0, 0.01);
        assert!(stop > -1.0 && stop <= 0.0);
        assert!(stop >= -0.10);
        let stake = engine.stake_size("SOL/USDT", now, 100.0, &request());
        assert!((10.0..=80.0).contains(&stake));
    }

    #[test]
    fn refresh_many_publishes_every_pair() {
        let engine = SignalEngine::new(EngineConfig::default());
        let histories = vec![history("SOL/USDT", 100), history("ETH/USDT", 100)];
        let snapshots = engine.refresh_many(&histories);
        assert_eq!(snapshots.len(), 2);
        assert_eq!(engine.pairs(), vec!["ETH/USDT".to_string(), "SOL/USDT".to_string()]);
    }

    #[test]
    fn confirm_entry_honours_feature_flag() {
        let saturday = Utc.with_ymd_and_hms(2024, 3, 2, 10, 0, 0).unwrap();
        let monday = Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap();
        let engine = SignalEngine::new(EngineConfig::default());
        assert!(!engine.confirm_entry("ANY/USDT", saturday, 1.0, 1.0));
        assert!(engine.confirm_entry("ANY/USDT", monday, 1.0, 1.0));

        let mut config = EngineConfig::default();
        config.features.liquidity_gate = false;
        let ungated = SignalEngine::new(config);
        assert!(ungated.confirm_entry("ANY/USDT", saturday, 1.0, 1.0));
    }

    #[test]
    fn roi_ladder_through_engine() {
        let engine = SignalEngine::new(EngineConfig::default());
        let t = trade("SOL/USDT");
        let after = |m| t.open_timestamp + Duration::minutes(m);
        assert!(!engine.roi_reached(&t, after(10), 0.03));
        assert!(engine.roi_reached(&t, after(35), 0.03));
        assert!(!engine.roi_reached(&t, after(90), f64::NAN));
    }

    #[test]
    fn engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SignalEngine>();
    }
}
