//! CycleLab Core: adaptive cycle signals and per-trade risk decisions.
//!
//! This crate contains the whole engine:
//! - Domain types (candles, append-only history, trades, exit tags, regimes)
//! - Primitive indicators and composite analyzers (cycle, volatility, regime, fractal order)
//! - The indicator pipeline: history in, finite indicator frame out
//! - Entry and exit signal columns
//! - Stop-loss, tiered custom exit and stake sizing for open trades
//! - `SignalEngine`, the per-pair store of published frames

pub mod analyzers;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod pipeline;
pub mod position_management;
pub mod signals;
pub mod sizers;

pub use analyzers::InformativeSource;
pub use config::EngineConfig;
pub use domain::{Candle, CandleHistory, ExitDecision, ExitTag, Regime, Timeframe, Trade, TradeSide};
pub use engine::{PairSnapshot, SignalEngine};
pub use error::EngineError;
pub use pipeline::{IndicatorFrame, IndicatorPipeline, IndicatorRow};
pub use sizers::StakeRequest;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything shared across threads is Send + Sync.
    ///
    /// `refresh_many` hands histories to rayon and readers clone published
    /// snapshots from other threads; a non-Sync field breaks the build here.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<Candle>();
        require_sync::<Candle>();
        require_send::<CandleHistory>();
        require_sync::<CandleHistory>();
        require_send::<Trade>();
        require_sync::<Trade>();
        require_send::<ExitDecision>();
        require_sync::<ExitDecision>();

        // Pipeline output
        require_send::<IndicatorRow>();
        require_sync::<IndicatorRow>();
        require_send::<IndicatorFrame>();
        require_sync::<IndicatorFrame>();
        require_send::<PairSnapshot>();
        require_sync::<PairSnapshot>();

        // Evaluators
        require_send::<signals::EntrySignalEvaluator>();
        require_sync::<signals::EntrySignalEvaluator>();
        require_send::<signals::ExitSignalEvaluator>();
        require_sync::<signals::ExitSignalEvaluator>();
        require_send::<position_management::StopLossController>();
        require_sync::<position_management::StopLossController>();
        require_send::<position_management::CustomExitEvaluator>();
        require_sync::<position_management::CustomExitEvaluator>();
        require_send::<sizers::RegimeVolatilitySizer>();
        require_sync::<sizers::RegimeVolatilitySizer>();

        // Engine
        require_send::<IndicatorPipeline>();
        require_sync::<IndicatorPipeline>();
        require_send::<SignalEngine>();
        require_sync::<SignalEngine>();
    }

    /// Architecture contract: signal evaluators never see an open trade.
    ///
    /// `check` takes two indicator rows and nothing else.
    #[test]
    fn signal_evaluator_trait_has_no_trade_parameter() {
        fn _check_trait_object_builds(
            evaluator: &dyn signals::SignalEvaluator,
            prev: &IndicatorRow,
            row: &IndicatorRow,
        ) -> bool {
            evaluator.check(prev, row)
        }
    }

    /// Architecture contract: sizers return a number, never an entry decision.
    #[test]
    fn sizer_trait_only_sizes() {
        fn _check_trait_object_builds(
            sizer: &dyn sizers::Sizer,
            request: &StakeRequest,
            row: &IndicatorRow,
        ) -> f64 {
            sizer.size(request, row)
        }
    }
}
