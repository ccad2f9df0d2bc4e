//! Domain types for CycleLab

pub mod candle;
pub mod exit;
pub mod regime;
pub mod timeframe;
pub mod trade;

pub use candle::{Candle, CandleHistory};
pub use exit::{ExitDecision, ExitTag};
pub use regime::Regime;
pub use timeframe::Timeframe;
pub use trade::{Trade, TradeSide};
