//! Position management: per-trade stop distance and custom exit.
//!
//! **Key Design Principles:**
//! 1. Decisions are pure functions of (trade, latest row, config)
//! 2. The stop is never looser than the configured hard floor
//! 3. Custom exit rules are mutually exclusive, first match wins
//!
//! **Module Structure:**
//! - `stop_loss`: ATR stop with profit-dependent multiplier and bounds
//! - `custom_exit`: duration tiers, cycle maturity, overheat, trend break
pub mod custom_exit;
pub mod stop_loss;

pub use custom_exit::CustomExitEvaluator;
pub use stop_loss::StopLossController;
