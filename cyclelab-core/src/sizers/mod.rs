//! Position sizers: scale the proposed stake
//!
//! Sizers scale the stake the execution collaborator proposes. They read the
//! latest indicator row but never decide entry or exit.

pub mod regime_volatility;

pub use regime_volatility::RegimeVolatilitySizer;

use serde::{Deserialize, Serialize};

use crate::domain::TradeSide;
use crate::pipeline::IndicatorRow;

/// Everything the caller knows about a proposed stake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeRequest {
    pub proposed: f64,
    pub min_stake: f64,
    pub max_stake: f64,
    /// Passed through; stake is margin, not notional.
    pub leverage: f64,
    pub entry_tag: Option<String>,
    pub side: TradeSide,
}

impl StakeRequest {
    /// The proposed stake clamped into bounds. The safe default.
    pub fn fallback(&self) -> f64 {
        clamp_stake(self.proposed, self.min_stake, self.max_stake)
    }
}

/// Position sizing logic
///
/// # Responsibilities
/// - Scale the proposed stake by market conditions in the latest row
/// - Always return a value within `[min_stake, max_stake]`
///
/// # Non-Responsibilities
/// - Sizers do NOT decide entry/exit
pub trait Sizer: Send + Sync {
    /// Stake to commit for `request` given the latest row.
    fn size(&self, request: &StakeRequest, row: &IndicatorRow) -> f64;

    /// Sizer name for logging
    fn name(&self) -> &str;
}

/// Clamp a stake into `[min_stake, max_stake]`.
///
/// When the bounds are inverted `max_stake` wins. A NaN stake maps to the
/// lower bound. Never panics, whatever the inputs.
pub fn clamp_stake(stake: f64, min_stake: f64, max_stake: f64) -> f64 {
    let lower = if min_stake > max_stake {
        max_stake
    } else {
        min_stake
    };
    let stake = if stake.is_nan() { lower } else { stake };
    stake.max(lower).min(max_stake)
}
