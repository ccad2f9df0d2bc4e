//! Exit decisions emitted by the custom exit evaluator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which custom exit rule fired. Mutually exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitTag {
    /// Short hold, small profit, shallow wave pullback.
    WaveEarly,
    /// Medium hold, moderate profit, deeper pullback.
    WaveMature,
    /// Long hold, large profit, deep pullback.
    WaveLongTerm,
    /// Held past an adaptive share of the dominant cycle.
    CycleMaturity,
    /// Volatility and momentum both at the top of their ranges.
    Overheat,
    /// Price lost the long trend with negative directional spread.
    TrendBreak,
}

impl ExitTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WaveEarly => "wave_early",
            Self::WaveMature => "wave_mature",
            Self::WaveLongTerm => "wave_long_term",
            Self::CycleMaturity => "cycle_maturity",
            Self::Overheat => "overheat",
            Self::TrendBreak => "trend_break",
        }
    }
}

impl fmt::Display for ExitTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fired exit rule. Produced per call, never stored by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitDecision {
    pub tag: ExitTag,
    pub emitted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_render_stable_strings() {
        assert_eq!(ExitTag::WaveEarly.to_string(), "wave_early");
        assert_eq!(ExitTag::TrendBreak.as_str(), "trend_break");
        let json = serde_json::to_string(&ExitTag::WaveLongTerm).unwrap();
        assert_eq!(json, "\"wave_long_term\"");
    }
}
