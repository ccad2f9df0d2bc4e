//! Trade snapshot: owned by the execution collaborator, read by the engine.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::Timeframe;

/// Direction of a proposed or open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Long,
    Short,
}

/// Open trade as seen by the engine. Never mutated here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub pair: String,
    pub entry_price: f64,
    pub open_timestamp: DateTime<Utc>,
    pub current_stake: f64,
}

impl Trade {
    /// Holding time at `now`; zero if `now` precedes the open.
    pub fn duration(&self, now: DateTime<Utc>) -> Duration {
        (now - self.open_timestamp).max(Duration::zero())
    }

    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> f64 {
        self.duration(now).num_seconds() as f64 / 60.0
    }

    /// Number of whole base candles elapsed since the open.
    pub fn elapsed_candles(&self, now: DateTime<Utc>, timeframe: Timeframe) -> i64 {
        self.duration(now).num_minutes() / timeframe.minutes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn trade() -> Trade {
        Trade {
            pair: "SOL/USDT".into(),
            entry_price: 100.0,
            open_timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            current_stake: 250.0,
        }
    }

    #[test]
    fn elapsed_minutes_and_candles() {
        let t = trade();
        let now = t.open_timestamp + Duration::minutes(47);
        assert_eq!(t.elapsed_minutes(now), 47.0);
        assert_eq!(t.elapsed_candles(now, Timeframe::M5), 9);
    }

    #[test]
    fn duration_never_negative() {
        let t = trade();
        let before = t.open_timestamp - Duration::minutes(10);
        assert_eq!(t.duration(before), Duration::zero());
        assert_eq!(t.elapsed_candles(before, Timeframe::M5), 0);
    }
}
