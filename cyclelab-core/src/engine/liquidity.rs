//! Weekly low-liquidity window.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};

use crate::config::LiquidityWindow;

const MINUTES_PER_DAY: u32 = 24 * 60;

fn minute_of_week(weekday: Weekday, hour: u32, minute: u32) -> u32 {
    weekday.num_days_from_monday() * MINUTES_PER_DAY + hour * 60 + minute
}

impl LiquidityWindow {
    /// True if `now` falls inside `[start, end)`.
    ///
    /// A window whose end precedes its start wraps over the week boundary.
    /// Equal start and end is an empty window.
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        let start = minute_of_week(self.start_weekday, self.start_hour, 0);
        let end = minute_of_week(self.end_weekday, self.end_hour, 0);
        let t = minute_of_week(now.weekday(), now.hour(), now.minute());

        if start <= end {
            start <= t && t < end
        } else {
            t >= start || t < end
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // 2024-03-02 is a Saturday.
    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, minute, 0).unwrap()
    }

    #[test]
    fn default_window_is_saturday_to_sunday_evening() {
        let w = LiquidityWindow::default();
        assert!(!w.contains(at(1, 23, 59)));
        assert!(w.contains(at(2, 0, 0)));
        assert!(w.contains(at(3, 12, 0)));
        assert!(w.contains(at(3, 19, 59)));
        assert!(!w.contains(at(3, 20, 0)));
        assert!(!w.contains(at(4, 9, 0)));
    }

    #[test]
    fn window_wrapping_the_week() {
        let w = LiquidityWindow {
            start_weekday: Weekday::Sun,
            start_hour: 22,
            end_weekday: Weekday::Mon,
            end_hour: 2,
        };
        assert!(w.contains(at(3, 23, 0)));
        assert!(w.contains(at(4, 1, 30)));
        assert!(!w.contains(at(4, 2, 0)));
        assert!(!w.contains(at(2, 12, 0)));
    }

    #[test]
    fn empty_window() {
        let w = LiquidityWindow {
            start_weekday: Weekday::Wed,
            start_hour: 8,
            end_weekday: Weekday::Wed,
            end_hour: 8,
        };
        assert!(!w.contains(Utc.with_ymd_and_hms(2024, 3, 6, 8, 0, 0).unwrap()));
    }
}
