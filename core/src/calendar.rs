//! Peak calendar and the message time cursor.
//!
//! The cursor is an explicit accumulator: `step` consumes the current
//! cursor and returns (timestamp, next cursor). Each record's spacing
//! depends on where the previous record landed relative to the peaks.

use crate::{
    error::{GenError, GenResult},
    rng::StreamRng,
};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A fixed calendar day with a modeled traffic and fraud surge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeakDate {
    pub month: u32,
    pub day: u32,
}

impl PeakDate {
    pub fn new(month: u32, day: u32) -> Self {
        Self { month, day }
    }

    /// Days from `date` to the next occurrence of this peak (0 on the day).
    pub fn days_until(&self, date: NaiveDate) -> Option<i64> {
        (date.year()..=date.year() + 8)
            .filter_map(|y| NaiveDate::from_ymd_opt(y, self.month, self.day))
            .find(|p| *p >= date)
            .map(|p| (p - date).num_days())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Proximity {
    Normal,
    LeadIn,
    PeakDay,
}

impl Proximity {
    pub fn is_elevated(&self) -> bool {
        !matches!(self, Self::Normal)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeakCalendar {
    pub peaks: Vec<PeakDate>,
    pub lead_in_days: i64,
}

impl Default for PeakCalendar {
    fn default() -> Self {
        Self {
            peaks: vec![PeakDate::new(12, 25), PeakDate::new(1, 1)],
            lead_in_days: 5,
        }
    }
}

impl PeakCalendar {
    pub fn validate(&self) -> GenResult<()> {
        if self.peaks.is_empty() {
            return Err(GenError::config("peak calendar has no peak dates"));
        }
        for p in &self.peaks {
            // 2024 is a leap year, so Feb 29 is accepted.
            if NaiveDate::from_ymd_opt(2024, p.month, p.day).is_none() {
                return Err(GenError::config(format!(
                    "invalid peak date {:02}-{:02}",
                    p.month, p.day
                )));
            }
        }
        if self.lead_in_days < 0 {
            return Err(GenError::config("lead-in window must be non-negative"));
        }
        Ok(())
    }

    pub fn proximity(&self, date: NaiveDate) -> Proximity {
        let mut best = Proximity::Normal;
        for peak in &self.peaks {
            match peak.days_until(date) {
                Some(0) => return Proximity::PeakDay,
                Some(d) if d <= self.lead_in_days => best = Proximity::LeadIn,
                _ => {}
            }
        }
        best
    }
}

/// Ranges for the per-record spacing factor (fraction of the base interval).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JitterModel {
    pub normal: (f64, f64),
    pub lead_in: (f64, f64),
    pub peak_day: (f64, f64),
    pub burst_probability: f64,
    pub burst_factor: f64,
}

impl Default for JitterModel {
    fn default() -> Self {
        Self {
            normal: (0.5, 1.5),
            lead_in: (0.3, 0.9),
            peak_day: (0.1, 0.5),
            burst_probability: 0.03,
            burst_factor: 0.1,
        }
    }
}

impl JitterModel {
    pub fn validate(&self) -> GenResult<()> {
        for (name, (lo, hi)) in [
            ("normal", self.normal),
            ("lead_in", self.lead_in),
            ("peak_day", self.peak_day),
        ] {
            if !(lo > 0.0 && lo <= hi) {
                return Err(GenError::config(format!("jitter range {name} ({lo}, {hi}) invalid")));
            }
        }
        if !(0.0..=1.0).contains(&self.burst_probability) || self.burst_factor <= 0.0 {
            return Err(GenError::config("burst parameters out of range"));
        }
        Ok(())
    }

    fn factor(&self, proximity: Proximity, rng: &mut StreamRng) -> f64 {
        let (lo, hi) = match proximity {
            Proximity::Normal => self.normal,
            Proximity::LeadIn => self.lead_in,
            Proximity::PeakDay => self.peak_day,
        };
        let mut f = rng.uniform(lo, hi);
        if rng.chance(self.burst_probability) {
            f *= self.burst_factor;
        }
        f
    }
}

/// Position of the generator in time, plus what is left to place.
///
/// Each step spreads the remaining span over the remaining records, so
/// dense peak windows borrow time from the rest of the range and the
/// last record still lands close to `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeCursor {
    pub at: NaiveDateTime,
    pub end: NaiveDateTime,
    pub remaining: u64,
}

impl TimeCursor {
    /// Cursor for `count` records spread over [start, end].
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, count: u64) -> Self {
        Self {
            at: start,
            end,
            remaining: count,
        }
    }

    /// Mean spacing of the records still to be placed.
    pub fn base_interval_ms(&self) -> i64 {
        let left_ms = (self.end - self.at).num_milliseconds().max(0);
        left_ms / self.remaining.max(1) as i64
    }

    /// Emit the current timestamp and the cursor for the next record.
    pub fn step(
        self,
        calendar: &PeakCalendar,
        jitter: &JitterModel,
        rng: &mut StreamRng,
    ) -> (NaiveDateTime, Proximity, TimeCursor) {
        let timestamp = self.at.min(self.end);
        let proximity = calendar.proximity(timestamp.date());
        let factor = jitter.factor(proximity, rng);
        let offset_ms = (self.base_interval_ms() as f64 * factor).round().max(1.0) as i64;
        let next = TimeCursor {
            at: (self.at + Duration::milliseconds(offset_ms)).min(self.end),
            end: self.end,
            remaining: self.remaining.saturating_sub(1),
        };
        (timestamp, proximity, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn proximity_windows() {
        let cal = PeakCalendar::default();
        assert_eq!(cal.proximity(date(2024, 12, 25)), Proximity::PeakDay);
        assert_eq!(cal.proximity(date(2024, 12, 21)), Proximity::LeadIn);
        assert_eq!(cal.proximity(date(2024, 12, 19)), Proximity::Normal);
        // Jan 1 lead-in wraps the year boundary.
        assert_eq!(cal.proximity(date(2024, 12, 28)), Proximity::LeadIn);
        assert_eq!(cal.proximity(date(2025, 1, 1)), Proximity::PeakDay);
        assert_eq!(cal.proximity(date(2025, 1, 2)), Proximity::Normal);
    }

    #[test]
    fn invalid_peak_is_rejected() {
        let cal = PeakCalendar {
            peaks: vec![PeakDate::new(2, 30)],
            lead_in_days: 5,
        };
        assert!(cal.validate().is_err());
    }

    #[test]
    fn cursor_is_monotonic_and_bounded() {
        let start = date(2024, 12, 1).and_hms_opt(0, 0, 0).unwrap();
        let end = date(2025, 1, 5).and_hms_opt(0, 0, 0).unwrap();
        let cal = PeakCalendar::default();
        let jitter = JitterModel::default();
        let mut rng = StreamRng::new(9, 1);

        let mut cursor = TimeCursor::new(start, end, 5_000);
        let mut prev = start;
        for _ in 0..5_000 {
            let (ts, _, next) = cursor.step(&cal, &jitter, &mut rng);
            assert!(ts >= prev && ts <= end);
            prev = ts;
            cursor = next;
        }
        assert_eq!(cursor.remaining, 0);
    }

    #[test]
    fn cursor_reaches_the_end_of_the_range() {
        let start = date(2024, 12, 10).and_hms_opt(0, 0, 0).unwrap();
        let end = date(2025, 1, 9).and_hms_opt(0, 0, 0).unwrap();
        let cal = PeakCalendar::default();
        let jitter = JitterModel::default();
        let mut rng = StreamRng::new(42, 1);

        let mut cursor = TimeCursor::new(start, end, 2_000);
        let mut last = start;
        let mut on_peak = [0usize; 2];
        for _ in 0..2_000 {
            let (ts, _, next) = cursor.step(&cal, &jitter, &mut rng);
            match (ts.month(), ts.day()) {
                (12, 25) => on_peak[0] += 1,
                (1, 1) => on_peak[1] += 1,
                _ => {}
            }
            last = ts;
            cursor = next;
        }
        assert!(end - last <= Duration::days(1), "last record at {last}");
        assert!(on_peak.iter().all(|n| *n > 0), "peak counts {on_peak:?}");
    }
}
