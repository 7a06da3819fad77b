//! Time periods and their sampling timelines.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when constructing a [`Period`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PeriodError {
    #[error("Period end {end} is not after start {start}")]
    EmptyRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("Sampling interval must be positive, got {0} seconds")]
    InvalidInterval(i64),
}

/// Half-open time interval `[start, end)` sampled every `interval` seconds.
///
/// The timeline is `start, start + interval, ...` up to but excluding `end`.
/// A trailing partial interval is not sampled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    start: NaiveDateTime,
    end: NaiveDateTime,
    interval: i64,
}

impl Period {
    /// Create a new period.
    ///
    /// # Arguments
    /// * `start` - First sampled instant
    /// * `end` - Exclusive upper bound
    /// * `interval` - Sampling interval in seconds
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, interval: i64) -> Result<Self, PeriodError> {
        if interval <= 0 {
            return Err(PeriodError::InvalidInterval(interval));
        }
        if end <= start {
            return Err(PeriodError::EmptyRange { start, end });
        }
        Ok(Self {
            start,
            end,
            interval,
        })
    }

    /// The whole calendar day `date`, as the daily batch computes it.
    pub fn for_day(date: NaiveDate, interval: i64) -> Result<Self, PeriodError> {
        let start = date.and_time(chrono::NaiveTime::MIN);
        Self::new(start, start + Duration::days(1), interval)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end.date()
    }

    /// Year of the period start; selects the per-year travel-time table.
    pub fn year(&self) -> i32 {
        self.start.year()
    }

    /// Sampling interval in seconds.
    pub fn interval(&self) -> i64 {
        self.interval
    }

    /// Sampling interval in hours.
    pub fn interval_hours(&self) -> f64 {
        self.interval as f64 / 3600.0
    }

    /// Number of samples in the timeline.
    pub fn len(&self) -> usize {
        ((self.end - self.start).num_seconds() / self.interval) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ordered sample instants of this period.
    pub fn timeline(&self) -> Vec<NaiveDateTime> {
        let step = Duration::seconds(self.interval);
        (0..self.len() as i32)
            .map(|i| self.start + step * i)
            .collect()
    }

    /// Whether `time` falls inside `[start, end)`.
    pub fn contains(&self, time: NaiveDateTime) -> bool {
        self.start <= time && time < self.end
    }

    /// Human readable form used in log lines.
    pub fn period_string(&self) -> String {
        format!(
            "{} ~ {} ({}s)",
            self.start.format("%Y-%m-%d %H:%M:%S"),
            self.end.format("%Y-%m-%d %H:%M:%S"),
            self.interval
        )
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.period_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_timeline_is_half_open() {
        let prd = Period::new(at(7, 0), at(7, 15), 300).unwrap();
        assert_eq!(prd.timeline(), vec![at(7, 0), at(7, 5), at(7, 10)]);
        assert_eq!(prd.len(), 3);
        assert!(prd.contains(at(7, 10)));
        assert!(!prd.contains(at(7, 15)));
    }

    #[test]
    fn test_partial_trailing_interval_is_dropped() {
        let prd = Period::new(at(7, 0), at(7, 12), 300).unwrap();
        assert_eq!(prd.len(), 2);
    }

    #[test]
    fn test_for_day() {
        let prd = Period::for_day(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(), 300).unwrap();
        assert_eq!(prd.len(), 288);
        assert_eq!(prd.year(), 2024);
        assert!((prd.interval_hours() - 300.0 / 3600.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_invalid_ranges() {
        assert!(matches!(
            Period::new(at(7, 0), at(7, 0), 300),
            Err(PeriodError::EmptyRange { .. })
        ));
        assert_eq!(
            Period::new(at(7, 0), at(8, 0), 0),
            Err(PeriodError::InvalidInterval(0))
        );
    }
}
