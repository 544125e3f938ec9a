//! The simulation week counter and calendar derivations.
//!
//! One [`SimulationClock`] instance is owned by the model and advanced
//! exactly once per tick, after every fish, redd, and reach has been
//! stepped. The year and week-of-year derivations drive the seasonal
//! behavior windows, so the calendar geometry is validated once at
//! construction and never changes afterwards.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TimeSettings;

/// Errors from clock construction or advancement.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClockError {
    /// The week counter cannot be advanced past `u64::MAX`.
    #[error("week counter overflow: cannot advance beyond u64::MAX")]
    WeekOverflow,

    /// The calendar geometry is unusable.
    #[error("invalid clock configuration: {reason}")]
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
}

/// Monotone week counter with a fixed simulated calendar.
///
/// The clock counts whole simulation weeks from zero. Weeks are mapped
/// onto years by `weeks_per_year`; `days_per_week` scales weekly rates
/// such as redd degree-day accrual. Both are fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationClock {
    week: u64,
    weeks_per_year: u32,
    days_per_week: u32,
}

impl SimulationClock {
    /// Creates a clock at week zero from validated time settings.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] when `weeks_per_year` or
    /// `days_per_week` is zero.
    pub fn new(settings: TimeSettings) -> Result<Self, ClockError> {
        Self::from_parts(0, settings.weeks_per_year, settings.days_per_week)
    }

    /// Restores a clock from raw parts, validating the calendar geometry.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] when `weeks_per_year` or
    /// `days_per_week` is zero.
    pub fn from_parts(
        week: u64,
        weeks_per_year: u32,
        days_per_week: u32,
    ) -> Result<Self, ClockError> {
        if weeks_per_year == 0 {
            return Err(ClockError::InvalidConfig {
                reason: String::from("weeks_per_year must be at least 1"),
            });
        }
        if days_per_week == 0 {
            return Err(ClockError::InvalidConfig {
                reason: String::from("days_per_week must be at least 1"),
            });
        }
        Ok(Self {
            week,
            weeks_per_year,
            days_per_week,
        })
    }

    /// Advances the clock by one week and returns the new week number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::WeekOverflow`] if the counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.week = self.week.checked_add(1).ok_or(ClockError::WeekOverflow)?;
        Ok(self.week)
    }

    /// Current simulation week, counted from zero.
    #[must_use]
    pub const fn week(&self) -> u64 {
        self.week
    }

    /// Number of weeks in a simulated year.
    #[must_use]
    pub const fn weeks_per_year(&self) -> u32 {
        self.weeks_per_year
    }

    /// Number of days represented by one simulated week.
    #[must_use]
    pub const fn days_per_week(&self) -> u32 {
        self.days_per_week
    }

    /// Completed simulated years.
    #[must_use]
    pub fn year(&self) -> u64 {
        self.week
            .checked_div(u64::from(self.weeks_per_year))
            .unwrap_or(0)
    }

    /// Week within the current year, in `0..weeks_per_year`.
    #[must_use]
    pub fn week_of_year(&self) -> u32 {
        self.week
            .checked_rem(u64::from(self.weeks_per_year))
            .and_then(|rem| u32::try_from(rem).ok())
            .unwrap_or(0)
    }

    /// Whether the current week of year lies within `[start, end]`, both
    /// ends inclusive. Windows do not wrap around the year boundary.
    #[must_use]
    pub fn week_of_year_is_within(&self, start: u32, end: u32) -> bool {
        let week_of_year = self.week_of_year();
        week_of_year >= start && week_of_year <= end
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn default_time_settings() -> TimeSettings {
        TimeSettings::default()
    }

    fn make_clock(week: u64) -> SimulationClock {
        SimulationClock::from_parts(week, 46, 8).unwrap()
    }

    #[test]
    fn default_settings_make_a_valid_clock() {
        let clock = SimulationClock::new(default_time_settings()).unwrap();
        assert_eq!(clock.week(), 0);
        assert_eq!(clock.weeks_per_year(), 46);
        assert_eq!(clock.days_per_week(), 8);
        assert_eq!(clock.year(), 0);
        assert_eq!(clock.week_of_year(), 0);
    }

    #[test]
    fn zero_weeks_per_year_is_rejected() {
        let result = SimulationClock::from_parts(0, 0, 8);
        assert!(matches!(
            result,
            Err(ClockError::InvalidConfig { ref reason }) if reason.contains("weeks_per_year")
        ));
    }

    #[test]
    fn zero_days_per_week_is_rejected() {
        let result = SimulationClock::from_parts(0, 46, 0);
        assert!(matches!(
            result,
            Err(ClockError::InvalidConfig { ref reason }) if reason.contains("days_per_week")
        ));
    }

    #[test]
    fn advance_increments_and_returns_the_new_week() {
        let mut clock = make_clock(0);
        assert_eq!(clock.advance().unwrap(), 1);
        assert_eq!(clock.advance().unwrap(), 2);
        assert_eq!(clock.week(), 2);
    }

    #[test]
    fn advance_at_the_counter_limit_overflows() {
        let mut clock = make_clock(u64::MAX);
        assert_eq!(clock.advance(), Err(ClockError::WeekOverflow));
        assert_eq!(clock.week(), u64::MAX);
    }

    #[test]
    fn year_and_week_of_year_derive_from_the_week() {
        let clock = make_clock(100);
        assert_eq!(clock.year(), 2);
        assert_eq!(clock.week_of_year(), 8);

        let boundary = make_clock(46);
        assert_eq!(boundary.year(), 1);
        assert_eq!(boundary.week_of_year(), 0);
    }

    #[test]
    fn window_containment_is_inclusive_at_both_ends() {
        assert!(make_clock(10).week_of_year_is_within(10, 14));
        assert!(make_clock(14).week_of_year_is_within(10, 14));
        assert!(make_clock(12).week_of_year_is_within(10, 14));
        assert!(!make_clock(9).week_of_year_is_within(10, 14));
        assert!(!make_clock(15).week_of_year_is_within(10, 14));
    }

    #[test]
    fn single_week_windows_match_exactly_one_week() {
        assert!(make_clock(20).week_of_year_is_within(20, 20));
        assert!(!make_clock(21).week_of_year_is_within(20, 20));
        assert!(!make_clock(19).week_of_year_is_within(20, 20));
    }
}
