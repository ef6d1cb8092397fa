//! Durations and time units.
//!
//! A [`Duration`] is a signed amount of time in a [`TimeUnit`]. Working
//! units (minutes through years) are measured in working time and convert
//! through the project's [`ProjectProperties`] factors; elapsed units are
//! wall-clock time and convert through fixed factors.
//!
//! # Conversion Factors
//!
//! | Unit | Working minutes | Elapsed minutes |
//! |------|-----------------|-----------------|
//! | Minutes | 1 | 1 |
//! | Hours | 60 | 60 |
//! | Days | `minutes_per_day` | 1440 |
//! | Weeks | `minutes_per_week` | 10080 |
//! | Months | `minutes_per_day × days_per_month` | 43200 |
//! | Years | 12 months | 525600 |

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ProjectProperties;

/// Tolerance used when comparing converted durations.
const EPSILON: f64 = 1e-9;

/// Unit of a [`Duration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeUnit {
    Minutes,
    Hours,
    #[default]
    Days,
    Weeks,
    Months,
    Years,
    ElapsedMinutes,
    ElapsedHours,
    ElapsedDays,
    ElapsedWeeks,
    ElapsedMonths,
    ElapsedYears,
}

impl TimeUnit {
    /// Whether this unit measures wall-clock rather than working time.
    pub fn is_elapsed(self) -> bool {
        matches!(
            self,
            Self::ElapsedMinutes
                | Self::ElapsedHours
                | Self::ElapsedDays
                | Self::ElapsedWeeks
                | Self::ElapsedMonths
                | Self::ElapsedYears
        )
    }

    /// Number of minutes in one of this unit.
    pub fn minutes(self, props: &ProjectProperties) -> f64 {
        match self {
            Self::Minutes | Self::ElapsedMinutes => 1.0,
            Self::Hours | Self::ElapsedHours => 60.0,
            Self::Days => f64::from(props.minutes_per_day),
            Self::Weeks => f64::from(props.minutes_per_week),
            Self::Months => f64::from(props.minutes_per_month()),
            Self::Years => f64::from(props.minutes_per_year()),
            Self::ElapsedDays => 1440.0,
            Self::ElapsedWeeks => 10_080.0,
            Self::ElapsedMonths => 43_200.0,
            Self::ElapsedYears => 525_600.0,
        }
    }

    /// Short suffix used when displaying a duration.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Minutes => "m",
            Self::Hours => "h",
            Self::Days => "d",
            Self::Weeks => "w",
            Self::Months => "mo",
            Self::Years => "y",
            Self::ElapsedMinutes => "em",
            Self::ElapsedHours => "eh",
            Self::ElapsedDays => "ed",
            Self::ElapsedWeeks => "ew",
            Self::ElapsedMonths => "emo",
            Self::ElapsedYears => "ey",
        }
    }
}

/// A signed amount of time in a given unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Duration {
    /// Amount in `units`.
    pub duration: f64,
    /// Unit of `duration`.
    pub units: TimeUnit,
}

impl Duration {
    /// Creates a duration.
    pub fn new(duration: f64, units: TimeUnit) -> Self {
        Self { duration, units }
    }

    /// Zero in the given unit.
    pub fn zero(units: TimeUnit) -> Self {
        Self::new(0.0, units)
    }

    /// Shorthand for working days.
    pub fn days(duration: f64) -> Self {
        Self::new(duration, TimeUnit::Days)
    }

    /// Shorthand for working hours.
    pub fn hours(duration: f64) -> Self {
        Self::new(duration, TimeUnit::Hours)
    }

    /// Shorthand for working minutes.
    pub fn minutes(duration: f64) -> Self {
        Self::new(duration, TimeUnit::Minutes)
    }

    /// Whether the amount is exactly zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.duration == 0.0
    }

    /// The amount expressed in minutes of the unit's kind.
    pub fn to_minutes(&self, props: &ProjectProperties) -> f64 {
        self.duration * self.units.minutes(props)
    }

    /// Converts to another unit. Same-unit conversion returns `self` unchanged.
    pub fn convert_units(&self, target: TimeUnit, props: &ProjectProperties) -> Self {
        if self.units == target {
            return *self;
        }
        Self::new(self.to_minutes(props) / target.minutes(props), target)
    }

    /// Whether two durations describe the same amount of time once converted.
    pub fn same_as(&self, other: &Duration, props: &ProjectProperties) -> bool {
        if self.units == other.units {
            return (self.duration - other.duration).abs() < EPSILON;
        }
        (self.to_minutes(props) - other.to_minutes(props)).abs() < EPSILON
    }

    /// Scales the amount, keeping the unit.
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.duration * factor, self.units)
    }

    /// `self - other`, expressed in `self`'s unit.
    pub fn minus(&self, other: &Duration, props: &ProjectProperties) -> Self {
        let other = other.convert_units(self.units, props);
        Self::new(self.duration - other.duration, self.units)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.duration.fract() == 0.0 {
            write!(f, "{}{}", self.duration as i64, self.units.suffix())
        } else {
            write!(f, "{}{}", self.duration, self.units.suffix())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_working_units() {
        let props = ProjectProperties::default();
        let d = Duration::days(2.0).convert_units(TimeUnit::Hours, &props);
        assert_eq!(d, Duration::hours(16.0));

        let w = Duration::new(1.0, TimeUnit::Weeks).convert_units(TimeUnit::Days, &props);
        assert_eq!(w, Duration::days(5.0));
    }

    #[test]
    fn test_convert_elapsed_units() {
        let props = ProjectProperties::default();
        let d = Duration::new(1.0, TimeUnit::ElapsedDays).convert_units(TimeUnit::Hours, &props);
        assert_eq!(d, Duration::hours(24.0));
    }

    #[test]
    fn test_custom_day_length() {
        let props = ProjectProperties::default().with_minutes_per_day(420);
        let d = Duration::hours(14.0).convert_units(TimeUnit::Days, &props);
        assert!((d.duration - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_as_across_units() {
        let props = ProjectProperties::default();
        assert!(Duration::days(0.0).same_as(&Duration::hours(0.0), &props));
        assert!(Duration::days(1.0).same_as(&Duration::hours(8.0), &props));
        assert!(!Duration::days(1.0).same_as(&Duration::hours(9.0), &props));
    }

    #[test]
    fn test_minus_converts_to_left_unit() {
        let props = ProjectProperties::default();
        let v = Duration::days(5.0).minus(&Duration::hours(24.0), &props);
        assert_eq!(v, Duration::days(2.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Duration::days(5.0).to_string(), "5d");
        assert_eq!(Duration::hours(1.5).to_string(), "1.5h");
        assert_eq!(
            Duration::new(2.0, TimeUnit::ElapsedMonths).to_string(),
            "2emo"
        );
    }
}
