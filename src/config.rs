//! Project configuration and properties.
//!
//! [`ProjectConfig`] controls which attributes the container maintains
//! automatically as tasks are created and attached. Readers for formats
//! that carry their own IDs or WBS codes switch the relevant flags off
//! before streaming a document in.
//!
//! [`ProjectProperties`] holds the project-wide values the derived field
//! engine needs: the default duration unit and the working-time factors
//! used to convert between time units.

use serde::{Deserialize, Serialize};

use crate::models::TimeUnit;

/// Automatic attribute maintenance flags.
///
/// All flags default to `true`. Missing keys in a serialized configuration
/// fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Allocate a unique ID for each new task.
    pub auto_task_unique_id: bool,
    /// Allocate a position ID for each new task.
    pub auto_task_id: bool,
    /// Generate a WBS code for each new task.
    pub auto_wbs: bool,
    /// Generate an outline number for each new task.
    pub auto_outline_number: bool,
    /// Derive outline level from the parent on creation and attachment.
    pub auto_outline_level: bool,
}

impl ProjectConfig {
    /// Creates a configuration with every automation enabled.
    pub fn new() -> Self {
        Self {
            auto_task_unique_id: true,
            auto_task_id: true,
            auto_wbs: true,
            auto_outline_number: true,
            auto_outline_level: true,
        }
    }

    /// Configuration suited to readers that supply every identifier
    /// and code themselves.
    pub fn manual() -> Self {
        Self {
            auto_task_unique_id: false,
            auto_task_id: false,
            auto_wbs: false,
            auto_outline_number: false,
            auto_outline_level: false,
        }
    }

    /// Sets unique ID allocation.
    pub fn with_auto_task_unique_id(mut self, enabled: bool) -> Self {
        self.auto_task_unique_id = enabled;
        self
    }

    /// Sets position ID allocation.
    pub fn with_auto_task_id(mut self, enabled: bool) -> Self {
        self.auto_task_id = enabled;
        self
    }

    /// Sets WBS generation.
    pub fn with_auto_wbs(mut self, enabled: bool) -> Self {
        self.auto_wbs = enabled;
        self
    }

    /// Sets outline number generation.
    pub fn with_auto_outline_number(mut self, enabled: bool) -> Self {
        self.auto_outline_number = enabled;
        self
    }

    /// Sets outline level derivation.
    pub fn with_auto_outline_level(mut self, enabled: bool) -> Self {
        self.auto_outline_level = enabled;
        self
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Project-wide scheduling properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectProperties {
    /// Unit used for start/finish variances.
    pub default_duration_units: TimeUnit,
    /// Working minutes in one working day.
    pub minutes_per_day: u32,
    /// Working minutes in one working week.
    pub minutes_per_week: u32,
    /// Working days in one working month.
    pub days_per_month: u32,
    /// Unique ID of the project default calendar.
    pub default_calendar: i32,
}

impl ProjectProperties {
    /// Standard properties: 8h days, 40h weeks, 20-day months.
    pub fn new() -> Self {
        Self {
            default_duration_units: TimeUnit::Days,
            minutes_per_day: 480,
            minutes_per_week: 2400,
            days_per_month: 20,
            default_calendar: 1,
        }
    }

    /// Sets the default duration unit.
    pub fn with_default_duration_units(mut self, units: TimeUnit) -> Self {
        self.default_duration_units = units;
        self
    }

    /// Sets the working minutes per day.
    pub fn with_minutes_per_day(mut self, minutes: u32) -> Self {
        self.minutes_per_day = minutes;
        self
    }

    /// Sets the working minutes per week.
    pub fn with_minutes_per_week(mut self, minutes: u32) -> Self {
        self.minutes_per_week = minutes;
        self
    }

    /// Sets the working days per month.
    pub fn with_days_per_month(mut self, days: u32) -> Self {
        self.days_per_month = days;
        self
    }

    /// Sets the unique ID of the project default calendar.
    pub fn with_default_calendar(mut self, unique_id: i32) -> Self {
        self.default_calendar = unique_id;
        self
    }

    /// Working minutes in a month.
    pub fn minutes_per_month(&self) -> u32 {
        self.minutes_per_day * self.days_per_month
    }

    /// Working minutes in a year (twelve working months).
    pub fn minutes_per_year(&self) -> u32 {
        self.minutes_per_month() * 12
    }
}

impl Default for ProjectProperties {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_all_enabled() {
        let cfg = ProjectConfig::default();
        assert!(cfg.auto_task_unique_id);
        assert!(cfg.auto_task_id);
        assert!(cfg.auto_wbs);
        assert!(cfg.auto_outline_number);
        assert!(cfg.auto_outline_level);
    }

    #[test]
    fn test_config_partial_json() {
        let cfg: ProjectConfig =
            serde_json::from_str(r#"{ "auto_wbs": false, "auto_task_id": false }"#).unwrap();
        assert!(!cfg.auto_wbs);
        assert!(!cfg.auto_task_id);
        assert!(cfg.auto_outline_level);
    }

    #[test]
    fn test_config_builder() {
        let cfg = ProjectConfig::manual()
            .with_auto_outline_level(true)
            .with_auto_wbs(true);
        assert!(cfg.auto_outline_level);
        assert!(cfg.auto_wbs);
        assert!(!cfg.auto_task_unique_id);
    }

    #[test]
    fn test_properties_factors() {
        let props = ProjectProperties::new().with_minutes_per_day(420);
        assert_eq!(props.minutes_per_month(), 420 * 20);
        assert_eq!(props.minutes_per_year(), 420 * 20 * 12);
    }

    #[test]
    fn test_properties_json() {
        let props: ProjectProperties =
            serde_json::from_str(r#"{ "default_duration_units": "Hours" }"#).unwrap();
        assert_eq!(props.default_duration_units, TimeUnit::Hours);
        assert_eq!(props.minutes_per_day, 480);
    }
}
