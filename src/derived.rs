//! Derived field computation.
//!
//! Derived fields are computed on first read and cached in the task's
//! field store. Cache fills go through [`Task::set`], so they reach
//! listeners and clear anything derived from them. Writes to an input
//! field clear the cache through the dependency table in
//! [`crate::models::dependents`].
//!
//! Absence propagates: a derived value is `None` whenever an input it
//! needs is unset. `None` results are not cached.
//!
//! # Fields
//!
//! | Field | Value |
//! |-------|-------|
//! | `START_SLACK` | late start − early start, in the duration's unit |
//! | `FINISH_SLACK` | late finish − early finish, in the duration's unit |
//! | `TOTAL_SLACK` | the zero slack if either is zero, else the smaller |
//! | `CRITICAL` | total slack ≤ 0, not complete, not a manual override |
//! | `START_VARIANCE` | start − baseline start, default unit |
//! | `FINISH_VARIANCE` | finish − baseline finish, default unit |
//! | `DURATION_VARIANCE` | duration − baseline duration |
//! | `WORK_VARIANCE` | work − baseline work |
//! | `COST_VARIANCE` | cost − baseline cost |
//! | `CV` / `SV` | BCWP − ACWP / BCWP − BCWS |
//! | `COMPLETE_THROUGH` | date reached by the completed share of the duration |

use chrono::NaiveDateTime;
use log::trace;
use std::fmt;

use crate::error::Result;
use crate::models::{
    Duration, FieldValue, ProjectFile, Task, TaskField, TaskKey, TaskMode, TimeUnit,
};

impl ProjectFile {
    /// Value of a field as a consumer sees it: computed for derived fields,
    /// stored otherwise.
    pub fn current_value(&mut self, key: TaskKey, field: TaskField) -> Result<Option<FieldValue>> {
        Ok(match field {
            TaskField::START_SLACK => self.start_slack(key)?.map(FieldValue::Duration),
            TaskField::FINISH_SLACK => self.finish_slack(key)?.map(FieldValue::Duration),
            TaskField::TOTAL_SLACK => self.total_slack(key)?.map(FieldValue::Duration),
            TaskField::CRITICAL => Some(FieldValue::Boolean(self.critical(key)?)),
            TaskField::START_VARIANCE => self.start_variance(key)?.map(FieldValue::Duration),
            TaskField::FINISH_VARIANCE => self.finish_variance(key)?.map(FieldValue::Duration),
            TaskField::DURATION_VARIANCE => self.duration_variance(key)?.map(FieldValue::Duration),
            TaskField::WORK_VARIANCE => self.work_variance(key)?.map(FieldValue::Duration),
            TaskField::COST_VARIANCE => self.cost_variance(key)?.map(FieldValue::Currency),
            TaskField::CV => self.cv(key)?.map(FieldValue::Currency),
            TaskField::SV => self.sv(key)?.map(FieldValue::Currency),
            TaskField::COMPLETE_THROUGH => self.complete_through(key)?.map(FieldValue::Date),
            _ => self.task(key)?.get(field).cloned(),
        })
    }

    // ================================
    // Slack and criticality
    // ================================

    /// Start slack: working time from early start to late start.
    pub fn start_slack(&mut self, key: TaskKey) -> Result<Option<Duration>> {
        self.cached(key, TaskField::START_SLACK, FieldValue::as_duration, FieldValue::Duration, |p| {
            p.slack(key, Task::early_start, Task::late_start)
        })
    }

    /// Finish slack: working time from early finish to late finish.
    pub fn finish_slack(&mut self, key: TaskKey) -> Result<Option<Duration>> {
        self.cached(key, TaskField::FINISH_SLACK, FieldValue::as_duration, FieldValue::Duration, |p| {
            p.slack(key, Task::early_finish, Task::late_finish)
        })
    }

    /// Total slack in the duration's unit. A zero start or finish slack
    /// wins outright; otherwise the smaller of the two.
    pub fn total_slack(&mut self, key: TaskKey) -> Result<Option<Duration>> {
        self.cached(key, TaskField::TOTAL_SLACK, FieldValue::as_duration, FieldValue::Duration, |p| {
            let (Some(start), Some(finish)) = (p.start_slack(key)?, p.finish_slack(key)?) else {
                return Ok(None);
            };
            let Some(duration) = p.task(key)?.duration() else {
                return Ok(None);
            };
            let props = p.properties();
            let start = start.convert_units(duration.units, props);
            let finish = finish.convert_units(duration.units, props);
            Ok(Some(prefer_zero(start, finish)))
        })
    }

    /// Critical flag. Always known: `false` when total slack is.
    pub fn critical(&mut self, key: TaskKey) -> Result<bool> {
        let critical = self.cached(key, TaskField::CRITICAL, FieldValue::as_bool, FieldValue::Boolean, |p| {
            let total_slack = p.total_slack(key)?;
            let task = p.task(key)?;
            let percent = whole_percent(task);
            let automatic = task.task_mode().unwrap_or_default() == TaskMode::AutoScheduled;
            let no_manual_text = task.duration_text().is_none()
                && task.start_text().is_none()
                && task.finish_text().is_none();
            Ok(Some(
                total_slack.is_some_and(|slack| slack.duration <= 0.0)
                    && percent != 100
                    && (automatic || no_manual_text),
            ))
        })?;
        Ok(critical.unwrap_or(false))
    }

    fn slack(
        &self,
        key: TaskKey,
        early: fn(&Task) -> Option<NaiveDateTime>,
        late: fn(&Task) -> Option<NaiveDateTime>,
    ) -> Result<Option<Duration>> {
        let task = self.task(key)?;
        let (Some(duration), Some(early), Some(late)) = (task.duration(), early(task), late(task)) else {
            return Ok(None);
        };
        self.variance(key, late, early, duration.units)
    }

    // ================================
    // Variances
    // ================================

    /// Start variance: start − baseline start, in the default duration unit.
    pub fn start_variance(&mut self, key: TaskKey) -> Result<Option<Duration>> {
        self.cached(key, TaskField::START_VARIANCE, FieldValue::as_duration, FieldValue::Duration, |p| {
            p.date_variance(key, Task::start, Task::baseline_start)
        })
    }

    /// Finish variance: finish − baseline finish, in the default duration unit.
    pub fn finish_variance(&mut self, key: TaskKey) -> Result<Option<Duration>> {
        self.cached(key, TaskField::FINISH_VARIANCE, FieldValue::as_duration, FieldValue::Duration, |p| {
            p.date_variance(key, Task::finish, Task::baseline_finish)
        })
    }

    /// Duration variance in the duration's unit.
    pub fn duration_variance(&mut self, key: TaskKey) -> Result<Option<Duration>> {
        self.cached(key, TaskField::DURATION_VARIANCE, FieldValue::as_duration, FieldValue::Duration, |p| {
            p.duration_difference(key, Task::duration, Task::baseline_duration)
        })
    }

    /// Work variance in the work's unit.
    pub fn work_variance(&mut self, key: TaskKey) -> Result<Option<Duration>> {
        self.cached(key, TaskField::WORK_VARIANCE, FieldValue::as_duration, FieldValue::Duration, |p| {
            p.duration_difference(key, Task::work, Task::baseline_work)
        })
    }

    /// Cost variance: cost − baseline cost.
    pub fn cost_variance(&mut self, key: TaskKey) -> Result<Option<f64>> {
        self.cached(key, TaskField::COST_VARIANCE, FieldValue::as_number, FieldValue::Currency, |p| {
            p.cost_difference(key, Task::cost, Task::baseline_cost)
        })
    }

    /// Earned-value cost variance: BCWP − ACWP.
    pub fn cv(&mut self, key: TaskKey) -> Result<Option<f64>> {
        self.cached(key, TaskField::CV, FieldValue::as_number, FieldValue::Currency, |p| {
            p.cost_difference(key, Task::bcwp, Task::acwp)
        })
    }

    /// Earned-value schedule variance: BCWP − BCWS.
    pub fn sv(&mut self, key: TaskKey) -> Result<Option<f64>> {
        self.cached(key, TaskField::SV, FieldValue::as_number, FieldValue::Currency, |p| {
            p.cost_difference(key, Task::bcwp, Task::bcws)
        })
    }

    fn date_variance(
        &self,
        key: TaskKey,
        current: fn(&Task) -> Option<NaiveDateTime>,
        baseline: fn(&Task) -> Option<NaiveDateTime>,
    ) -> Result<Option<Duration>> {
        let task = self.task(key)?;
        let (Some(current), Some(baseline)) = (current(task), baseline(task)) else {
            return Ok(None);
        };
        let units = self.properties().default_duration_units;
        self.variance(key, current, baseline, units)
    }

    fn duration_difference(
        &self,
        key: TaskKey,
        current: fn(&Task) -> Option<Duration>,
        baseline: fn(&Task) -> Option<Duration>,
    ) -> Result<Option<Duration>> {
        let task = self.task(key)?;
        Ok(match (current(task), baseline(task)) {
            (Some(current), Some(baseline)) => Some(current.minus(&baseline, self.properties())),
            _ => None,
        })
    }

    fn cost_difference(
        &self,
        key: TaskKey,
        minuend: fn(&Task) -> Option<f64>,
        subtrahend: fn(&Task) -> Option<f64>,
    ) -> Result<Option<f64>> {
        let task = self.task(key)?;
        Ok(minuend(task).zip(subtrahend(task)).map(|(a, b)| a - b))
    }

    /// Signed working time `a − b` on the task's calendar.
    fn variance(
        &self,
        key: TaskKey,
        a: NaiveDateTime,
        b: NaiveDateTime,
        units: TimeUnit,
    ) -> Result<Option<Duration>> {
        let props = self.properties();
        Ok(self
            .task_calendar(key)?
            .map(|calendar| calendar.work_between(b, a, units, props)))
    }

    // ================================
    // Progress
    // ================================

    /// Date through which the task is complete.
    ///
    /// `None` at 0%, the actual finish at 100%, otherwise the actual start
    /// advanced by the completed share of the duration on the task's
    /// calendar.
    pub fn complete_through(&mut self, key: TaskKey) -> Result<Option<NaiveDateTime>> {
        self.cached(key, TaskField::COMPLETE_THROUGH, FieldValue::as_date, FieldValue::Date, |p| {
            let task = p.task(key)?;
            let percent = whole_percent(task);
            Ok(match percent {
                0 => None,
                100 => task.actual_finish(),
                _ => {
                    let (Some(start), Some(duration)) = (task.actual_start(), task.duration()) else {
                        return Ok(None);
                    };
                    let done = duration.scaled(f64::from(percent) / 100.0);
                    p.task_calendar(key)?
                        .and_then(|calendar| calendar.date_after(start, &done, p.properties()))
                }
            })
        })
    }

    // ================================
    // Cache
    // ================================

    fn cached<T: Copy + fmt::Debug>(
        &mut self,
        key: TaskKey,
        field: TaskField,
        read: fn(&FieldValue) -> Option<T>,
        wrap: fn(T) -> FieldValue,
        compute: impl FnOnce(&mut Self) -> Result<Option<T>>,
    ) -> Result<Option<T>> {
        if let Some(value) = self.task(key)?.get(field).and_then(read) {
            return Ok(Some(value));
        }
        let computed = compute(self)?;
        if let Some(value) = computed {
            trace!("task {key}: computed {field} = {value:?}");
            self.task_mut(key)?.set(field, wrap(value));
        }
        Ok(computed)
    }
}

/// Both slacks must already share a unit.
fn prefer_zero(start: Duration, finish: Duration) -> Duration {
    if start.is_zero() {
        start
    } else if finish.is_zero() {
        finish
    } else if start.duration < finish.duration {
        start
    } else {
        finish
    }
}

/// Percent complete truncated to a whole number; unset counts as 0.
fn whole_percent(task: &Task) -> i32 {
    task.percent_complete().unwrap_or(0.0) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{listener_fn, CalendarException, ProjectCalendar};
    use chrono::NaiveDate;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        // January 2024: the 1st is a Monday.
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn single_task() -> (ProjectFile, TaskKey) {
        let mut project = ProjectFile::new();
        let key = project.add_task(None).unwrap();
        (project, key)
    }

    /// Early dates Mon 1st 08:00 to Fri 5th 17:00, late dates on the given
    /// January days.
    fn with_slack(project: &mut ProjectFile, key: TaskKey, late_start_day: u32, late_finish_day: u32) {
        let task = project.task_mut(key).unwrap();
        task.set_duration(Some(Duration::days(5.0)));
        task.set_early_start(Some(at(1, 8)));
        task.set_late_start(Some(at(late_start_day, 8)));
        task.set_early_finish(Some(at(5, 17)));
        task.set_late_finish(Some(at(late_finish_day, 17)));
    }

    #[test]
    fn test_duration_variance() {
        let (mut project, key) = single_task();
        let task = project.task_mut(key).unwrap();
        task.set_duration(Some(Duration::days(5.0)));
        task.set_baseline_duration(Some(Duration::days(3.0)));
        assert_eq!(project.duration_variance(key).unwrap(), Some(Duration::days(2.0)));
    }

    #[test]
    fn test_duration_variance_converts_baseline_units() {
        let (mut project, key) = single_task();
        let task = project.task_mut(key).unwrap();
        task.set_duration(Some(Duration::days(2.0)));
        task.set_baseline_duration(Some(Duration::hours(4.0)));
        assert_eq!(project.duration_variance(key).unwrap(), Some(Duration::days(1.5)));
    }

    #[test]
    fn test_duration_write_clears_cached_variance() {
        let (mut project, key) = single_task();
        let task = project.task_mut(key).unwrap();
        task.set_duration(Some(Duration::days(5.0)));
        task.set_baseline_duration(Some(Duration::days(3.0)));

        project.duration_variance(key).unwrap();
        assert!(project.task(key).unwrap().get(TaskField::DURATION_VARIANCE).is_some());

        project.task_mut(key).unwrap().set_duration(Some(Duration::days(6.0)));
        assert!(project.task(key).unwrap().get(TaskField::DURATION_VARIANCE).is_none());
        assert_eq!(project.duration_variance(key).unwrap(), Some(Duration::days(3.0)));
    }

    #[test]
    fn test_variance_absent_without_operands() {
        let (mut project, key) = single_task();
        project.task_mut(key).unwrap().set_cost(Some(100.0));
        assert_eq!(project.cost_variance(key).unwrap(), None);
        assert_eq!(project.duration_variance(key).unwrap(), None);
        assert_eq!(project.start_variance(key).unwrap(), None);
        assert_eq!(project.cv(key).unwrap(), None);
        assert!(project.task(key).unwrap().get(TaskField::COST_VARIANCE).is_none());
    }

    #[test]
    fn test_cost_and_earned_value() {
        let (mut project, key) = single_task();
        let task = project.task_mut(key).unwrap();
        task.set_cost(Some(150.0));
        task.set_baseline_cost(Some(100.0));
        task.set_bcwp(Some(100.0));
        task.set_acwp(Some(80.0));
        task.set_bcws(Some(120.0));

        assert_eq!(project.cost_variance(key).unwrap(), Some(50.0));
        assert_eq!(project.cv(key).unwrap(), Some(20.0));
        assert_eq!(project.sv(key).unwrap(), Some(-20.0));
        assert_eq!(
            project.task(key).unwrap().get(TaskField::CV),
            Some(&FieldValue::Currency(20.0))
        );

        project.task_mut(key).unwrap().set_acwp(Some(90.0));
        assert!(project.task(key).unwrap().get(TaskField::CV).is_none());
        assert!(project.task(key).unwrap().get(TaskField::SV).is_none());
        assert_eq!(project.cv(key).unwrap(), Some(10.0));
    }

    #[test]
    fn test_start_and_finish_variance() {
        let (mut project, key) = single_task();
        let task = project.task_mut(key).unwrap();
        task.set_start(Some(at(3, 8)));
        task.set_baseline_start(Some(at(1, 8)));
        task.set_finish(Some(at(8, 17)));
        task.set_baseline_finish(Some(at(9, 17)));

        assert_eq!(project.start_variance(key).unwrap(), Some(Duration::days(2.0)));
        assert_eq!(project.finish_variance(key).unwrap(), Some(Duration::days(-1.0)));
    }

    #[test]
    fn test_slack_needs_duration() {
        let (mut project, key) = single_task();
        with_slack(&mut project, key, 2, 8);
        project.task_mut(key).unwrap().clear(TaskField::DURATION);
        assert_eq!(project.start_slack(key).unwrap(), None);
        assert_eq!(project.total_slack(key).unwrap(), None);
        assert!(!project.critical(key).unwrap());
    }

    #[test]
    fn test_total_slack_prefers_zero() {
        let (mut project, key) = single_task();
        with_slack(&mut project, key, 1, 12);
        assert_eq!(project.start_slack(key).unwrap(), Some(Duration::days(0.0)));
        assert_eq!(project.finish_slack(key).unwrap(), Some(Duration::days(5.0)));
        assert_eq!(project.total_slack(key).unwrap(), Some(Duration::days(0.0)));

        let (mut project, key) = single_task();
        with_slack(&mut project, key, 8, 5);
        assert_eq!(project.total_slack(key).unwrap(), Some(Duration::days(0.0)));
    }

    #[test]
    fn test_total_slack_takes_smaller() {
        let (mut project, key) = single_task();
        with_slack(&mut project, key, 3, 8);
        assert_eq!(project.total_slack(key).unwrap(), Some(Duration::days(1.0)));
    }

    #[test]
    fn test_total_slack_in_duration_units() {
        let (mut project, key) = single_task();
        let task = project.task_mut(key).unwrap();
        task.set_duration(Some(Duration::days(5.0)));
        task.set(TaskField::START_SLACK, FieldValue::Duration(Duration::hours(16.0)));
        task.set(TaskField::FINISH_SLACK, FieldValue::Duration(Duration::hours(24.0)));

        assert_eq!(project.total_slack(key).unwrap(), Some(Duration::days(2.0)));
        assert_eq!(
            project.task(key).unwrap().get(TaskField::TOTAL_SLACK).and_then(FieldValue::as_duration),
            Some(Duration::days(2.0))
        );
    }

    #[test]
    fn test_total_slack_zero_in_other_units() {
        let (mut project, key) = single_task();
        let task = project.task_mut(key).unwrap();
        task.set_duration(Some(Duration::days(5.0)));
        task.set(TaskField::START_SLACK, FieldValue::Duration(Duration::hours(8.0)));
        task.set(TaskField::FINISH_SLACK, FieldValue::Duration(Duration::minutes(0.0)));

        assert_eq!(project.total_slack(key).unwrap(), Some(Duration::days(0.0)));
        assert!(project.critical(key).unwrap());
    }

    #[test]
    fn test_late_start_write_cascades_to_critical() {
        let (mut project, key) = single_task();
        with_slack(&mut project, key, 1, 5);
        assert!(project.critical(key).unwrap());

        project.task_mut(key).unwrap().set_late_start(Some(at(2, 8)));
        let task = project.task(key).unwrap();
        assert!(task.get(TaskField::START_SLACK).is_none());
        assert!(task.get(TaskField::TOTAL_SLACK).is_none());
        assert!(task.get(TaskField::CRITICAL).is_none());
        // Finish slack is still zero, so the task stays critical.
        assert!(project.critical(key).unwrap());
    }

    #[test]
    fn test_critical_false_when_complete() {
        let (mut project, key) = single_task();
        with_slack(&mut project, key, 1, 5);
        project.task_mut(key).unwrap().set_percent_complete(Some(50.0));
        assert!(project.critical(key).unwrap());

        project.task_mut(key).unwrap().set_percent_complete(Some(100.0));
        assert!(!project.critical(key).unwrap());
    }

    #[test]
    fn test_critical_false_with_positive_slack() {
        let (mut project, key) = single_task();
        with_slack(&mut project, key, 3, 10);
        assert!(!project.critical(key).unwrap());
    }

    #[test]
    fn test_critical_manual_task_with_text_override() {
        let (mut project, key) = single_task();
        with_slack(&mut project, key, 1, 5);
        project
            .task_mut(key)
            .unwrap()
            .set_task_mode(Some(TaskMode::ManuallyScheduled));
        assert!(project.critical(key).unwrap());

        project.task_mut(key).unwrap().set_start_text(Some("ASAP"));
        assert!(!project.critical(key).unwrap());
    }

    #[test]
    fn test_complete_through() {
        let (mut project, key) = single_task();
        let task = project.task_mut(key).unwrap();
        task.set_actual_start(Some(at(1, 8)));
        task.set_actual_finish(Some(at(4, 17)));
        task.set_duration(Some(Duration::days(4.0)));

        assert_eq!(project.complete_through(key).unwrap(), None);

        project.task_mut(key).unwrap().set_percent_complete(Some(50.0));
        assert_eq!(project.complete_through(key).unwrap(), Some(at(2, 17)));

        project.task_mut(key).unwrap().set_percent_complete(Some(100.0));
        assert_eq!(project.complete_through(key).unwrap(), Some(at(4, 17)));
    }

    #[test]
    fn test_complete_through_uses_task_calendar() {
        let (mut project, key) = single_task();
        let holiday = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        project
            .calendars_mut()
            .add(ProjectCalendar::standard(2).with_exception(holiday, holiday));

        let task = project.task_mut(key).unwrap();
        task.set_actual_start(Some(at(1, 8)));
        task.set_duration(Some(Duration::days(4.0)));
        task.set_percent_complete(Some(50.0));
        assert_eq!(project.complete_through(key).unwrap(), Some(at(2, 17)));

        project.task_mut(key).unwrap().set_calendar_unique_id(Some(2));
        assert_eq!(project.complete_through(key).unwrap(), Some(at(3, 17)));
    }

    #[test]
    fn test_calendar_edit_needs_invalidation() {
        let (mut project, key) = single_task();
        let task = project.task_mut(key).unwrap();
        task.set_start(Some(at(3, 8)));
        task.set_baseline_start(Some(at(1, 8)));
        assert_eq!(project.start_variance(key).unwrap(), Some(Duration::days(2.0)));

        let holiday = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        if let Some(calendar) = project.calendars_mut().get_mut(1) {
            calendar.exceptions.push(CalendarException::new(holiday, holiday));
        }
        assert_eq!(project.start_variance(key).unwrap(), Some(Duration::days(2.0)));
        project.invalidate_derived_fields();
        assert_eq!(project.start_variance(key).unwrap(), Some(Duration::days(1.0)));
    }

    #[test]
    fn test_current_value() {
        let (mut project, key) = single_task();
        let task = project.task_mut(key).unwrap();
        task.set_name(Some("Build"));
        task.set_work(Some(Duration::hours(10.0)));
        task.set_baseline_work(Some(Duration::new(8.0, TimeUnit::Hours)));

        assert_eq!(
            project.current_value(key, TaskField::WORK_VARIANCE).unwrap(),
            Some(FieldValue::Duration(Duration::hours(2.0)))
        );
        assert_eq!(
            project.current_value(key, TaskField::NAME).unwrap(),
            Some(FieldValue::from("Build"))
        );
        assert_eq!(
            project.current_value(key, TaskField::CRITICAL).unwrap(),
            Some(FieldValue::Boolean(false))
        );
        assert_eq!(project.current_value(key, TaskField::COMPLETE_THROUGH).unwrap(), None);
    }

    #[test]
    fn test_cache_fill_reaches_listeners() {
        let (mut project, key) = single_task();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let task = project.task_mut(key).unwrap();
        task.set_cost(Some(10.0));
        task.set_baseline_cost(Some(4.0));
        task.add_field_listener(listener_fn(move |c| sink.borrow_mut().push(c.field)));

        project.cost_variance(key).unwrap();
        project.cost_variance(key).unwrap();
        assert_eq!(*seen.borrow(), vec![TaskField::COST_VARIANCE]);
    }

    #[test]
    fn test_unknown_task_is_error() {
        let mut project = ProjectFile::new();
        assert!(project.total_slack(TaskKey(0)).is_err());
        assert!(project.current_value(TaskKey(0), TaskField::NAME).is_err());
    }
}
