//! Working-time calendars.
//!
//! A calendar describes when work happens: which weekdays are working
//! days, which intraday periods are worked on those days, and which date
//! ranges are exceptions (holidays, shutdowns).
//!
//! # Precedence
//! Exceptions override working days. A date is a working date iff:
//! - its weekday is flagged as working, AND
//! - it does NOT fall within any exception range.
//!
//! Working time on a working date is the union of its working periods.
//! Elapsed durations ignore the calendar entirely.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Duration, TimeUnit};
use crate::config::ProjectProperties;

const SECONDS_PER_DAY: i64 = 86_400;

/// Upper bound on the number of days walked when locating a date.
const MAX_SEARCH_DAYS: u32 = 200 * 366;

/// An intraday working period [start, end).
///
/// An `end` of midnight with a non-midnight `start` means "until the end
/// of the day".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingPeriod {
    /// Period start (inclusive).
    pub start: NaiveTime,
    /// Period end (exclusive).
    pub end: NaiveTime,
}

impl WorkingPeriod {
    /// Creates a new working period.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Creates a period from whole hours, e.g. `hours(8, 12)`.
    pub fn hours(start_hour: u32, end_hour: u32) -> Self {
        let at = |h: u32| NaiveTime::from_hms_opt(h % 24, 0, 0).unwrap_or(NaiveTime::MIN);
        Self::new(at(start_hour), at(end_hour))
    }

    #[inline]
    fn start_secs(&self) -> i64 {
        i64::from(self.start.num_seconds_from_midnight())
    }

    #[inline]
    fn end_secs(&self) -> i64 {
        let end = i64::from(self.end.num_seconds_from_midnight());
        if end == 0 && self.start_secs() > 0 {
            SECONDS_PER_DAY
        } else {
            end
        }
    }

    /// Length of the period in minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end_secs() - self.start_secs()).max(0) / 60
    }

    /// Whether a time of day falls within this period.
    #[inline]
    pub fn contains(&self, time: NaiveTime) -> bool {
        let t = i64::from(time.num_seconds_from_midnight());
        t >= self.start_secs() && t < self.end_secs()
    }

    /// Seconds of this period inside [from, to), both as seconds since midnight.
    fn overlap_secs(&self, from: i64, to: i64) -> i64 {
        let start = self.start_secs().max(from);
        let end = self.end_secs().min(to);
        (end - start).max(0)
    }
}

/// A non-working date range, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarException {
    /// First non-working date.
    pub from: NaiveDate,
    /// Last non-working date.
    pub to: NaiveDate,
}

impl CalendarException {
    /// Creates an exception range.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    /// Whether a date falls within the range.
    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }
}

/// A project or task calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectCalendar {
    /// Calendar unique ID.
    pub unique_id: i32,
    /// Display name.
    pub name: String,
    /// Working flag per weekday, Monday first.
    pub working_days: [bool; 7],
    /// Working periods applied to every working day, in time order.
    pub working_periods: Vec<WorkingPeriod>,
    /// Non-working date ranges.
    pub exceptions: Vec<CalendarException>,
}

impl ProjectCalendar {
    /// Creates a calendar with no working time.
    pub fn new(unique_id: i32, name: impl Into<String>) -> Self {
        Self {
            unique_id,
            name: name.into(),
            working_days: [false; 7],
            working_periods: Vec::new(),
            exceptions: Vec::new(),
        }
    }

    /// Creates the standard calendar: Monday to Friday,
    /// 08:00–12:00 and 13:00–17:00.
    pub fn standard(unique_id: i32) -> Self {
        Self::new(unique_id, "Standard")
            .with_working_days(&[
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ])
            .with_period(WorkingPeriod::hours(8, 12))
            .with_period(WorkingPeriod::hours(13, 17))
    }

    /// Marks the given weekdays as working.
    pub fn with_working_days(mut self, days: &[Weekday]) -> Self {
        for day in days {
            self.working_days[day.num_days_from_monday() as usize] = true;
        }
        self
    }

    /// Sets a single weekday's working flag.
    pub fn with_working_day(mut self, day: Weekday, working: bool) -> Self {
        self.working_days[day.num_days_from_monday() as usize] = working;
        self
    }

    /// Adds a working period, keeping periods in time order.
    pub fn with_period(mut self, period: WorkingPeriod) -> Self {
        self.working_periods.push(period);
        self.working_periods.sort_by_key(|p| p.start);
        self
    }

    /// Adds a non-working exception range.
    pub fn with_exception(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.exceptions.push(CalendarException::new(from, to));
        self
    }

    /// Whether the calendar has any working time at all.
    pub fn has_working_time(&self) -> bool {
        self.working_days.iter().any(|&d| d)
            && self.working_periods.iter().any(|p| p.duration_minutes() > 0)
    }

    /// Whether a date is a working date.
    pub fn is_working_date(&self, date: NaiveDate) -> bool {
        if self.exceptions.iter().any(|e| e.contains(date)) {
            return false;
        }
        self.working_days[date.weekday().num_days_from_monday() as usize]
    }

    /// Whether a timestamp is within working time.
    pub fn is_working_time(&self, at: NaiveDateTime) -> bool {
        self.is_working_date(at.date()) && self.working_periods.iter().any(|p| p.contains(at.time()))
    }

    /// Working minutes on a date.
    pub fn working_minutes_on(&self, date: NaiveDate) -> i64 {
        self.working_secs_in(date, 0, SECONDS_PER_DAY) / 60
    }

    fn working_secs_in(&self, date: NaiveDate, from: i64, to: i64) -> i64 {
        if !self.is_working_date(date) {
            return 0;
        }
        self.working_periods
            .iter()
            .map(|p| p.overlap_secs(from, to))
            .sum()
    }

    /// Signed working time from `start` to `end`, expressed in `units`.
    ///
    /// Negative when `end` precedes `start`. Elapsed units measure the
    /// wall-clock difference.
    pub fn work_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        units: TimeUnit,
        props: &ProjectProperties,
    ) -> Duration {
        if units.is_elapsed() {
            let minutes = (end - start).num_seconds() as f64 / 60.0;
            return Duration::minutes(minutes).convert_units(units, props);
        }
        if end < start {
            let forward = self.work_between(end, start, units, props);
            return Duration::new(-forward.duration, units);
        }

        let secs = self.working_secs_between(start, end);
        Duration::minutes(secs as f64 / 60.0).convert_units(units, props)
    }

    fn working_secs_between(&self, start: NaiveDateTime, end: NaiveDateTime) -> i64 {
        let start_secs = i64::from(start.time().num_seconds_from_midnight());
        let end_secs = i64::from(end.time().num_seconds_from_midnight());

        if start.date() == end.date() {
            return self.working_secs_in(start.date(), start_secs, end_secs);
        }

        let mut total = self.working_secs_in(start.date(), start_secs, SECONDS_PER_DAY);
        let mut date = start.date();
        while let Some(next) = date.succ_opt() {
            date = next;
            if date == end.date() {
                break;
            }
            total += self.working_secs_in(date, 0, SECONDS_PER_DAY);
        }
        total + self.working_secs_in(end.date(), 0, end_secs)
    }

    /// The date reached by moving `duration` of working time from `start`.
    ///
    /// Non-negative durations move forward, landing on the end of a
    /// working period rather than the start of the next one when the work
    /// runs out exactly at a period boundary. Negative durations move
    /// backward. Returns `None` if the calendar has no working time or the
    /// walk runs past the search horizon.
    pub fn date_after(
        &self,
        start: NaiveDateTime,
        duration: &Duration,
        props: &ProjectProperties,
    ) -> Option<NaiveDateTime> {
        let secs = (duration.to_minutes(props) * 60.0).round() as i64;
        if duration.units.is_elapsed() {
            return start.checked_add_signed(TimeDelta::try_seconds(secs)?);
        }
        if secs == 0 {
            return Some(start);
        }
        if !self.has_working_time() {
            return None;
        }
        if secs > 0 {
            self.walk_forward(start, secs)
        } else {
            self.walk_backward(start, -secs)
        }
    }

    fn walk_forward(&self, start: NaiveDateTime, mut remaining: i64) -> Option<NaiveDateTime> {
        let mut date = start.date();
        let mut cursor = i64::from(start.time().num_seconds_from_midnight());

        for _ in 0..MAX_SEARCH_DAYS {
            if self.is_working_date(date) {
                for period in &self.working_periods {
                    if period.end_secs() <= cursor {
                        continue;
                    }
                    let from = period.start_secs().max(cursor);
                    let available = period.end_secs() - from;
                    if available >= remaining {
                        return at_offset(date, from + remaining);
                    }
                    remaining -= available;
                }
            }
            date = date.succ_opt()?;
            cursor = 0;
        }
        None
    }

    fn walk_backward(&self, start: NaiveDateTime, mut remaining: i64) -> Option<NaiveDateTime> {
        let mut date = start.date();
        let mut cursor = i64::from(start.time().num_seconds_from_midnight());

        for _ in 0..MAX_SEARCH_DAYS {
            if self.is_working_date(date) {
                for period in self.working_periods.iter().rev() {
                    if period.start_secs() >= cursor {
                        continue;
                    }
                    let to = period.end_secs().min(cursor);
                    let available = to - period.start_secs();
                    if available >= remaining {
                        return at_offset(date, to - remaining);
                    }
                    remaining -= available;
                }
            }
            date = date.pred_opt()?;
            cursor = SECONDS_PER_DAY;
        }
        None
    }
}

fn at_offset(date: NaiveDate, secs: i64) -> Option<NaiveDateTime> {
    date.and_time(NaiveTime::MIN)
        .checked_add_signed(TimeDelta::try_seconds(secs)?)
}

/// Calendars of a project, keyed by unique ID.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarRegistry {
    calendars: HashMap<i32, ProjectCalendar>,
}

impl CalendarRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a calendar, returning any calendar it replaced.
    pub fn add(&mut self, calendar: ProjectCalendar) -> Option<ProjectCalendar> {
        self.calendars.insert(calendar.unique_id, calendar)
    }

    /// Looks up a calendar.
    pub fn get(&self, unique_id: i32) -> Option<&ProjectCalendar> {
        self.calendars.get(&unique_id)
    }

    /// Looks up a calendar for modification.
    pub fn get_mut(&mut self, unique_id: i32) -> Option<&mut ProjectCalendar> {
        self.calendars.get_mut(&unique_id)
    }

    /// Removes a calendar.
    pub fn remove(&mut self, unique_id: i32) -> Option<ProjectCalendar> {
        self.calendars.remove(&unique_id)
    }

    /// Number of registered calendars.
    pub fn len(&self) -> usize {
        self.calendars.len()
    }

    /// Whether no calendars are registered.
    pub fn is_empty(&self) -> bool {
        self.calendars.is_empty()
    }

    /// Iterates over registered calendars in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectCalendar> {
        self.calendars.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_working_period() {
        let p = WorkingPeriod::hours(8, 12);
        assert_eq!(p.duration_minutes(), 240);
        assert!(p.contains(NaiveTime::from_hms_opt(8, 0, 0).unwrap()));
        assert!(!p.contains(NaiveTime::from_hms_opt(12, 0, 0).unwrap())); // exclusive end

        let evening = WorkingPeriod::hours(20, 0);
        assert_eq!(evening.duration_minutes(), 240);
    }

    #[test]
    fn test_standard_working_dates() {
        let cal = ProjectCalendar::standard(1);
        // 2024-01-06 is a Saturday
        assert!(!cal.is_working_date(NaiveDate::from_ymd_opt(2024, 1, 6).unwrap()));
        assert!(cal.is_working_date(NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()));
        assert_eq!(
            cal.working_minutes_on(NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()),
            480
        );
    }

    #[test]
    fn test_exception_overrides_working_day() {
        let holiday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let cal = ProjectCalendar::standard(1).with_exception(holiday, holiday);
        assert!(!cal.is_working_date(holiday));
        assert!(!cal.is_working_time(at(2024, 1, 1, 9, 0)));
        assert!(cal.is_working_time(at(2024, 1, 2, 9, 0)));
    }

    #[test]
    fn test_work_between_spans_weekend() {
        let cal = ProjectCalendar::standard(1);
        let props = ProjectProperties::default();
        // Friday 08:00 → Monday 17:00 = two working days
        let w = cal.work_between(at(2024, 1, 5, 8, 0), at(2024, 1, 8, 17, 0), TimeUnit::Days, &props);
        assert!((w.duration - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_work_between_is_signed() {
        let cal = ProjectCalendar::standard(1);
        let props = ProjectProperties::default();
        let w = cal.work_between(at(2024, 1, 9, 8, 0), at(2024, 1, 8, 8, 0), TimeUnit::Hours, &props);
        assert!((w.duration + 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_work_between_elapsed() {
        let cal = ProjectCalendar::standard(1);
        let props = ProjectProperties::default();
        let w = cal.work_between(
            at(2024, 1, 5, 8, 0),
            at(2024, 1, 8, 8, 0),
            TimeUnit::ElapsedDays,
            &props,
        );
        assert!((w.duration - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_date_after_lands_on_period_end() {
        let cal = ProjectCalendar::standard(1);
        let props = ProjectProperties::default();
        let end = cal.date_after(at(2024, 1, 8, 8, 0), &Duration::days(1.0), &props);
        assert_eq!(end, Some(at(2024, 1, 8, 17, 0)));
    }

    #[test]
    fn test_date_after_skips_lunch_and_weekend() {
        let cal = ProjectCalendar::standard(1);
        let props = ProjectProperties::default();
        // Friday 11:00 + 6h → 1h before lunch, 4h afternoon, 1h Monday
        let end = cal.date_after(at(2024, 1, 5, 11, 0), &Duration::hours(6.0), &props);
        assert_eq!(end, Some(at(2024, 1, 8, 9, 0)));
    }

    #[test]
    fn test_date_after_backward() {
        let cal = ProjectCalendar::standard(1);
        let props = ProjectProperties::default();
        let end = cal.date_after(at(2024, 1, 8, 9, 0), &Duration::hours(-2.0), &props);
        assert_eq!(end, Some(at(2024, 1, 5, 16, 0)));
    }

    #[test]
    fn test_date_after_without_working_time() {
        let cal = ProjectCalendar::new(9, "Empty");
        let props = ProjectProperties::default();
        assert_eq!(
            cal.date_after(at(2024, 1, 8, 9, 0), &Duration::hours(1.0), &props),
            None
        );
        assert_eq!(
            cal.date_after(at(2024, 1, 8, 9, 0), &Duration::hours(0.0), &props),
            Some(at(2024, 1, 8, 9, 0))
        );
    }

    #[test]
    fn test_registry() {
        let mut reg = CalendarRegistry::new();
        assert!(reg.add(ProjectCalendar::standard(1)).is_none());
        assert!(reg.add(ProjectCalendar::new(1, "Replaced")).is_some());
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(1).map(|c| c.name.as_str()), Some("Replaced"));
        assert!(reg.remove(1).is_some());
        assert!(reg.is_empty());
    }
}
