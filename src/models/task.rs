//! Task model.
//!
//! A task is a bag of typed attributes (a [`FieldStore`]) plus the
//! structural state that is not schedulable data: its place in the
//! outline tree, UI and reader flags, and optional recurring/sub-project
//! associations.
//!
//! Tasks live in a [`ProjectFile`](super::ProjectFile) arena and refer to
//! each other by [`TaskKey`]. Parent, child and relation references are
//! keys, never owning pointers.
//!
//! # Writes
//! Every attribute write goes through [`Task::set`], which hands the
//! pending change to the task's [`ChangeNotifier`] before committing it.
//! Identity fields (`UNIQUE_ID`, `ID`) should be written through the
//! container so its registries stay in step.

use chrono::NaiveDateTime;
use log::warn;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

use super::{
    ChangeNotifier, ConstraintType, Duration, FieldFamily, FieldListener, FieldStore, FieldValue,
    ListenerId, Priority, Relation, TaskField, TaskMode,
};
use crate::error::Result;

/// Arena handle of a task within its project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskKey(pub(crate) u32);

impl TaskKey {
    /// Arena slot index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A closed interval of working time, used for task splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }
}

/// Recurrence pattern of a recurring task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecurrenceType {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Recurring-task details attached to a summary task.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecurringTask {
    /// Duration of each occurrence.
    pub duration: Option<Duration>,
    /// Number of occurrences.
    pub occurrences: Option<u32>,
    /// Recurrence pattern.
    pub recurrence_type: RecurrenceType,
    /// First occurrence.
    pub start_date: Option<NaiveDateTime>,
    /// Recurrence end.
    pub finish_date: Option<NaiveDateTime>,
}

/// External project represented by a task.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubProject {
    /// File name or path of the sub-project.
    pub file_name: String,
    /// Unique ID of the task in the sub-project this task stands for.
    pub task_unique_id: Option<i32>,
    /// Offset applied to sub-project unique IDs.
    pub unique_id_offset: Option<i32>,
    /// Whether the sub-project is an external (read-only) link.
    pub external: bool,
}

/// A task.
#[derive(Debug)]
pub struct Task {
    key: TaskKey,
    fields: FieldStore<TaskField>,
    notifier: ChangeNotifier,
    pub(crate) parent: Option<TaskKey>,
    pub(crate) children: Vec<TaskKey>,
    null: bool,
    wbs_level: Option<String>,
    resume_valid: bool,
    expanded: bool,
    recurring: Option<RecurringTask>,
    sub_project: Option<SubProject>,
    splits: Option<Vec<DateRange>>,
}

impl Task {
    pub(crate) fn new(key: TaskKey) -> Self {
        Self {
            key,
            fields: FieldStore::new(),
            notifier: ChangeNotifier::new(),
            parent: None,
            children: Vec::new(),
            null: false,
            wbs_level: None,
            resume_valid: false,
            expanded: true,
            recurring: None,
            sub_project: None,
            splits: None,
        }
    }

    /// Arena handle.
    #[inline]
    pub fn key(&self) -> TaskKey {
        self.key
    }

    // ================================
    // Generic field access
    // ================================

    /// Stored value of a field, without deriving anything.
    ///
    /// For derived fields this is the cached value, if any; use
    /// [`ProjectFile::current_value`](super::ProjectFile::current_value)
    /// to compute on demand.
    #[inline]
    pub fn get(&self, field: TaskField) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Writes a field.
    ///
    /// Dependent cached fields are cleared and listeners notified before
    /// the value is committed.
    pub fn set(&mut self, field: TaskField, value: impl Into<Option<FieldValue>>) {
        let value = value.into();
        if let Some(v) = &value {
            if !v.fits(field.data_type()) {
                warn!(
                    "task {}: storing {:?} in {field} ({:?})",
                    self.key,
                    v.data_type(),
                    field.data_type()
                );
            }
        }
        self.notifier
            .field_changed(&mut self.fields, self.key, field, value.as_ref());
        self.fields.set(field, value);
    }

    /// Unsets a field.
    pub fn clear(&mut self, field: TaskField) {
        self.set(field, Option::<FieldValue>::None);
    }

    /// Stored value of an indexed family slot.
    ///
    /// # Errors
    /// [`ProjectError::InvalidFieldIndex`](crate::ProjectError::InvalidFieldIndex)
    /// if `index` is outside the family's 1-based range.
    pub fn indexed(&self, family: FieldFamily, index: usize) -> Result<Option<&FieldValue>> {
        Ok(self.get(family.field(index)?))
    }

    /// Writes an indexed family slot.
    pub fn set_indexed(
        &mut self,
        family: FieldFamily,
        index: usize,
        value: impl Into<Option<FieldValue>>,
    ) -> Result<()> {
        let field = family.field(index)?;
        self.set(field, value);
        Ok(())
    }

    pub(crate) fn fields(&self) -> &FieldStore<TaskField> {
        &self.fields
    }

    /// Drops every cached derived value without notifying listeners.
    pub(crate) fn invalidate_derived(&mut self) {
        for &field in TaskField::derived() {
            self.fields.clear(field);
        }
    }

    // ================================
    // Change notification
    // ================================

    /// Registers a field listener.
    pub fn add_field_listener(&mut self, listener: Box<dyn FieldListener>) -> ListenerId {
        self.notifier.add_listener(listener)
    }

    /// Unregisters a field listener.
    pub fn remove_field_listener(&mut self, id: ListenerId) -> bool {
        self.notifier.remove_listener(id)
    }

    /// Suspends listener notification (bulk-load fast path).
    /// Dependent caches are still invalidated.
    pub fn disable_events(&mut self) {
        self.notifier.set_events_enabled(false);
    }

    /// Resumes listener notification. This is the default state.
    pub fn enable_events(&mut self) {
        self.notifier.set_events_enabled(true);
    }

    /// Whether listeners are notified of writes.
    pub fn events_enabled(&self) -> bool {
        self.notifier.events_enabled()
    }

    // ================================
    // Hierarchy
    // ================================

    /// Parent task, or `None` at the top level.
    #[inline]
    pub fn parent(&self) -> Option<TaskKey> {
        self.parent
    }

    /// Direct children in outline order.
    #[inline]
    pub fn children(&self) -> &[TaskKey] {
        &self.children
    }

    /// Number of direct children.
    #[inline]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Summary flag: set while the task has children.
    pub fn summary(&self) -> bool {
        self.flag(TaskField::SUMMARY)
    }

    pub(crate) fn set_summary(&mut self, summary: bool) {
        self.set(TaskField::SUMMARY, FieldValue::Boolean(summary));
    }

    // ================================
    // Relations
    // ================================

    /// Predecessor relations (source = this task).
    pub fn predecessors(&self) -> &[Relation] {
        self.relations(TaskField::PREDECESSORS)
    }

    /// Successor relations (source = this task).
    pub fn successors(&self) -> &[Relation] {
        self.relations(TaskField::SUCCESSORS)
    }

    fn relations(&self, field: TaskField) -> &[Relation] {
        self.get(field)
            .and_then(FieldValue::as_relations)
            .unwrap_or(&[])
    }

    /// Runs `f` on a relation list, creating the list through [`Task::set`]
    /// if the slot is empty.
    pub(crate) fn with_relations<R>(
        &mut self,
        field: TaskField,
        f: impl FnOnce(&mut Vec<Relation>) -> R,
    ) -> R {
        if let Some(list) = self.fields.get_mut(field).and_then(FieldValue::as_relations_mut) {
            return f(list);
        }
        let mut list = Vec::new();
        let result = f(&mut list);
        self.set(field, FieldValue::Relations(list));
        result
    }

    /// Removes relations from an existing list, returning how many went.
    pub(crate) fn retain_relations(
        &mut self,
        field: TaskField,
        keep: impl FnMut(&Relation) -> bool,
    ) -> usize {
        match self.fields.get_mut(field).and_then(FieldValue::as_relations_mut) {
            Some(list) => {
                let before = list.len();
                list.retain(keep);
                before - list.len()
            }
            None => 0,
        }
    }

    // ================================
    // Structural flags
    // ================================

    /// Whether this is a blank placeholder row.
    pub fn is_null(&self) -> bool {
        self.null
    }

    /// Marks the task as a blank placeholder row.
    pub fn set_null(&mut self, null: bool) {
        self.null = null;
    }

    /// WBS level string as supplied by the source file.
    pub fn wbs_level(&self) -> Option<&str> {
        self.wbs_level.as_deref()
    }

    /// Sets the source-file WBS level string.
    pub fn set_wbs_level(&mut self, level: Option<String>) {
        self.wbs_level = level;
    }

    /// Whether the resume date is meaningful.
    pub fn resume_valid(&self) -> bool {
        self.resume_valid
    }

    /// Sets whether the resume date is meaningful.
    pub fn set_resume_valid(&mut self, valid: bool) {
        self.resume_valid = valid;
    }

    /// Whether children are shown expanded.
    pub fn expanded(&self) -> bool {
        self.expanded
    }

    /// Sets whether children are shown expanded.
    pub fn set_expanded(&mut self, expanded: bool) {
        self.expanded = expanded;
    }

    /// Recurring-task details, if any.
    pub fn recurring_task(&self) -> Option<&RecurringTask> {
        self.recurring.as_ref()
    }

    /// Recurring-task details, created on first use.
    pub fn add_recurring_task(&mut self) -> &mut RecurringTask {
        self.recurring.get_or_insert_with(RecurringTask::default)
    }

    /// Replaces the recurring-task details.
    pub fn set_recurring_task(&mut self, recurring: Option<RecurringTask>) {
        self.recurring = recurring;
    }

    /// Linked subproject, if any.
    pub fn sub_project(&self) -> Option<&SubProject> {
        self.sub_project.as_ref()
    }

    /// Replaces the subproject link.
    pub fn set_sub_project(&mut self, sub_project: Option<SubProject>) {
        self.sub_project = sub_project;
    }

    /// Split ranges: work, gap, work, ... `None` if the task is not split.
    pub fn splits(&self) -> Option<&[DateRange]> {
        self.splits.as_deref()
    }

    /// Replaces the split ranges.
    pub fn set_splits(&mut self, splits: Option<Vec<DateRange>>) {
        self.splits = splits;
    }

    // ================================
    // Identity and ordering
    // ================================

    /// Unique ID (generation order, never reused).
    pub fn unique_id(&self) -> Option<i32> {
        self.get(TaskField::UNIQUE_ID).and_then(FieldValue::as_integer)
    }

    /// Position ID (1-based display order).
    pub fn id(&self) -> Option<i32> {
        self.get(TaskField::ID).and_then(FieldValue::as_integer)
    }

    /// Natural order: by position ID ascending, unset IDs as 0.
    pub fn cmp_by_id(&self, other: &Task) -> Ordering {
        self.id().unwrap_or(0).cmp(&other.id().unwrap_or(0))
    }

    fn flag(&self, field: TaskField) -> bool {
        self.get(field)
            .and_then(FieldValue::as_bool)
            .unwrap_or(false)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmt_id = |v: Option<i32>| v.map_or_else(|| "-".to_string(), |n| n.to_string());
        write!(
            f,
            "[Task id={} uniqueID={} name={}]",
            fmt_id(self.id()),
            fmt_id(self.unique_id()),
            self.name().unwrap_or("")
        )
    }
}

// ================================
// Typed accessors
// ================================

macro_rules! typed_fields {
    ($( $field:ident: $get:ident, $set:ident => $ty:ty, $as:path, $wrap:expr; )*) => {
        impl Task {
            $(
                #[doc = concat!("Stored `", stringify!($field), "` value.")]
                pub fn $get(&self) -> Option<$ty> {
                    self.get(TaskField::$field).and_then($as)
                }

                #[doc = concat!("Writes `", stringify!($field), "`.")]
                pub fn $set(&mut self, value: Option<$ty>) {
                    self.set(TaskField::$field, value.map($wrap));
                }
            )*
        }
    };
}

typed_fields! {
    GUID: guid, set_guid => Uuid, FieldValue::as_guid, FieldValue::Guid;
    OUTLINE_LEVEL: outline_level, set_outline_level => i32, FieldValue::as_integer, FieldValue::Integer;
    CALENDAR_UNIQUE_ID: calendar_unique_id, set_calendar_unique_id => i32, FieldValue::as_integer, FieldValue::Integer;
    ACTIVE: active, set_active => bool, FieldValue::as_bool, FieldValue::Boolean;
    MILESTONE: milestone, set_milestone => bool, FieldValue::as_bool, FieldValue::Boolean;
    ESTIMATED: estimated, set_estimated => bool, FieldValue::as_bool, FieldValue::Boolean;
    EXTERNAL_TASK: external_task, set_external_task => bool, FieldValue::as_bool, FieldValue::Boolean;
    TASK_MODE: task_mode, set_task_mode => TaskMode, FieldValue::as_task_mode, FieldValue::TaskMode;
    PRIORITY: priority, set_priority => Priority, FieldValue::as_priority, FieldValue::Priority;
    CONSTRAINT_TYPE: constraint_type, set_constraint_type => ConstraintType, FieldValue::as_constraint_type, FieldValue::ConstraintType;
    CONSTRAINT_DATE: constraint_date, set_constraint_date => NaiveDateTime, FieldValue::as_date, FieldValue::Date;
    START: start, set_start => NaiveDateTime, FieldValue::as_date, FieldValue::Date;
    FINISH: finish, set_finish => NaiveDateTime, FieldValue::as_date, FieldValue::Date;
    EARLY_START: early_start, set_early_start => NaiveDateTime, FieldValue::as_date, FieldValue::Date;
    EARLY_FINISH: early_finish, set_early_finish => NaiveDateTime, FieldValue::as_date, FieldValue::Date;
    LATE_START: late_start, set_late_start => NaiveDateTime, FieldValue::as_date, FieldValue::Date;
    LATE_FINISH: late_finish, set_late_finish => NaiveDateTime, FieldValue::as_date, FieldValue::Date;
    ACTUAL_START: actual_start, set_actual_start => NaiveDateTime, FieldValue::as_date, FieldValue::Date;
    ACTUAL_FINISH: actual_finish, set_actual_finish => NaiveDateTime, FieldValue::as_date, FieldValue::Date;
    BASELINE_START: baseline_start, set_baseline_start => NaiveDateTime, FieldValue::as_date, FieldValue::Date;
    BASELINE_FINISH: baseline_finish, set_baseline_finish => NaiveDateTime, FieldValue::as_date, FieldValue::Date;
    DEADLINE: deadline, set_deadline => NaiveDateTime, FieldValue::as_date, FieldValue::Date;
    CREATED: created, set_created => NaiveDateTime, FieldValue::as_date, FieldValue::Date;
    STOP: stop, set_stop => NaiveDateTime, FieldValue::as_date, FieldValue::Date;
    RESUME: resume, set_resume => NaiveDateTime, FieldValue::as_date, FieldValue::Date;
    DURATION: duration, set_duration => Duration, FieldValue::as_duration, FieldValue::Duration;
    ACTUAL_DURATION: actual_duration, set_actual_duration => Duration, FieldValue::as_duration, FieldValue::Duration;
    REMAINING_DURATION: remaining_duration, set_remaining_duration => Duration, FieldValue::as_duration, FieldValue::Duration;
    BASELINE_DURATION: baseline_duration, set_baseline_duration => Duration, FieldValue::as_duration, FieldValue::Duration;
    WORK: work, set_work => Duration, FieldValue::as_duration, FieldValue::Duration;
    ACTUAL_WORK: actual_work, set_actual_work => Duration, FieldValue::as_duration, FieldValue::Duration;
    REMAINING_WORK: remaining_work, set_remaining_work => Duration, FieldValue::as_duration, FieldValue::Duration;
    BASELINE_WORK: baseline_work, set_baseline_work => Duration, FieldValue::as_duration, FieldValue::Duration;
    FREE_SLACK: free_slack, set_free_slack => Duration, FieldValue::as_duration, FieldValue::Duration;
    LEVELING_DELAY: leveling_delay, set_leveling_delay => Duration, FieldValue::as_duration, FieldValue::Duration;
    COST: cost, set_cost => f64, FieldValue::as_number, FieldValue::Currency;
    ACTUAL_COST: actual_cost, set_actual_cost => f64, FieldValue::as_number, FieldValue::Currency;
    REMAINING_COST: remaining_cost, set_remaining_cost => f64, FieldValue::as_number, FieldValue::Currency;
    FIXED_COST: fixed_cost, set_fixed_cost => f64, FieldValue::as_number, FieldValue::Currency;
    BASELINE_COST: baseline_cost, set_baseline_cost => f64, FieldValue::as_number, FieldValue::Currency;
    BCWP: bcwp, set_bcwp => f64, FieldValue::as_number, FieldValue::Currency;
    BCWS: bcws, set_bcws => f64, FieldValue::as_number, FieldValue::Currency;
    ACWP: acwp, set_acwp => f64, FieldValue::as_number, FieldValue::Currency;
    PERCENT_COMPLETE: percent_complete, set_percent_complete => f64, FieldValue::as_number, FieldValue::Percentage;
    PERCENT_WORK_COMPLETE: percent_work_complete, set_percent_work_complete => f64, FieldValue::as_number, FieldValue::Percentage;
    PHYSICAL_PERCENT_COMPLETE: physical_percent_complete, set_physical_percent_complete => f64, FieldValue::as_number, FieldValue::Percentage;
}

macro_rules! text_fields {
    ($( $field:ident: $get:ident, $set:ident; )*) => {
        impl Task {
            $(
                #[doc = concat!("Stored `", stringify!($field), "` text.")]
                pub fn $get(&self) -> Option<&str> {
                    self.get(TaskField::$field).and_then(FieldValue::as_str)
                }

                #[doc = concat!("Writes `", stringify!($field), "`.")]
                pub fn $set(&mut self, value: Option<&str>) {
                    self.set(TaskField::$field, value.map(FieldValue::from));
                }
            )*
        }
    };
}

text_fields! {
    NAME: name, set_name;
    WBS: wbs, set_wbs;
    OUTLINE_NUMBER: outline_number, set_outline_number;
    NOTES: notes, set_notes;
    HYPERLINK: hyperlink, set_hyperlink;
    DURATION_TEXT: duration_text, set_duration_text;
    START_TEXT: start_text, set_start_text;
    FINISH_TEXT: finish_text, set_finish_text;
}

macro_rules! indexed_fields {
    ($( $family:ident: $get:ident, $set:ident => $ty:ty, $as:path, $wrap:expr; )*) => {
        impl Task {
            $(
                #[doc = concat!("Stored `", stringify!($family), "` slot (1-based).")]
                pub fn $get(&self, index: usize) -> Result<Option<$ty>> {
                    Ok(self.indexed(FieldFamily::$family, index)?.and_then($as))
                }

                #[doc = concat!("Writes a `", stringify!($family), "` slot (1-based).")]
                pub fn $set(&mut self, index: usize, value: Option<$ty>) -> Result<()> {
                    self.set_indexed(FieldFamily::$family, index, value.map($wrap))
                }
            )*
        }
    };
}

indexed_fields! {
    Cost: custom_cost, set_custom_cost => f64, FieldValue::as_number, FieldValue::Currency;
    Date: custom_date, set_custom_date => NaiveDateTime, FieldValue::as_date, FieldValue::Date;
    Duration: custom_duration, set_custom_duration => Duration, FieldValue::as_duration, FieldValue::Duration;
    Flag: custom_flag, set_custom_flag => bool, FieldValue::as_bool, FieldValue::Boolean;
    Finish: custom_finish, set_custom_finish => NaiveDateTime, FieldValue::as_date, FieldValue::Date;
    Number: custom_number, set_custom_number => f64, FieldValue::as_number, FieldValue::Number;
    Start: custom_start, set_custom_start => NaiveDateTime, FieldValue::as_date, FieldValue::Date;
    EnterpriseCost: enterprise_cost, set_enterprise_cost => f64, FieldValue::as_number, FieldValue::Currency;
    EnterpriseDate: enterprise_date, set_enterprise_date => NaiveDateTime, FieldValue::as_date, FieldValue::Date;
    EnterpriseDuration: enterprise_duration, set_enterprise_duration => Duration, FieldValue::as_duration, FieldValue::Duration;
    EnterpriseFlag: enterprise_flag, set_enterprise_flag => bool, FieldValue::as_bool, FieldValue::Boolean;
    EnterpriseNumber: enterprise_number, set_enterprise_number => f64, FieldValue::as_number, FieldValue::Number;
    BaselineCost: baseline_cost_n, set_baseline_cost_n => f64, FieldValue::as_number, FieldValue::Currency;
    BaselineDuration: baseline_duration_n, set_baseline_duration_n => Duration, FieldValue::as_duration, FieldValue::Duration;
    BaselineStart: baseline_start_n, set_baseline_start_n => NaiveDateTime, FieldValue::as_date, FieldValue::Date;
    BaselineFinish: baseline_finish_n, set_baseline_finish_n => NaiveDateTime, FieldValue::as_date, FieldValue::Date;
    BaselineWork: baseline_work_n, set_baseline_work_n => Duration, FieldValue::as_duration, FieldValue::Duration;
}

impl Task {
    /// Stored custom text slot (1-based).
    pub fn custom_text(&self, index: usize) -> Result<Option<&str>> {
        Ok(self.indexed(FieldFamily::Text, index)?.and_then(FieldValue::as_str))
    }

    /// Writes a custom text slot (1-based).
    pub fn set_custom_text(&mut self, index: usize, value: Option<&str>) -> Result<()> {
        self.set_indexed(FieldFamily::Text, index, value.map(FieldValue::from))
    }

    /// Stored outline code slot (1-based).
    pub fn outline_code(&self, index: usize) -> Result<Option<&str>> {
        Ok(self.indexed(FieldFamily::OutlineCode, index)?.and_then(FieldValue::as_str))
    }

    /// Writes an outline code slot (1-based).
    pub fn set_outline_code(&mut self, index: usize, value: Option<&str>) -> Result<()> {
        self.set_indexed(FieldFamily::OutlineCode, index, value.map(FieldValue::from))
    }

    /// Stored enterprise text slot (1-based).
    pub fn enterprise_text(&self, index: usize) -> Result<Option<&str>> {
        Ok(self.indexed(FieldFamily::EnterpriseText, index)?.and_then(FieldValue::as_str))
    }

    /// Writes an enterprise text slot (1-based).
    pub fn set_enterprise_text(&mut self, index: usize, value: Option<&str>) -> Result<()> {
        self.set_indexed(FieldFamily::EnterpriseText, index, value.map(FieldValue::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProjectError;
    use crate::models::listener_fn;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn task() -> Task {
        Task::new(TaskKey(0))
    }

    #[test]
    fn test_typed_round_trip_distinguishes_unset() {
        let mut t = task();
        assert_eq!(t.cost(), None);
        t.set_cost(Some(0.0));
        assert_eq!(t.cost(), Some(0.0));
        t.set_cost(None);
        assert_eq!(t.cost(), None);

        t.set_name(Some(""));
        assert_eq!(t.name(), Some(""));
    }

    #[test]
    fn test_indexed_accessors() {
        let mut t = task();
        t.set_custom_text(30, Some("last")).unwrap();
        assert_eq!(t.custom_text(30).unwrap(), Some("last"));
        assert_eq!(t.custom_text(1).unwrap(), None);

        t.set_baseline_cost_n(10, Some(125.0)).unwrap();
        assert_eq!(t.baseline_cost_n(10).unwrap(), Some(125.0));
        // Numbered baselines are distinct from the plain baseline field.
        assert_eq!(t.baseline_cost(), None);
    }

    #[test]
    fn test_indexed_out_of_range() {
        let mut t = task();
        assert!(matches!(
            t.custom_text(0),
            Err(ProjectError::InvalidFieldIndex { index: 0, size: 30, .. })
        ));
        assert!(t.set_custom_flag(21, Some(true)).is_err());
        assert!(t.enterprise_number(41).is_err());
    }

    #[test]
    fn test_listener_sees_writes() {
        let mut t = task();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = t.add_field_listener(listener_fn(move |c| {
            sink.borrow_mut().push((c.field, c.old_value.cloned(), c.new_value.cloned()));
        }));

        t.set_name(Some("A"));
        t.set_name(Some("B"));
        assert!(t.remove_field_listener(id));
        t.set_name(Some("C"));

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1], (TaskField::NAME, Some("A".into()), Some("B".into())));
    }

    #[test]
    fn test_disabled_events_still_invalidate() {
        let mut t = task();
        t.set(TaskField::DURATION_VARIANCE, FieldValue::Duration(Duration::days(1.0)));
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        t.add_field_listener(listener_fn(move |_| *counter.borrow_mut() += 1));

        t.disable_events();
        assert!(!t.events_enabled());
        t.set_duration(Some(Duration::days(4.0)));
        assert_eq!(*calls.borrow(), 0);
        assert!(t.get(TaskField::DURATION_VARIANCE).is_none());

        t.enable_events();
        t.set_duration(Some(Duration::days(5.0)));
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn test_with_relations_creates_list_once() {
        let mut t = task();
        assert!(t.predecessors().is_empty());
        let r = Relation::new(TaskKey(0), TaskKey(1), Default::default(), Duration::days(0.0));
        t.with_relations(TaskField::PREDECESSORS, |list| list.push(r));
        t.with_relations(TaskField::PREDECESSORS, |list| list.push(r));
        assert_eq!(t.predecessors().len(), 2);
        assert!(t.successors().is_empty());
    }

    #[test]
    fn test_structural_flags() {
        let mut t = task();
        assert!(t.expanded());
        assert!(!t.is_null());
        t.set_expanded(false);
        t.set_null(true);
        t.set_wbs_level(Some("1.2".to_string()));
        t.add_recurring_task().occurrences = Some(4);
        assert!(!t.expanded());
        assert!(t.is_null());
        assert_eq!(t.wbs_level(), Some("1.2"));
        assert_eq!(t.recurring_task().and_then(|r| r.occurrences), Some(4));
        assert!(t.splits().is_none());
    }

    #[test]
    fn test_display() {
        let mut t = task();
        t.set(TaskField::ID, FieldValue::Integer(4));
        t.set(TaskField::UNIQUE_ID, FieldValue::Integer(9));
        t.set_name(Some("Design"));
        assert_eq!(t.to_string(), "[Task id=4 uniqueID=9 name=Design]");
    }

    #[test]
    fn test_cmp_by_id() {
        let mut a = task();
        let mut b = Task::new(TaskKey(1));
        a.set(TaskField::ID, FieldValue::Integer(2));
        b.set(TaskField::ID, FieldValue::Integer(5));
        assert_eq!(a.cmp_by_id(&b), Ordering::Less);
        b.set(TaskField::ID, FieldValue::Integer(2));
        assert_eq!(a.cmp_by_id(&b), Ordering::Equal);
    }
}
