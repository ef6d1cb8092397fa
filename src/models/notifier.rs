//! Field change interception.
//!
//! Every task write passes through [`ChangeNotifier::field_changed`]
//! before the new value is committed. The notifier:
//!
//! 1. clears cached derived fields that depend on the written field,
//!    following the static table in [`dependents`] transitively;
//! 2. if events are enabled, broadcasts the (old, new) pair to every
//!    registered [`FieldListener`] in registration order.
//!
//! Step 1 runs even while events are suspended: cached values must never
//! be stale, whoever is or isn't listening.

use log::trace;
use std::fmt;

use super::{FieldStore, FieldValue, TaskField, TaskKey};

/// A field write observed before it is committed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldChange<'a> {
    /// Task being written.
    pub task: TaskKey,
    /// Field being written.
    pub field: TaskField,
    /// Value currently stored.
    pub old_value: Option<&'a FieldValue>,
    /// Value about to be stored.
    pub new_value: Option<&'a FieldValue>,
}

/// Observer of task field writes.
pub trait FieldListener {
    /// Called synchronously for each write while events are enabled.
    fn field_change(&mut self, change: &FieldChange<'_>);
}

impl<F> FieldListener for F
where
    F: FnMut(&FieldChange<'_>),
{
    fn field_change(&mut self, change: &FieldChange<'_>) {
        self(change)
    }
}

/// Boxes a closure as a listener.
pub fn listener_fn<F>(f: F) -> Box<dyn FieldListener>
where
    F: FnMut(&FieldChange<'_>) + 'static,
{
    Box::new(f)
}

/// Handle returned on listener registration, used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

/// Derived fields directly invalidated by a write to `field`.
pub fn dependents(field: TaskField) -> &'static [TaskField] {
    match field {
        TaskField::START | TaskField::BASELINE_START => &[TaskField::START_VARIANCE],
        TaskField::FINISH | TaskField::BASELINE_FINISH => &[TaskField::FINISH_VARIANCE],
        TaskField::COST | TaskField::BASELINE_COST => &[TaskField::COST_VARIANCE],
        TaskField::DURATION => &[
            TaskField::DURATION_VARIANCE,
            TaskField::COMPLETE_THROUGH,
            TaskField::START_SLACK,
            TaskField::FINISH_SLACK,
        ],
        TaskField::BASELINE_DURATION => &[TaskField::DURATION_VARIANCE],
        TaskField::WORK | TaskField::BASELINE_WORK => &[TaskField::WORK_VARIANCE],
        TaskField::BCWP | TaskField::ACWP => &[TaskField::CV, TaskField::SV],
        TaskField::BCWS => &[TaskField::SV],
        TaskField::EARLY_START | TaskField::LATE_START => &[TaskField::START_SLACK],
        TaskField::EARLY_FINISH | TaskField::LATE_FINISH => &[TaskField::FINISH_SLACK],
        TaskField::START_SLACK | TaskField::FINISH_SLACK => &[TaskField::TOTAL_SLACK],
        TaskField::TOTAL_SLACK => &[TaskField::CRITICAL],
        TaskField::PERCENT_COMPLETE => &[TaskField::COMPLETE_THROUGH, TaskField::CRITICAL],
        TaskField::ACTUAL_START | TaskField::ACTUAL_FINISH => &[TaskField::COMPLETE_THROUGH],
        TaskField::TASK_MODE
        | TaskField::DURATION_TEXT
        | TaskField::START_TEXT
        | TaskField::FINISH_TEXT => &[TaskField::CRITICAL],
        TaskField::CALENDAR_UNIQUE_ID => &[
            TaskField::START_SLACK,
            TaskField::FINISH_SLACK,
            TaskField::START_VARIANCE,
            TaskField::FINISH_VARIANCE,
            TaskField::COMPLETE_THROUGH,
        ],
        _ => &[],
    }
}

/// Per-task cache invalidation and listener fan-out.
pub struct ChangeNotifier {
    listeners: Vec<(ListenerId, Box<dyn FieldListener>)>,
    next_id: u32,
    enabled: bool,
}

impl ChangeNotifier {
    /// Creates a notifier with events enabled and no listeners.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
            enabled: true,
        }
    }

    /// Whether listeners are notified.
    pub fn events_enabled(&self) -> bool {
        self.enabled
    }

    /// Suspends or resumes listener notification.
    pub fn set_events_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Registers a listener; it is notified after every earlier one.
    pub fn add_listener(&mut self, listener: Box<dyn FieldListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Unregisters a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Clears every cached field that depends, directly or transitively,
    /// on `field`.
    pub fn invalidate(store: &mut FieldStore<TaskField>, field: TaskField) {
        for &dependent in dependents(field) {
            if store.clear(dependent).is_some() {
                trace!("{field} write cleared cached {dependent}");
            }
            Self::invalidate(store, dependent);
        }
    }

    /// Handles a pending write of `new_value` to `field`.
    ///
    /// Must be called before the value is committed so listeners see the
    /// stored value as `old_value`.
    pub fn field_changed(
        &mut self,
        store: &mut FieldStore<TaskField>,
        task: TaskKey,
        field: TaskField,
        new_value: Option<&FieldValue>,
    ) {
        Self::invalidate(store, field);

        if !self.enabled || self.listeners.is_empty() {
            return;
        }

        let change = FieldChange {
            task,
            field,
            old_value: store.get(field),
            new_value,
        };
        for (_, listener) in &mut self.listeners {
            listener.field_change(&change);
        }
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.listeners.len())
            .field("enabled", &self.enabled)
            .finish()
    }
}
