//! Project data model.
//!
//! Provides the task entity and the value types stored on it, plus the
//! [`ProjectFile`] container that owns tasks and the services they use.
//!
//! # Layers
//!
//! | Type | Role |
//! |------|------|
//! | [`TaskField`], [`FieldFamily`] | closed field identifier set |
//! | [`FieldValue`] | typed attribute values |
//! | [`FieldStore`] | fixed-capacity attribute storage |
//! | [`ChangeNotifier`] | cache invalidation and listener fan-out |
//! | [`Task`] | attributes plus outline and relation state |
//! | [`ProjectFile`] | task arena, ID registries, calendars, aliases |

mod calendar;
mod duration;
mod field;
mod field_store;
mod notifier;
mod project;
mod relation;
mod task;
mod value;

pub use calendar::{CalendarException, CalendarRegistry, ProjectCalendar, WorkingPeriod};
pub use duration::{Duration, TimeUnit};
pub use field::{DataType, FieldFamily, TaskField};
pub use field_store::{FieldKey, FieldStore};
pub use notifier::{dependents, listener_fn, ChangeNotifier, FieldChange, FieldListener, ListenerId};
pub use project::ProjectFile;
pub use relation::{Relation, RelationType};
pub use task::{DateRange, RecurrenceType, RecurringTask, SubProject, Task, TaskKey};
pub use value::{ConstraintType, FieldValue, Priority, TaskMode};
