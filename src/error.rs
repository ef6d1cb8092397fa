//! Error types for project model operations.
//!
//! Absent field values are not errors: every accessor returns `Option`.
//! Errors are reserved for programming mistakes at the API boundary
//! (out-of-range family index, dangling task key) and for identity
//! conflicts reported by the container registries.

use thiserror::Error;

use crate::models::{FieldFamily, TaskKey};

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, ProjectError>;

/// Errors raised by the project model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectError {
    /// A 1-based index outside the declared size of an indexed field family.
    #[error("{index} is not a valid {family} index (expected 1..={size})")]
    InvalidFieldIndex {
        family: FieldFamily,
        index: usize,
        size: usize,
    },

    /// The task key does not refer to a live task.
    #[error("task {0} does not exist")]
    UnknownTask(TaskKey),

    /// The unique ID is already registered to another task.
    #[error("unique ID {0} is already assigned to another task")]
    DuplicateUniqueId(i32),

    /// The position ID is already registered to another task.
    #[error("ID {0} is already assigned to another task")]
    DuplicateId(i32),

    /// No calendar is registered under this unique ID.
    #[error("calendar {0} does not exist")]
    UnknownCalendar(i32),

    /// Attaching would make a task its own ancestor.
    #[error("cannot attach task {child} beneath {parent}: {parent} is {child} or one of its descendants")]
    HierarchyCycle { child: TaskKey, parent: TaskKey },

    /// No task field carries this alias.
    #[error("no task field has the alias '{0}'")]
    UnknownAlias(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_index_message() {
        let err = ProjectError::InvalidFieldIndex {
            family: FieldFamily::Text,
            index: 31,
            size: 30,
        };
        assert_eq!(
            err.to_string(),
            "31 is not a valid Text index (expected 1..=30)"
        );
    }
}
