//! Precedence relations between tasks.
//!
//! A relation is stored twice: once in the dependent task's predecessor
//! list (source = dependent, target = predecessor) and once, reversed, in
//! the predecessor's successor list. See [`crate::relations`] for the
//! operations that keep the two in step.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Duration, TaskKey};

/// Kind of precedence link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RelationType {
    /// Target must finish before source starts.
    #[default]
    FinishToStart,
    /// Target must start before source starts.
    StartToStart,
    /// Target must finish before source finishes.
    FinishToFinish,
    /// Target must start before source finishes.
    StartToFinish,
}

impl RelationType {
    /// Conventional two-letter code.
    pub fn code(self) -> &'static str {
        match self {
            Self::FinishToStart => "FS",
            Self::StartToStart => "SS",
            Self::FinishToFinish => "FF",
            Self::StartToFinish => "SF",
        }
    }
}

/// One side of a precedence edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    /// Task holding this entry in its list.
    pub source_task: TaskKey,
    /// Task on the other end of the edge.
    pub target_task: TaskKey,
    /// Link kind.
    pub kind: RelationType,
    /// Offset applied to the link.
    pub lag: Duration,
}

impl Relation {
    /// Creates a relation.
    pub fn new(source_task: TaskKey, target_task: TaskKey, kind: RelationType, lag: Duration) -> Self {
        Self {
            source_task,
            target_task,
            kind,
            lag,
        }
    }

    /// The same edge seen from the target's side.
    pub fn reversed(&self) -> Self {
        Self::new(self.target_task, self.source_task, self.kind, self.lag)
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} {} {}",
            self.source_task,
            self.target_task,
            self.kind.code(),
            self.lag
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reversed() {
        let r = Relation::new(TaskKey(1), TaskKey(2), RelationType::StartToStart, Duration::days(2.0));
        let back = r.reversed();
        assert_eq!(back.source_task, TaskKey(2));
        assert_eq!(back.target_task, TaskKey(1));
        assert_eq!(back.kind, RelationType::StartToStart);
        assert_eq!(back.lag, r.lag);
        assert_eq!(back.reversed(), r);
    }

    #[test]
    fn test_display() {
        let r = Relation::new(TaskKey(3), TaskKey(7), RelationType::FinishToStart, Duration::days(0.0));
        assert_eq!(r.to_string(), "3 -> 7 FS 0d");
    }
}
