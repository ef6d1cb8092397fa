//! Field values.
//!
//! A [`FieldValue`] holds one attribute of heterogeneous semantic type.
//! Stores hold `Option<FieldValue>`: `None` is "unset", distinct from a
//! stored zero, empty string or `false`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DataType, Duration, Relation};

/// Scheduling mode of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskMode {
    /// Dates are calculated by the scheduler.
    #[default]
    AutoScheduled,
    /// Dates are entered by the user and may be free text.
    ManuallyScheduled,
}

/// Date constraint applied to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConstraintType {
    #[default]
    AsSoonAsPossible,
    AsLateAsPossible,
    MustStartOn,
    MustFinishOn,
    StartNoEarlierThan,
    StartNoLaterThan,
    FinishNoEarlierThan,
    FinishNoLaterThan,
}

/// Task priority on a 0–1000 scale (higher = more important).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Priority(pub u16);

impl Priority {
    pub const LOWEST: Priority = Priority(100);
    pub const VERY_LOW: Priority = Priority(200);
    pub const LOWER: Priority = Priority(300);
    pub const LOW: Priority = Priority(400);
    pub const MEDIUM: Priority = Priority(500);
    pub const HIGH: Priority = Priority(600);
    pub const HIGHER: Priority = Priority(700);
    pub const VERY_HIGH: Priority = Priority(800);
    pub const HIGHEST: Priority = Priority(900);
    pub const DO_NOT_LEVEL: Priority = Priority(1000);
}

impl Default for Priority {
    fn default() -> Self {
        Self::MEDIUM
    }
}

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    String(String),
    Date(NaiveDateTime),
    Duration(Duration),
    Currency(f64),
    Number(f64),
    Integer(i32),
    Percentage(f64),
    Boolean(bool),
    TaskMode(TaskMode),
    Priority(Priority),
    ConstraintType(ConstraintType),
    Relations(Vec<Relation>),
    Guid(Uuid),
}

impl FieldValue {
    /// The data type this value naturally carries.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::String(_) => DataType::String,
            Self::Date(_) => DataType::Date,
            Self::Duration(_) => DataType::Duration,
            Self::Currency(_) => DataType::Currency,
            Self::Number(_) => DataType::Number,
            Self::Integer(_) => DataType::Integer,
            Self::Percentage(_) => DataType::Percentage,
            Self::Boolean(_) => DataType::Boolean,
            Self::TaskMode(_) => DataType::TaskMode,
            Self::Priority(_) => DataType::Priority,
            Self::ConstraintType(_) => DataType::ConstraintType,
            Self::Relations(_) => DataType::RelationList,
            Self::Guid(_) => DataType::Guid,
        }
    }

    /// Whether this value may be stored in a slot of type `data_type`.
    ///
    /// Numeric kinds are interchangeable, as are work and duration.
    pub fn fits(&self, data_type: DataType) -> bool {
        match (self, data_type) {
            (
                Self::Currency(_) | Self::Number(_) | Self::Percentage(_) | Self::Integer(_),
                DataType::Currency | DataType::Number | DataType::Percentage,
            ) => true,
            (Self::Duration(_), DataType::Duration | DataType::Work) => true,
            _ => self.data_type() == data_type,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Duration(d) => Some(*d),
            _ => None,
        }
    }

    /// Any numeric kind, widened to `f64`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Currency(n) | Self::Number(n) | Self::Percentage(n) => Some(*n),
            Self::Integer(n) => Some(f64::from(*n)),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_task_mode(&self) -> Option<TaskMode> {
        match self {
            Self::TaskMode(m) => Some(*m),
            _ => None,
        }
    }

    pub fn as_priority(&self) -> Option<Priority> {
        match self {
            Self::Priority(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_constraint_type(&self) -> Option<ConstraintType> {
        match self {
            Self::ConstraintType(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_relations(&self) -> Option<&[Relation]> {
        match self {
            Self::Relations(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_relations_mut(&mut self) -> Option<&mut Vec<Relation>> {
        match self {
            Self::Relations(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_guid(&self) -> Option<Uuid> {
        match self {
            Self::Guid(g) => Some(*g),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::Date(value)
    }
}

impl From<Duration> for FieldValue {
    fn from(value: Duration) -> Self {
        Self::Duration(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<TaskMode> for FieldValue {
    fn from(value: TaskMode) -> Self {
        Self::TaskMode(value)
    }
}

impl From<Priority> for FieldValue {
    fn from(value: Priority) -> Self {
        Self::Priority(value)
    }
}

impl From<ConstraintType> for FieldValue {
    fn from(value: ConstraintType) -> Self {
        Self::ConstraintType(value)
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        Self::Guid(value)
    }
}

impl From<Vec<Relation>> for FieldValue {
    fn from(value: Vec<Relation>) -> Self {
        Self::Relations(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_widening() {
        assert_eq!(FieldValue::Currency(12.5).as_number(), Some(12.5));
        assert_eq!(FieldValue::Integer(3).as_number(), Some(3.0));
        assert_eq!(FieldValue::from("x").as_number(), None);
    }

    #[test]
    fn test_fits() {
        assert!(FieldValue::Number(1.0).fits(DataType::Currency));
        assert!(FieldValue::Duration(Duration::days(1.0)).fits(DataType::Work));
        assert!(!FieldValue::Boolean(true).fits(DataType::String));
        assert!(FieldValue::from(Priority::HIGH).fits(DataType::Priority));
    }

    #[test]
    fn test_zero_is_a_value() {
        let zero = FieldValue::from(0.0);
        assert_eq!(zero.as_number(), Some(0.0));
        let empty = FieldValue::from("");
        assert_eq!(empty.as_str(), Some(""));
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::HIGHEST > Priority::MEDIUM);
        assert_eq!(Priority::default(), Priority::MEDIUM);
    }
}
