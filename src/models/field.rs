//! Task field identifiers.
//!
//! [`TaskField`] is a closed set of identifiers, one per storage slot.
//! Fixed fields (name, start, duration, ...) are named constants; the
//! repeated custom, enterprise and baseline fields form [`FieldFamily`]
//! ranges addressed by a 1-based index.
//!
//! # Layout
//!
//! Ordinals are dense: fixed fields first, in declaration order, then
//! each family's slots in [`FieldFamily::ALL`] order. `TaskField::MAX_VALUE`
//! is the total slot count, so a store sized to it can be indexed by
//! ordinal without bounds surprises.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::{ProjectError, Result};

/// Semantic type of a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    String,
    Date,
    Duration,
    Work,
    Currency,
    Number,
    Integer,
    Percentage,
    Boolean,
    TaskMode,
    Priority,
    ConstraintType,
    RelationList,
    Guid,
}

/// Identifier of a task attribute slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskField(u16);

macro_rules! fixed_fields {
    ($( $konst:ident => $label:literal, $ty:ident; )*) => {
        #[allow(non_camel_case_types, clippy::upper_case_acronyms)]
        #[repr(u16)]
        enum Fixed {
            $($konst),*
        }

        impl TaskField {
            $(
                #[doc = concat!("The `", $label, "` field.")]
                pub const $konst: TaskField = TaskField(Fixed::$konst as u16);
            )*
        }

        const FIXED_FIELDS: &[(&str, DataType)] = &[
            $(($label, DataType::$ty)),*
        ];
    };
}

fixed_fields! {
    UNIQUE_ID => "Unique ID", Integer;
    ID => "ID", Integer;
    NAME => "Name", String;
    GUID => "GUID", Guid;
    WBS => "WBS", String;
    OUTLINE_NUMBER => "Outline Number", String;
    OUTLINE_LEVEL => "Outline Level", Integer;
    SUMMARY => "Summary", Boolean;
    NOTES => "Notes", String;
    HYPERLINK => "Hyperlink", String;
    ACTIVE => "Active", Boolean;
    TASK_MODE => "Task Mode", TaskMode;
    PRIORITY => "Priority", Priority;
    CONSTRAINT_TYPE => "Constraint Type", ConstraintType;
    CONSTRAINT_DATE => "Constraint Date", Date;
    CALENDAR_UNIQUE_ID => "Calendar Unique ID", Integer;
    MILESTONE => "Milestone", Boolean;
    ESTIMATED => "Estimated", Boolean;
    EXTERNAL_TASK => "External Task", Boolean;
    MARKED => "Marked", Boolean;
    START => "Start", Date;
    FINISH => "Finish", Date;
    EARLY_START => "Early Start", Date;
    EARLY_FINISH => "Early Finish", Date;
    LATE_START => "Late Start", Date;
    LATE_FINISH => "Late Finish", Date;
    ACTUAL_START => "Actual Start", Date;
    ACTUAL_FINISH => "Actual Finish", Date;
    BASELINE_START => "Baseline Start", Date;
    BASELINE_FINISH => "Baseline Finish", Date;
    DEADLINE => "Deadline", Date;
    CREATED => "Created", Date;
    STOP => "Stop", Date;
    RESUME => "Resume", Date;
    COMPLETE_THROUGH => "Complete Through", Date;
    SUMMARY_PROGRESS => "Summary Progress", Date;
    DURATION => "Duration", Duration;
    ACTUAL_DURATION => "Actual Duration", Duration;
    REMAINING_DURATION => "Remaining Duration", Duration;
    BASELINE_DURATION => "Baseline Duration", Duration;
    WORK => "Work", Work;
    ACTUAL_WORK => "Actual Work", Work;
    REMAINING_WORK => "Remaining Work", Work;
    BASELINE_WORK => "Baseline Work", Work;
    START_SLACK => "Start Slack", Duration;
    FINISH_SLACK => "Finish Slack", Duration;
    TOTAL_SLACK => "Total Slack", Duration;
    FREE_SLACK => "Free Slack", Duration;
    START_VARIANCE => "Start Variance", Duration;
    FINISH_VARIANCE => "Finish Variance", Duration;
    DURATION_VARIANCE => "Duration Variance", Duration;
    WORK_VARIANCE => "Work Variance", Work;
    LEVELING_DELAY => "Leveling Delay", Duration;
    COST => "Cost", Currency;
    ACTUAL_COST => "Actual Cost", Currency;
    REMAINING_COST => "Remaining Cost", Currency;
    FIXED_COST => "Fixed Cost", Currency;
    BASELINE_COST => "Baseline Cost", Currency;
    COST_VARIANCE => "Cost Variance", Currency;
    BCWP => "BCWP", Currency;
    BCWS => "BCWS", Currency;
    ACWP => "ACWP", Currency;
    CV => "CV", Currency;
    SV => "SV", Currency;
    PERCENT_COMPLETE => "% Complete", Percentage;
    PERCENT_WORK_COMPLETE => "% Work Complete", Percentage;
    PHYSICAL_PERCENT_COMPLETE => "Physical % Complete", Percentage;
    DURATION_TEXT => "Duration Text", String;
    START_TEXT => "Start Text", String;
    FINISH_TEXT => "Finish Text", String;
    CRITICAL => "Critical", Boolean;
    PREDECESSORS => "Predecessors", RelationList;
    SUCCESSORS => "Successors", RelationList;
}

const FIXED_COUNT: usize = FIXED_FIELDS.len();

/// Fields whose values are computed from other fields and cached.
const DERIVED_FIELDS: [TaskField; 12] = [
    TaskField::START_VARIANCE,
    TaskField::FINISH_VARIANCE,
    TaskField::DURATION_VARIANCE,
    TaskField::WORK_VARIANCE,
    TaskField::COST_VARIANCE,
    TaskField::CV,
    TaskField::SV,
    TaskField::START_SLACK,
    TaskField::FINISH_SLACK,
    TaskField::TOTAL_SLACK,
    TaskField::CRITICAL,
    TaskField::COMPLETE_THROUGH,
];

/// A family of repeated fields addressed by a 1-based index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldFamily {
    Cost,
    Date,
    Duration,
    Flag,
    Finish,
    Number,
    Start,
    Text,
    OutlineCode,
    EnterpriseCost,
    EnterpriseDate,
    EnterpriseDuration,
    EnterpriseFlag,
    EnterpriseNumber,
    EnterpriseText,
    BaselineCost,
    BaselineDuration,
    BaselineStart,
    BaselineFinish,
    BaselineWork,
}

impl FieldFamily {
    /// Every family, in slot layout order.
    pub const ALL: [FieldFamily; 20] = [
        Self::Cost,
        Self::Date,
        Self::Duration,
        Self::Flag,
        Self::Finish,
        Self::Number,
        Self::Start,
        Self::Text,
        Self::OutlineCode,
        Self::EnterpriseCost,
        Self::EnterpriseDate,
        Self::EnterpriseDuration,
        Self::EnterpriseFlag,
        Self::EnterpriseNumber,
        Self::EnterpriseText,
        Self::BaselineCost,
        Self::BaselineDuration,
        Self::BaselineStart,
        Self::BaselineFinish,
        Self::BaselineWork,
    ];

    /// Declared number of slots.
    pub const fn size(self) -> usize {
        match self {
            Self::Cost | Self::Date | Self::Duration | Self::Finish | Self::Start => 10,
            Self::Flag | Self::Number => 20,
            Self::Text => 30,
            Self::OutlineCode => 10,
            Self::EnterpriseCost | Self::EnterpriseDuration => 10,
            Self::EnterpriseDate => 30,
            Self::EnterpriseFlag => 20,
            Self::EnterpriseNumber | Self::EnterpriseText => 40,
            Self::BaselineCost
            | Self::BaselineDuration
            | Self::BaselineStart
            | Self::BaselineFinish
            | Self::BaselineWork => 10,
        }
    }

    /// Data type shared by every slot of the family.
    pub const fn data_type(self) -> DataType {
        match self {
            Self::Cost | Self::EnterpriseCost | Self::BaselineCost => DataType::Currency,
            Self::Date
            | Self::Finish
            | Self::Start
            | Self::EnterpriseDate
            | Self::BaselineStart
            | Self::BaselineFinish => DataType::Date,
            Self::Duration | Self::EnterpriseDuration | Self::BaselineDuration => {
                DataType::Duration
            }
            Self::BaselineWork => DataType::Work,
            Self::Flag | Self::EnterpriseFlag => DataType::Boolean,
            Self::Number | Self::EnterpriseNumber => DataType::Number,
            Self::Text | Self::OutlineCode | Self::EnterpriseText => DataType::String,
        }
    }

    /// Position of the family in [`FieldFamily::ALL`].
    const fn position(self) -> usize {
        self as usize
    }

    /// Ordinal of the family's first slot.
    const fn base(self) -> usize {
        let mut offset = FIXED_COUNT;
        let mut i = 0;
        while i < self.position() {
            offset += Self::ALL[i].size();
            i += 1;
        }
        offset
    }

    /// Maps a 1-based index to the underlying field identifier.
    ///
    /// # Errors
    /// [`ProjectError::InvalidFieldIndex`] if `index` is 0 or beyond
    /// [`size`](Self::size).
    pub fn field(self, index: usize) -> Result<TaskField> {
        if index < 1 || index > self.size() {
            return Err(ProjectError::InvalidFieldIndex {
                family: self,
                index,
                size: self.size(),
            });
        }
        Ok(TaskField((self.base() + index - 1) as u16))
    }

    fn slot_name(self, index: usize) -> String {
        match self {
            Self::Cost => format!("Cost{index}"),
            Self::Date => format!("Date{index}"),
            Self::Duration => format!("Duration{index}"),
            Self::Flag => format!("Flag{index}"),
            Self::Finish => format!("Finish{index}"),
            Self::Number => format!("Number{index}"),
            Self::Start => format!("Start{index}"),
            Self::Text => format!("Text{index}"),
            Self::OutlineCode => format!("Outline Code{index}"),
            Self::EnterpriseCost => format!("Enterprise Cost{index}"),
            Self::EnterpriseDate => format!("Enterprise Date{index}"),
            Self::EnterpriseDuration => format!("Enterprise Duration{index}"),
            Self::EnterpriseFlag => format!("Enterprise Flag{index}"),
            Self::EnterpriseNumber => format!("Enterprise Number{index}"),
            Self::EnterpriseText => format!("Enterprise Text{index}"),
            Self::BaselineCost => format!("Baseline{index} Cost"),
            Self::BaselineDuration => format!("Baseline{index} Duration"),
            Self::BaselineStart => format!("Baseline{index} Start"),
            Self::BaselineFinish => format!("Baseline{index} Finish"),
            Self::BaselineWork => format!("Baseline{index} Work"),
        }
    }
}

impl fmt::Display for FieldFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

const FAMILY_SLOTS: usize = {
    let mut total = 0;
    let mut i = 0;
    while i < FieldFamily::ALL.len() {
        total += FieldFamily::ALL[i].size();
        i += 1;
    }
    total
};

impl TaskField {
    /// Total number of field slots.
    pub const MAX_VALUE: usize = FIXED_COUNT + FAMILY_SLOTS;

    /// Dense ordinal used to index storage.
    #[inline]
    pub const fn ordinal(self) -> usize {
        self.0 as usize
    }

    /// Field for an ordinal, if in range.
    pub fn from_ordinal(ordinal: usize) -> Option<TaskField> {
        (ordinal < Self::MAX_VALUE).then(|| TaskField(ordinal as u16))
    }

    /// Iterates over every field in ordinal order.
    pub fn all() -> impl Iterator<Item = TaskField> {
        (0..Self::MAX_VALUE).map(|o| TaskField(o as u16))
    }

    /// Family and 1-based index, for family slots.
    pub fn family(self) -> Option<(FieldFamily, usize)> {
        let ordinal = self.ordinal();
        if ordinal < FIXED_COUNT {
            return None;
        }
        FieldFamily::ALL.iter().find_map(|&family| {
            let base = family.base();
            (ordinal >= base && ordinal < base + family.size())
                .then(|| (family, ordinal - base + 1))
        })
    }

    /// Declared data type.
    pub fn data_type(self) -> DataType {
        match self.family() {
            Some((family, _)) => family.data_type(),
            None => FIXED_FIELDS[self.ordinal()].1,
        }
    }

    /// Canonical display name.
    pub fn name(self) -> String {
        match self.family() {
            Some((family, index)) => family.slot_name(index),
            None => FIXED_FIELDS[self.ordinal()].0.to_string(),
        }
    }

    /// Resolves a canonical name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<TaskField> {
        Self::all().find(|f| f.name().eq_ignore_ascii_case(name))
    }

    /// Whether the field is computed from other fields and cached.
    pub fn is_derived(self) -> bool {
        DERIVED_FIELDS.contains(&self)
    }

    /// Every derived field.
    pub fn derived() -> &'static [TaskField] {
        &DERIVED_FIELDS
    }
}

impl fmt::Debug for TaskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskField({})", self.name())
    }
}

impl fmt::Display for TaskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl Serialize for TaskField {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}

impl<'de> Deserialize<'de> for TaskField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        TaskField::from_name(&name)
            .ok_or_else(|| de::Error::custom(format!("unknown task field '{name}'")))
    }
}
