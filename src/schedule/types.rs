use std::collections::BTreeMap;
use std::fmt;
use serde::{Serialize, Deserialize};

/// What a teacher is doing during a scheduled activity.
///
/// Only `Duty` (reinforcement or supervision periods) makes a teacher
/// eligible to cover somebody else's slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityKind {
    #[default]
    Class,
    Duty,
}

impl ActivityKind {
    /// Maps a raw activity label to its kind. Unknown labels count as class time.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "refuerzo" | "guardia" | "duty" => ActivityKind::Duty,
            _ => ActivityKind::Class,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActivityKind::Class => "clase",
            ActivityKind::Duty => "refuerzo",
        }
    }
}

impl From<String> for ActivityKind {
    fn from(value: String) -> Self {
        ActivityKind::from_label(&value)
    }
}

impl From<ActivityKind> for String {
    fn from(kind: ActivityKind) -> Self {
        kind.label().to_string()
    }
}

/// One entry of a teacher's day: a slot label, a subject and its kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub time: String,
    #[serde(default)]
    pub subject: String,
    #[serde(rename = "type", default)]
    pub kind: ActivityKind,
}

impl Activity {
    pub fn new(time: impl Into<String>, subject: impl Into<String>, kind: ActivityKind) -> Self {
        Self {
            time: time.into(),
            subject: subject.into(),
            kind,
        }
    }

    pub fn duty(time: impl Into<String>, subject: impl Into<String>) -> Self {
        Self::new(time, subject, ActivityKind::Duty)
    }

    pub fn class(time: impl Into<String>, subject: impl Into<String>) -> Self {
        Self::new(time, subject, ActivityKind::Class)
    }

    pub fn is_duty(&self) -> bool {
        self.kind == ActivityKind::Duty
    }
}

/// A teacher's weekly schedule: day name -> ordered activities for that day
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TeacherSchedule {
    pub teacher_name: String,
    #[serde(default)]
    pub schedule: BTreeMap<String, Vec<Activity>>,
}

impl TeacherSchedule {
    pub fn new(teacher_name: impl Into<String>) -> Self {
        Self {
            teacher_name: teacher_name.into(),
            schedule: BTreeMap::new(),
        }
    }

    /// Appends an activity to the given day.
    pub fn with_activity(mut self, day: impl Into<String>, activity: Activity) -> Self {
        self.schedule.entry(day.into()).or_default().push(activity);
        self
    }

    /// Activities for `day`, empty when the teacher has nothing scheduled.
    pub fn activities_on(&self, day: &str) -> &[Activity] {
        self.schedule.get(day).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A request to cover `absent_teacher` on `day` from slot `start` through slot `end`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsenceRequest {
    pub absent_teacher: String,
    pub day: String,
    pub start: String,
    pub end: String,
}

impl AbsenceRequest {
    pub fn new(
        absent_teacher: impl Into<String>,
        day: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        Self {
            absent_teacher: absent_teacher.into(),
            day: day.into(),
            start: start.into(),
            end: end.into(),
        }
    }
}

/// Outcome for one slot when no single teacher can cover the whole block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAssignment {
    pub slot: String,
    /// Suggested substitute, `None` when the slot stays uncovered.
    pub teacher: Option<String>,
    /// Every teacher eligible for this slot, sorted by name.
    pub candidates: Vec<String>,
}

impl SlotAssignment {
    pub fn is_covered(&self) -> bool {
        self.teacher.is_some()
    }
}

/// Result of evaluating an absence against the day's schedules.
///
/// Produced by [`allocate`](super::allocation::allocate); evaluating never
/// touches the workload counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AllocationResult {
    /// One teacher covers every slot of the requested range.
    FullBlock {
        teacher: String,
        slots: Vec<String>,
        candidates: Vec<String>,
    },
    /// Slot-by-slot suggestions, in slot order.
    IndividualSlots { slots: Vec<SlotAssignment> },
    /// Nobody holds a duty activity in any slot of the range.
    NoneAvailable,
    /// The start/end slots don't form a valid range of the catalog.
    InvalidRange,
}

impl AllocationResult {
    /// Whether someone outside the staff is needed to finish covering the absence.
    pub fn needs_external_staff(&self) -> bool {
        match self {
            AllocationResult::FullBlock { .. } => false,
            AllocationResult::IndividualSlots { slots } => slots.iter().any(|s| !s.is_covered()),
            AllocationResult::NoneAvailable => true,
            AllocationResult::InvalidRange => false,
        }
    }

    /// Number of slots the proposal would cover.
    pub fn covered_slot_count(&self) -> usize {
        match self {
            AllocationResult::FullBlock { slots, .. } => slots.len(),
            AllocationResult::IndividualSlots { slots } => slots.iter().filter(|s| s.is_covered()).count(),
            AllocationResult::NoneAvailable | AllocationResult::InvalidRange => 0,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AllocationResult::FullBlock { .. } => "full_block",
            AllocationResult::IndividualSlots { .. } => "individual_slots",
            AllocationResult::NoneAvailable => "none_available",
            AllocationResult::InvalidRange => "invalid_range",
        }
    }
}

impl fmt::Display for AllocationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}
