use serde::{Serialize, Deserialize};

/// A committed assignment of one substitute to part (or all) of an absence.
/// Written once, never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub timestamp: String,
    pub substitute: String,
    pub absent_teacher: String,
    pub day: String,
    pub date: String,
    pub slots: Vec<String>,
    pub slot_count: usize,
}

impl HistoryRecord {
    pub fn new(
        timestamp: impl Into<String>,
        substitute: impl Into<String>,
        absent_teacher: impl Into<String>,
        day: impl Into<String>,
        date: impl Into<String>,
        slots: Vec<String>,
    ) -> Self {
        let slot_count = slots.len();
        Self {
            timestamp: timestamp.into(),
            substitute: substitute.into(),
            absent_teacher: absent_teacher.into(),
            day: day.into(),
            date: date.into(),
            slots,
            slot_count,
        }
    }
}
