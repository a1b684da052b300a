use std::collections::BTreeSet;

use super::types::TeacherSchedule;

/// Whether `teacher` holds a duty activity in `slot` on `day`.
pub fn is_on_duty(teacher: &TeacherSchedule, day: &str, slot: &str) -> bool {
    teacher
        .activities_on(day)
        .iter()
        .any(|activity| activity.is_duty() && activity.time == slot)
}

/// Teachers holding a duty activity in exactly `slot` on `day`.
///
/// Each name appears once no matter how many qualifying activities it holds.
/// Teachers without a name or without activities that day contribute nothing.
pub fn eligible_teachers_for_slot(schedules: &[TeacherSchedule], day: &str, slot: &str) -> BTreeSet<String> {
    schedules
        .iter()
        .filter(|t| !t.teacher_name.trim().is_empty())
        .filter(|t| is_on_duty(t, day, slot))
        .map(|t| t.teacher_name.clone())
        .collect()
}
