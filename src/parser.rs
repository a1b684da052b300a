use csv::Reader;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::schedule::{Activity, ActivityKind, TeacherSchedule};

/// Finds a column whose header contains any of `keys` (case-insensitive),
/// falling back to `default` when nothing matches
fn find_column(headers: &csv::StringRecord, keys: &[&str], default: usize) -> usize {
    headers
        .iter()
        .position(|h| {
            let h = h.trim().to_lowercase();
            keys.iter().any(|k| h.contains(k))
        })
        .unwrap_or(default)
}

/// Loads teacher schedules from a CSV file with one activity per row:
/// teacher, day, time slot, subject, activity type.
///
/// Columns are located by header name (English or Spanish), falling back to
/// that order. Rows missing the teacher or slot are skipped; rows for the same
/// teacher are merged. Teachers come back sorted by name.
pub fn load_schedules_csv<P: AsRef<Path>>(csv_path: P) -> Result<Vec<TeacherSchedule>, StoreError> {
    let reader = Reader::from_path(csv_path)?;
    read_schedules(reader)
}

/// Same as [`load_schedules_csv`], reading from any source
pub fn parse_schedules_csv<R: Read>(source: R) -> Result<Vec<TeacherSchedule>, StoreError> {
    read_schedules(Reader::from_reader(source))
}

fn read_schedules<R: Read>(mut reader: Reader<R>) -> Result<Vec<TeacherSchedule>, StoreError> {
    let headers = reader.headers()?.clone();

    let teacher_col = find_column(&headers, &["teacher", "profesor", "docente"], 0);
    let day_col = find_column(&headers, &["day", "dia", "día"], 1);
    let time_col = find_column(&headers, &["time", "slot", "franja", "hora"], 2);
    let subject_col = find_column(&headers, &["subject", "asignatura", "materia"], 3);
    let type_col = find_column(&headers, &["type", "tipo", "kind"], 4);

    let mut by_teacher: BTreeMap<String, TeacherSchedule> = BTreeMap::new();
    let mut skipped = 0usize;

    for result in reader.records() {
        let record = result?;

        let teacher = record.get(teacher_col).unwrap_or("").trim().to_string();
        let day = record.get(day_col).unwrap_or("").trim().to_string();
        let time = record.get(time_col).unwrap_or("").trim().to_string();

        // Skip if essential fields are missing
        if teacher.is_empty() || day.is_empty() || time.is_empty() {
            skipped += 1;
            continue;
        }

        let subject = record.get(subject_col).unwrap_or("").trim().to_string();
        let kind = ActivityKind::from_label(record.get(type_col).unwrap_or(""));

        by_teacher
            .entry(teacher.clone())
            .or_insert_with(|| TeacherSchedule::new(teacher))
            .schedule
            .entry(day)
            .or_default()
            .push(Activity::new(time, subject, kind));
    }

    if skipped > 0 {
        warn!(skipped, "skipped schedule rows missing teacher, day or slot");
    }
    debug!(teachers = by_teacher.len(), "parsed schedule csv");

    Ok(by_teacher.into_values().collect())
}
