use std::cmp::Ordering;
use serde::{Serialize, Deserialize};

use crate::error::RangeError;

/// An atomic slot of the daily grid. Two slots compare by catalog position only.
#[derive(Debug, Clone, Serialize)]
pub struct Slot {
    pub position: usize,
    pub label: String,
}

impl PartialEq for Slot {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
    }
}

impl Eq for Slot {}

impl PartialOrd for Slot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Slot {
    fn cmp(&self, other: &Self) -> Ordering {
        self.position.cmp(&other.position)
    }
}

/// A break in the daily grid, as "HH:MM" bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakWindow {
    pub start: String,
    pub end: String,
}

impl BreakWindow {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// The ordered sequence of assignable slots for a working day.
///
/// Breaks are simply absent from the catalog, so a range can never contain one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotCatalog {
    labels: Vec<String>,
}

impl SlotCatalog {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds "HH:MM-HH:MM" slots of `interval_minutes` from `start` until `end`,
    /// leaving out every slot that overlaps a break.
    /// Returns None if a time fails to parse, `end` is not after `start`, or the
    /// interval is zero or longer than the whole day.
    pub fn from_grid(start: &str, end: &str, interval_minutes: u32, breaks: &[BreakWindow]) -> Option<Self> {
        let start_minutes = parse_time_to_minutes(start)?;
        let end_minutes = parse_time_to_minutes(end)?;
        if interval_minutes == 0 || end_minutes <= start_minutes || interval_minutes > end_minutes - start_minutes {
            return None;
        }

        let mut break_ranges = Vec::with_capacity(breaks.len());
        for window in breaks {
            let from = parse_time_to_minutes(&window.start)?;
            let to = parse_time_to_minutes(&window.end)?;
            break_ranges.push((from, to));
        }

        let mut labels = Vec::new();
        let mut current = start_minutes;
        while let Some(next) = current.checked_add(interval_minutes).filter(|&next| next <= end_minutes) {
            let overlaps_break = break_ranges.iter().any(|&(from, to)| current < to && from < next);
            if !overlaps_break {
                labels.push(format!("{}-{}", minutes_to_time_string(current), minutes_to_time_string(next)));
            }
            current = next;
        }

        Some(Self { labels })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn slot(&self, position: usize) -> Option<Slot> {
        self.labels.get(position).map(|label| Slot {
            position,
            label: label.clone(),
        })
    }

    /// First and last slot labels, used for whole-day absences.
    pub fn full_day(&self) -> Option<(&str, &str)> {
        Some((self.labels.first()?.as_str(), self.labels.last()?.as_str()))
    }

    /// See [`resolve_range`].
    pub fn resolve_range(&self, start: &str, end: &str) -> Result<Vec<Slot>, RangeError> {
        resolve_range(start, end, self)
    }
}

impl Default for SlotCatalog {
    /// Half-hour slots from 09:00 to 14:00 with the 11:00-11:30 break removed.
    fn default() -> Self {
        SlotCatalog::new([
            "09:00-09:30",
            "09:30-10:00",
            "10:00-10:30",
            "10:30-11:00",
            "11:30-12:00",
            "12:00-12:30",
            "12:30-13:00",
            "13:00-13:30",
            "13:30-14:00",
        ])
    }
}

/// Resolves `start..=end` against the catalog into the contiguous run of slots between them.
///
/// Fails when either label is unknown or `start` sits after `end`. A range that
/// crosses a break comes back shorter than its wall-clock span suggests.
pub fn resolve_range(start: &str, end: &str, catalog: &SlotCatalog) -> Result<Vec<Slot>, RangeError> {
    if catalog.is_empty() {
        return Err(RangeError::EmptyCatalog);
    }
    let from = catalog.position(start).ok_or_else(|| RangeError::UnknownSlot {
        label: start.to_string(),
    })?;
    let to = catalog.position(end).ok_or_else(|| RangeError::UnknownSlot {
        label: end.to_string(),
    })?;
    if from > to {
        return Err(RangeError::Reversed {
            start: start.to_string(),
            end: end.to_string(),
        });
    }

    Ok(catalog.labels[from..=to]
        .iter()
        .enumerate()
        .map(|(offset, label)| Slot {
            position: from + offset,
            label: label.clone(),
        })
        .collect())
}

/// Parses a time string (HH:MM) to minutes since midnight
pub fn parse_time_to_minutes(time_str: &str) -> Option<u32> {
    let parts: Vec<&str> = time_str.trim().split(':').collect();
    if parts.len() != 2 {
        return None;
    }
    let hours: u32 = parts[0].parse().ok()?;
    let minutes: u32 = parts[1].parse().ok()?;
    if hours >= 24 || minutes >= 60 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Formats minutes since midnight to time string (HH:MM)
pub fn minutes_to_time_string(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    format!("{:02}:{:02}", hours % 24, mins)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(slots: &[Slot]) -> Vec<&str> {
        slots.iter().map(|s| s.label.as_str()).collect()
    }

    #[test]
    fn test_single_slot_range() {
        let catalog = SlotCatalog::default();
        let range = resolve_range("10:00-10:30", "10:00-10:30", &catalog).unwrap();
        assert_eq!(labels(&range), vec!["10:00-10:30"]);
        assert_eq!(range[0].position, 2);
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        let catalog = SlotCatalog::default();
        let err = resolve_range("12:00-12:30", "09:00-09:30", &catalog).unwrap_err();
        assert!(matches!(err, RangeError::Reversed { .. }));
    }

    #[test]
    fn test_unknown_slot_is_rejected() {
        let catalog = SlotCatalog::default();
        assert_eq!(
            resolve_range("11:00-11:30", "12:00-12:30", &catalog),
            Err(RangeError::UnknownSlot { label: "11:00-11:30".to_string() })
        );
        assert!(resolve_range("09:00-09:30", "nonsense", &catalog).is_err());
        assert_eq!(
            resolve_range("09:00-09:30", "09:00-09:30", &SlotCatalog::new(Vec::<String>::new())),
            Err(RangeError::EmptyCatalog)
        );
    }

    #[test]
    fn test_range_across_break_skips_it() {
        let catalog = SlotCatalog::default();
        let range = catalog.resolve_range("10:30-11:00", "11:30-12:00").unwrap();
        assert_eq!(labels(&range), vec!["10:30-11:00", "11:30-12:00"]);
    }

    #[test]
    fn test_slots_order_by_position() {
        let catalog = SlotCatalog::new(["b", "a"]);
        let first = catalog.slot(0).unwrap();
        let second = catalog.slot(1).unwrap();
        assert!(first < second);
        assert_ne!(first, second);
        assert!(catalog.slot(2).is_none());
    }

    #[test]
    fn test_grid_builder_matches_default() {
        let built = SlotCatalog::from_grid("09:00", "14:00", 30, &[BreakWindow::new("11:00", "11:30")]).unwrap();
        assert_eq!(built, SlotCatalog::default());
        assert_eq!(built.full_day(), Some(("09:00-09:30", "13:30-14:00")));
    }

    #[test]
    fn test_grid_builder_rejects_bad_input() {
        assert!(SlotCatalog::from_grid("14:00", "09:00", 30, &[]).is_none());
        assert!(SlotCatalog::from_grid("09:00", "14:00", 0, &[]).is_none());
        assert!(SlotCatalog::from_grid("09:00", "14:00", 301, &[]).is_none());
        assert!(SlotCatalog::from_grid("09:00", "14:00", u32::MAX, &[]).is_none());
        assert!(SlotCatalog::from_grid("9am", "14:00", 30, &[]).is_none());
        assert!(SlotCatalog::from_grid("09:00", "14:00", 30, &[BreakWindow::new("11", "11:30")]).is_none());
    }

    #[test]
    fn test_hourly_grid() {
        let built = SlotCatalog::from_grid("08:00", "11:00", 60, &[]).unwrap();
        assert_eq!(built.labels(), &["08:00-09:00", "09:00-10:00", "10:00-11:00"]);
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time_to_minutes("09:30"), Some(570));
        assert_eq!(parse_time_to_minutes("24:00"), None);
        assert_eq!(parse_time_to_minutes("09"), None);
        assert_eq!(minutes_to_time_string(570), "09:30");
    }
}
