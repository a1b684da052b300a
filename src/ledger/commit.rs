use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDateTime;
use serde::{Serialize, Deserialize};
use tracing::{info, warn};

use crate::error::CommitError;
use crate::schedule::{resolve_range, AbsenceRequest, AllocationResult, SlotCatalog};
use super::{HistoryRecord, WorkloadLedger};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A confirmer's choice for one slot; `None` leaves it unassigned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotChoice {
    pub slot: String,
    pub teacher: Option<String>,
}

/// What a human accepted after reviewing an [`AllocationResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Confirmation {
    /// `teacher` covers the whole requested range.
    FullBlock { teacher: String },
    IndividualSlots { assignments: Vec<SlotChoice> },
}

impl Confirmation {
    /// The confirmation that accepts every suggestion in `result` as proposed.
    /// Returns None when there is nothing to accept.
    pub fn accept(result: &AllocationResult) -> Option<Self> {
        match result {
            AllocationResult::FullBlock { teacher, .. } => Some(Confirmation::FullBlock {
                teacher: teacher.clone(),
            }),
            AllocationResult::IndividualSlots { slots } => Some(Confirmation::IndividualSlots {
                assignments: slots
                    .iter()
                    .map(|s| SlotChoice {
                        slot: s.slot.clone(),
                        teacher: s.teacher.clone(),
                    })
                    .collect(),
            }),
            AllocationResult::NoneAvailable | AllocationResult::InvalidRange => None,
        }
    }
}

/// What [`commit`] wrote to the ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub records: Vec<HistoryRecord>,
    pub slots_assigned: usize,
}

impl CommitSummary {
    pub fn is_empty(&self) -> bool {
        self.slots_assigned == 0
    }
}

/// Applies a confirmed assignment to the ledger.
///
/// Each covered slot is one unit of workload, so a teacher covering K slots is
/// incremented K times. Afterwards one history record is appended per distinct
/// substitute, listing their slots in catalog order. Slots confirmed without a
/// teacher (or with an empty name) are skipped. Nothing is written if the
/// confirmation is rejected.
pub fn commit<L: WorkloadLedger + ?Sized>(
    ledger: &mut L,
    request: &AbsenceRequest,
    date: &str,
    confirmation: &Confirmation,
    catalog: &SlotCatalog,
    now: NaiveDateTime,
) -> Result<CommitSummary, CommitError> {
    let range = resolve_range(&request.start, &request.end, catalog)?;

    // teacher -> slot positions they cover
    let mut by_teacher: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    match confirmation {
        Confirmation::FullBlock { teacher } => {
            let teacher = teacher.trim();
            if teacher.is_empty() {
                warn!(absent = %request.absent_teacher, "full block confirmed without a substitute");
            } else {
                by_teacher.insert(teacher.to_string(), range.iter().map(|s| s.position).collect());
            }
        }
        Confirmation::IndividualSlots { assignments } => {
            let mut seen = HashSet::new();
            for choice in assignments {
                let slot = range
                    .iter()
                    .find(|s| s.label == choice.slot)
                    .ok_or_else(|| CommitError::SlotOutsideRange {
                        slot: choice.slot.clone(),
                    })?;
                if !seen.insert(slot.position) {
                    return Err(CommitError::DuplicateSlot {
                        slot: choice.slot.clone(),
                    });
                }
                match choice.teacher.as_deref().map(str::trim) {
                    Some(name) if !name.is_empty() => {
                        by_teacher.entry(name.to_string()).or_default().push(slot.position);
                    }
                    _ => {}
                }
            }
        }
    }

    let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
    let mut summary = CommitSummary::default();
    for (teacher, mut positions) in by_teacher {
        positions.sort_unstable();
        for _ in &positions {
            if ledger.increment(&teacher) {
                summary.slots_assigned += 1;
            }
        }
        let slots: Vec<String> = positions
            .iter()
            .filter_map(|&p| catalog.slot(p).map(|s| s.label))
            .collect();
        let record = HistoryRecord::new(
            timestamp.clone(),
            teacher,
            request.absent_teacher.clone(),
            request.day.clone(),
            date,
            slots,
        );
        info!(
            substitute = %record.substitute,
            absent = %record.absent_teacher,
            slots = record.slot_count,
            "substitution committed"
        );
        ledger.record_history(record.clone());
        summary.records.push(record);
    }

    if summary.is_empty() {
        info!(absent = %request.absent_teacher, day = %request.day, "no substitution assigned");
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::ledger::{InMemoryLedger, WorkloadCounters};
    use crate::schedule::SlotAssignment;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .and_then(|d| d.and_hms_opt(8, 15, 0))
            .unwrap()
    }

    fn request(start: &str, end: &str) -> AbsenceRequest {
        AbsenceRequest::new("Ausente", "Lunes", start, end)
    }

    #[test]
    fn test_full_block_counts_every_slot() {
        let mut ledger = InMemoryLedger::new(WorkloadCounters::from_iter([("Y", 2)]), Vec::new());
        let confirmation = Confirmation::FullBlock { teacher: "Y".to_string() };
        let summary = commit(
            &mut ledger,
            &request("09:00-09:30", "10:00-10:30"),
            "2026-10-19",
            &confirmation,
            &SlotCatalog::default(),
            now(),
        )
        .unwrap();

        assert_eq!(ledger.counters().get("Y"), 5);
        assert_eq!(summary.slots_assigned, 3);
        assert_eq!(ledger.history().len(), 1);
        let record = &ledger.history()[0];
        assert_eq!(record.slots, vec!["09:00-09:30", "09:30-10:00", "10:00-10:30"]);
        assert_eq!(record.slot_count, 3);
        assert_eq!(record.timestamp, "2026-10-19T08:15:00");
        assert_eq!(record.date, "2026-10-19");
    }

    #[test]
    fn test_individual_slots_group_by_teacher() {
        let mut ledger = InMemoryLedger::default();
        let confirmation = Confirmation::IndividualSlots {
            assignments: vec![
                SlotChoice { slot: "10:00-10:30".into(), teacher: Some("A".into()) },
                SlotChoice { slot: "09:00-09:30".into(), teacher: Some("A".into()) },
                SlotChoice { slot: "09:30-10:00".into(), teacher: Some("B".into()) },
                SlotChoice { slot: "10:30-11:00".into(), teacher: None },
            ],
        };
        let summary = commit(
            &mut ledger,
            &request("09:00-09:30", "10:30-11:00"),
            "2026-10-19",
            &confirmation,
            &SlotCatalog::default(),
            now(),
        )
        .unwrap();

        assert_eq!(summary.slots_assigned, 3);
        assert_eq!(ledger.counters().get("A"), 2);
        assert_eq!(ledger.counters().get("B"), 1);
        let history = ledger.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].substitute, "A");
        assert_eq!(history[0].slots, vec!["09:00-09:30", "10:00-10:30"]);
        assert_eq!(history[1].substitute, "B");
    }

    #[test]
    fn test_nothing_assigned_writes_nothing() {
        let mut ledger = InMemoryLedger::default();
        let confirmation = Confirmation::IndividualSlots {
            assignments: vec![SlotChoice { slot: "09:00-09:30".into(), teacher: Some("  ".into()) }],
        };
        let summary = commit(
            &mut ledger,
            &request("09:00-09:30", "09:00-09:30"),
            "2026-10-19",
            &confirmation,
            &SlotCatalog::default(),
            now(),
        )
        .unwrap();
        assert!(summary.is_empty());
        assert!(ledger.counters().is_empty());
        assert!(ledger.history().is_empty());

        let empty_block = Confirmation::FullBlock { teacher: String::new() };
        let summary = commit(
            &mut ledger,
            &request("09:00-09:30", "09:00-09:30"),
            "2026-10-19",
            &empty_block,
            &SlotCatalog::default(),
            now(),
        )
        .unwrap();
        assert!(summary.is_empty());
        assert!(ledger.counters().is_empty());
    }

    #[test]
    fn test_rejected_confirmation_leaves_ledger_untouched() {
        let mut ledger = InMemoryLedger::default();
        let outside = Confirmation::IndividualSlots {
            assignments: vec![
                SlotChoice { slot: "09:00-09:30".into(), teacher: Some("A".into()) },
                SlotChoice { slot: "13:30-14:00".into(), teacher: Some("A".into()) },
            ],
        };
        let err = commit(
            &mut ledger,
            &request("09:00-09:30", "09:30-10:00"),
            "2026-10-19",
            &outside,
            &SlotCatalog::default(),
            now(),
        )
        .unwrap_err();
        assert_eq!(err, CommitError::SlotOutsideRange { slot: "13:30-14:00".into() });

        let twice = Confirmation::IndividualSlots {
            assignments: vec![
                SlotChoice { slot: "09:00-09:30".into(), teacher: Some("A".into()) },
                SlotChoice { slot: "09:00-09:30".into(), teacher: Some("B".into()) },
            ],
        };
        let err = commit(
            &mut ledger,
            &request("09:00-09:30", "09:30-10:00"),
            "2026-10-19",
            &twice,
            &SlotCatalog::default(),
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, CommitError::DuplicateSlot { .. }));

        let reversed = commit(
            &mut ledger,
            &request("10:00-10:30", "09:00-09:30"),
            "2026-10-19",
            &Confirmation::FullBlock { teacher: "A".into() },
            &SlotCatalog::default(),
            now(),
        );
        assert!(matches!(reversed, Err(CommitError::Range(_))));

        assert!(ledger.counters().is_empty());
        assert!(ledger.history().is_empty());
    }

    #[test]
    fn test_confirmed_names_are_trimmed() {
        let mut ledger = InMemoryLedger::new(WorkloadCounters::from_iter([("Y", 1)]), Vec::new());
        commit(
            &mut ledger,
            &request("09:00-09:30", "09:30-10:00"),
            "2026-10-19",
            &Confirmation::FullBlock { teacher: " Y ".into() },
            &SlotCatalog::default(),
            now(),
        )
        .unwrap();
        commit(
            &mut ledger,
            &request("10:00-10:30", "10:00-10:30"),
            "2026-10-19",
            &Confirmation::IndividualSlots {
                assignments: vec![SlotChoice { slot: "10:00-10:30".into(), teacher: Some("Y  ".into()) }],
            },
            &SlotCatalog::default(),
            now(),
        )
        .unwrap();

        assert_eq!(ledger.counters().get("Y"), 4);
        assert_eq!(ledger.counters().len(), 1);
        assert!(ledger.history().iter().all(|h| h.substitute == "Y"));
    }

    #[test]
    fn test_accept_mirrors_proposal() {
        let proposal = AllocationResult::IndividualSlots {
            slots: vec![
                SlotAssignment { slot: "09:00-09:30".into(), teacher: Some("A".into()), candidates: vec!["A".into()] },
                SlotAssignment { slot: "09:30-10:00".into(), teacher: None, candidates: Vec::new() },
            ],
        };
        let Some(Confirmation::IndividualSlots { assignments }) = Confirmation::accept(&proposal) else {
            panic!("expected per-slot confirmation");
        };
        assert_eq!(assignments.len(), 2);
        assert_eq!(assignments[1].teacher, None);
        assert!(Confirmation::accept(&AllocationResult::NoneAvailable).is_none());
    }
}
