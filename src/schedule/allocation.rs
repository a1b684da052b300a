use tracing::debug;

use crate::ledger::WorkloadCounters;
use super::availability::{eligible_teachers_for_slot, is_on_duty};
use super::fairness::select;
use super::slot_utils::{resolve_range, Slot, SlotCatalog};
use super::types::{AbsenceRequest, AllocationResult, SlotAssignment, TeacherSchedule};

/// Works out who should cover `start..=end` on `day`.
///
/// One teacher free for the whole block is always preferred; only when nobody
/// is does each slot get its own pick, and the same teacher may win several
/// slots. The counters only rank teachers who are already eligible.
pub fn allocate(
    schedules: &[TeacherSchedule],
    day: &str,
    start: &str,
    end: &str,
    catalog: &SlotCatalog,
    counters: &WorkloadCounters,
) -> AllocationResult {
    let slots = match resolve_range(start, end, catalog) {
        Ok(slots) => slots,
        Err(err) => {
            debug!(%err, start, end, "rejecting slot range");
            return AllocationResult::InvalidRange;
        }
    };

    let full_block = full_block_candidates(schedules, day, &slots);
    if let Some(teacher) = select(&full_block, counters) {
        debug!(teacher = %teacher, candidates = full_block.len(), slots = slots.len(), "full block assignment");
        return AllocationResult::FullBlock {
            teacher,
            slots: slots.into_iter().map(|s| s.label).collect(),
            candidates: full_block,
        };
    }

    let assignments: Vec<SlotAssignment> = slots
        .into_iter()
        .map(|slot| {
            let eligible = eligible_teachers_for_slot(schedules, day, &slot.label);
            let teacher = select(&eligible, counters);
            SlotAssignment {
                slot: slot.label,
                teacher,
                candidates: eligible.into_iter().collect(),
            }
        })
        .collect();

    let covered = assignments.iter().filter(|a| a.is_covered()).count();
    if covered == 0 {
        debug!(day, start, end, "no duty teacher in any slot");
        return AllocationResult::NoneAvailable;
    }

    debug!(covered, total = assignments.len(), "per-slot assignment");
    AllocationResult::IndividualSlots { slots: assignments }
}

/// Like [`allocate`], leaving the absent teacher out of the candidate pool.
pub fn plan_absence(
    schedules: &[TeacherSchedule],
    request: &AbsenceRequest,
    catalog: &SlotCatalog,
    counters: &WorkloadCounters,
) -> AllocationResult {
    let others: Vec<TeacherSchedule> = schedules
        .iter()
        .filter(|t| t.teacher_name != request.absent_teacher)
        .cloned()
        .collect();
    allocate(&others, &request.day, &request.start, &request.end, catalog, counters)
}

/// Teachers on duty in every one of `slots`, sorted and deduplicated.
fn full_block_candidates(schedules: &[TeacherSchedule], day: &str, slots: &[Slot]) -> Vec<String> {
    let mut candidates: Vec<String> = schedules
        .iter()
        .filter(|t| !t.teacher_name.trim().is_empty())
        .filter(|t| slots.iter().all(|slot| is_on_duty(t, day, &slot.label)))
        .map(|t| t.teacher_name.clone())
        .collect();
    candidates.sort();
    candidates.dedup();
    candidates
}
