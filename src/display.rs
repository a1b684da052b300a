use crate::ledger::{CommitSummary, HistoryRecord, WorkloadCounters};
use crate::schedule::{AbsenceRequest, AllocationResult};

/// Joins slot labels for display
pub fn format_slot_list(slots: &[String]) -> String {
    slots.join(", ")
}

/// Formats a teacher name with their current workload
pub fn format_teacher(name: &str, counters: &WorkloadCounters) -> String {
    format!("{} ({} sustituciones)", name, counters.get(name))
}

/// Renders a proposal as printable lines
pub fn proposal_lines(request: &AbsenceRequest, result: &AllocationResult, counters: &WorkloadCounters) -> Vec<String> {
    let mut lines = vec![format!(
        "Absence of {} on {} ({} -> {})",
        request.absent_teacher, request.day, request.start, request.end
    )];

    match result {
        AllocationResult::FullBlock { teacher, slots, candidates } => {
            lines.push(format!("Full block: {}", format_teacher(teacher, counters)));
            lines.push(format!("  Covers: {} ({} slot(s))", format_slot_list(slots), slots.len()));
            if candidates.len() > 1 {
                let others: Vec<String> = candidates
                    .iter()
                    .filter(|c| *c != teacher)
                    .map(|c| format_teacher(c, counters))
                    .collect();
                lines.push(format!("  Also available: {}", others.join(", ")));
            }
        }
        AllocationResult::IndividualSlots { slots } => {
            lines.push("No single teacher covers the whole block, slot by slot:".to_string());
            for assignment in slots {
                match &assignment.teacher {
                    Some(teacher) => lines.push(format!(
                        "  {} -> {} [candidates: {}]",
                        assignment.slot,
                        format_teacher(teacher, counters),
                        assignment.candidates.join(", ")
                    )),
                    None => lines.push(format!("  {} -> [UNCOVERED]", assignment.slot)),
                }
            }
        }
        AllocationResult::NoneAvailable => {
            lines.push("No teacher on duty in any requested slot.".to_string());
        }
        AllocationResult::InvalidRange => {
            lines.push("Invalid slot range.".to_string());
        }
    }

    if result.needs_external_staff() {
        lines.push("External staff needed for uncovered slots.".to_string());
    }
    lines
}

/// Prints a proposal in a readable format
pub fn print_proposal(request: &AbsenceRequest, result: &AllocationResult, counters: &WorkloadCounters) {
    println!("\n=== Substitution proposal ===");
    for line in proposal_lines(request, result, counters) {
        println!("{}", line);
    }
}

pub fn print_commit_summary(summary: &CommitSummary) {
    if summary.is_empty() {
        println!("No substitution assigned.");
        return;
    }
    println!("\n=== Assigned ({} slot(s)) ===", summary.slots_assigned);
    for record in &summary.records {
        println!(
            "- {} covers {} for {} on {} ({})",
            record.substitute,
            format_slot_list(&record.slots),
            record.absent_teacher,
            record.day,
            record.date
        );
    }
}

/// Prints counters, busiest teacher first
pub fn print_counts(counters: &WorkloadCounters) {
    println!("\n=== Substitution counts ===");
    if counters.is_empty() {
        println!("No substitutions recorded yet.");
        return;
    }
    for (name, count) in counters.ranked() {
        println!("  {:<30} {}", name, count);
    }
}

pub fn print_history(history: &[HistoryRecord]) {
    println!("\n=== Substitution history ===");
    if history.is_empty() {
        println!("No substitutions recorded yet.");
        return;
    }
    for record in history {
        println!(
            "  {} | {} {} | {} for {} | {}",
            record.timestamp,
            record.date,
            record.day,
            record.substitute,
            record.absent_teacher,
            format_slot_list(&record.slots)
        );
    }
}
