//! Workload bookkeeping: per-teacher counters plus the append-only history of
//! committed substitutions.
//!
//! Evaluation never writes here. Only [`commit`] does, after a proposal has
//! been confirmed.

pub mod counters;
pub mod history;
pub mod commit;

pub use counters::WorkloadCounters;
pub use history::HistoryRecord;
pub use commit::{commit, CommitSummary, Confirmation, SlotChoice};

/// Storage-agnostic ledger interface.
///
/// Implementations that are shared between requests must serialize calls to
/// `increment`; the read-modify-write is not atomic on its own.
pub trait WorkloadLedger {
    fn counters(&self) -> &WorkloadCounters;

    /// One unit of workload for `name`. Empty names are ignored; returns whether anything changed.
    fn increment(&mut self, name: &str) -> bool;

    fn record_history(&mut self, entry: HistoryRecord);

    fn history(&self) -> &[HistoryRecord];
}

/// Ledger held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    counters: WorkloadCounters,
    history: Vec<HistoryRecord>,
}

impl InMemoryLedger {
    pub fn new(counters: WorkloadCounters, history: Vec<HistoryRecord>) -> Self {
        Self { counters, history }
    }
}

impl WorkloadLedger for InMemoryLedger {
    fn counters(&self) -> &WorkloadCounters {
        &self.counters
    }

    fn increment(&mut self, name: &str) -> bool {
        self.counters.increment(name)
    }

    fn record_history(&mut self, entry: HistoryRecord) {
        self.history.push(entry);
    }

    fn history(&self) -> &[HistoryRecord] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_append_only() {
        let mut ledger = InMemoryLedger::default();
        ledger.record_history(HistoryRecord::new("t1", "A", "Z", "Lunes", "2026-10-19", vec!["09:00-09:30".into()]));
        ledger.record_history(HistoryRecord::new("t2", "B", "Z", "Lunes", "2026-10-19", vec!["09:30-10:00".into()]));
        let subs: Vec<&str> = ledger.history().iter().map(|h| h.substitute.as_str()).collect();
        assert_eq!(subs, vec!["A", "B"]);
        assert_eq!(ledger.history()[0].slot_count, 1);
    }

    #[test]
    fn test_increment_through_trait() {
        let mut ledger = InMemoryLedger::default();
        assert!(ledger.increment("A"));
        assert!(!ledger.increment(""));
        assert_eq!(ledger.counters().get("A"), 1);
        assert_eq!(ledger.counters().len(), 1);
    }
}
