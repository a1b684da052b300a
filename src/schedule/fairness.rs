use crate::ledger::WorkloadCounters;

/// Picks the candidate with the fewest committed substitutions.
///
/// Ties go to the lexicographically smallest name, so the outcome does not
/// depend on the order candidates arrive in. Returns None for no candidates.
pub fn select<I, S>(candidates: I, counters: &WorkloadCounters) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    candidates
        .into_iter()
        .map(|name| {
            let name = name.as_ref();
            (counters.get(name), name.to_string())
        })
        .min()
        .map(|(_, name)| name)
}
