use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use tracing::warn;

/// Committed substitutions per teacher. Missing names count as zero.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkloadCounters {
    counts: BTreeMap<String, u32>,
}

impl WorkloadCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> u32 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    /// Adds one unit of workload to `name`.
    ///
    /// Empty names are rejected without creating an entry; returns whether the
    /// counter changed.
    pub fn increment(&mut self, name: &str) -> bool {
        if name.trim().is_empty() {
            warn!("ignoring workload increment for an empty teacher name");
            return false;
        }
        *self.counts.entry(name.to_string()).or_insert(0) += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(name, count)| (name.as_str(), *count))
    }

    /// Counters ordered by count descending, then name ascending
    pub fn ranked(&self) -> Vec<(String, u32)> {
        let mut ranked: Vec<(String, u32)> = self.counts.iter().map(|(n, c)| (n.clone(), *c)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for WorkloadCounters {
    fn from_iter<T: IntoIterator<Item = (S, u32)>>(iter: T) -> Self {
        let mut counts = BTreeMap::new();
        for (name, count) in iter {
            let name = name.into();
            if name.trim().is_empty() {
                continue;
            }
            counts.insert(name, count);
        }
        Self { counts }
    }
}
