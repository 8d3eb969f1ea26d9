//! Process-wide failure accounting (`spec.md` §3 "FailureTable", §4.2
//! eviction policy, §8 property 1).
use crate::node::ServiceNode;
use parking_lot::Mutex;
use std::collections::HashMap;

pub struct FailureTable {
    counts: Mutex<HashMap<ServiceNode, u32>>,
    threshold: u32,
}

impl FailureTable {
    pub fn new(threshold: u32) -> Self {
        Self {
            counts: Mutex::new(HashMap::new()),
            threshold,
        }
    }

    pub fn count_for(&self, target: &ServiceNode) -> u32 {
        self.counts.lock().get(target).copied().unwrap_or(0)
    }

    /// Increments the failure count for `target` and reports whether it has
    /// now reached the eviction threshold. Callers evict and then call
    /// `reset` — the table itself never evicts from the swarm cache or
    /// random pool, since it has no reference to either.
    pub fn record_failure(&self, target: &ServiceNode) -> bool {
        let mut guard = self.counts.lock();
        let count = guard.entry(target.clone()).or_insert(0);
        *count += 1;
        *count >= self.threshold
    }

    pub fn reset(&self, target: &ServiceNode) {
        self.counts.lock().insert(target.clone(), 0);
    }
}

impl Default for FailureTable {
    fn default() -> Self {
        Self::new(crate::config::FAILURE_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaches_threshold_after_two_consecutive_failures() {
        let table = FailureTable::new(2);
        let target = ServiceNode::new("https://1.2.3.4", 80);

        assert!(!table.record_failure(&target));
        assert_eq!(table.count_for(&target), 1);

        assert!(table.record_failure(&target));
        assert_eq!(table.count_for(&target), 2);

        table.reset(&target);
        assert_eq!(table.count_for(&target), 0);
    }
}
