//! The per-upstream pending work item and its priority ordering (§9).

use crate::models::request::{DispatchOutcome, ProxyRequest};
use std::cmp::Ordering;
use tokio::sync::oneshot;

/// One call waiting to be dispatched. `priority` and `sequence` are the
/// only fields that participate in ordering — `request` and `respond_to`
/// ride along uncompared, mirroring a `(priority, sequence, payload)`
/// tuple with the payload excluded from comparison.
pub struct WorkItem {
    pub priority: i64,
    pub sequence: u64,
    pub request: ProxyRequest,
    pub respond_to: oneshot::Sender<DispatchOutcome>,
}

impl PartialEq for WorkItem {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}

impl Eq for WorkItem {}

impl PartialOrd for WorkItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WorkItem {
    /// Reversed so a `BinaryHeap` (a max-heap) pops the item with the
    /// smallest `(priority, sequence)` first — a min-heap by value.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    fn item(priority: i64, sequence: u64) -> WorkItem {
        let (tx, _rx) = oneshot::channel();
        WorkItem {
            priority,
            sequence,
            request: ProxyRequest::default(),
            respond_to: tx,
        }
    }

    #[test]
    fn heap_pops_lowest_priority_first() {
        let mut heap = BinaryHeap::new();
        heap.push(item(5, 0));
        heap.push(item(0, 1));
        heap.push(item(2, 2));
        assert_eq!(heap.pop().unwrap().priority, 0);
        assert_eq!(heap.pop().unwrap().priority, 2);
        assert_eq!(heap.pop().unwrap().priority, 5);
    }

    #[test]
    fn ties_break_by_sequence_fifo() {
        let mut heap = BinaryHeap::new();
        heap.push(item(0, 2));
        heap.push(item(0, 0));
        heap.push(item(0, 1));
        assert_eq!(heap.pop().unwrap().sequence, 0);
        assert_eq!(heap.pop().unwrap().sequence, 1);
        assert_eq!(heap.pop().unwrap().sequence, 2);
    }
}
