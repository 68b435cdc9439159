//! Fair priority heap.
//!
//! A binary max-heap of jobs ordered by (priority descending, creation
//! time ascending): the highest numeric priority pops first, and jobs
//! within the same priority band pop in enqueue order, so a stream of
//! high-priority arrivals cannot starve earlier peers in their own band.
//! A per-band counter is maintained for observability; it never affects
//! ordering.

use parking_lot::Mutex;
use std::collections::HashMap;

use crate::job::Job;

struct HeapState<T> {
    items: Vec<Job<T>>,
    /// Live job count per priority band
    fairness: HashMap<i32, usize>,
}

impl<T> HeapState<T> {
    /// True when the job at `child` outranks the job at `parent`.
    fn outranks(&self, parent: usize, child: usize) -> bool {
        let parent_job = &self.items[parent];
        let child_job = &self.items[child];

        if parent_job.priority != child_job.priority {
            return child_job.priority > parent_job.priority;
        }
        // Same band: earlier enqueue wins. Unset timestamps sort first,
        // which never occurs once the pool has stamped the batch.
        parent_job.created > child_job.created
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.outranks(parent, index) {
                self.items.swap(parent, index);
                index = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        loop {
            let left = 2 * index + 1;
            let right = 2 * index + 2;
            let mut best = index;

            if left < self.items.len() && self.outranks(best, left) {
                best = left;
            }
            if right < self.items.len() && self.outranks(best, right) {
                best = right;
            }
            if best == index {
                break;
            }
            self.items.swap(index, best);
            index = best;
        }
    }
}

/// A priority queue of [`Job`]s with FIFO fairness within a band.
///
/// Under the priority strategy only the dispatcher touches the queue, but
/// the structure is safe to share (`&self` methods behind a lock) so it
/// can be reused wherever a concurrent priority queue is called for.
pub struct PriorityQueue<T> {
    inner: Mutex<HeapState<T>>,
}

impl<T> PriorityQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HeapState {
                items: Vec::new(),
                fairness: HashMap::new(),
            }),
        }
    }

    /// Insert a job.
    pub fn push(&self, job: Job<T>) {
        let mut state = self.inner.lock();
        *state.fairness.entry(job.priority).or_insert(0) += 1;
        state.items.push(job);
        let last = state.items.len() - 1;
        state.sift_up(last);
    }

    /// Remove and return the highest-priority job, oldest first within a
    /// band.
    pub fn pop(&self) -> Option<Job<T>> {
        let mut state = self.inner.lock();
        if state.items.is_empty() {
            return None;
        }

        let last = state.items.len() - 1;
        state.items.swap(0, last);
        let job = state.items.pop().expect("non-empty checked above");
        if !state.items.is_empty() {
            state.sift_down(0);
        }

        if let Some(count) = state.fairness.get_mut(&job.priority) {
            *count = count.saturating_sub(1);
        }
        Some(job)
    }

    /// Number of jobs queued.
    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    /// Returns true when no jobs are queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of live job counts per priority band.
    pub fn fairness_stats(&self) -> HashMap<i32, usize> {
        self.inner.lock().fairness.clone()
    }
}

impl<T: Clone> PriorityQueue<T> {
    /// Return the highest-priority job without removing it.
    pub fn peek(&self) -> Option<Job<T>> {
        self.inner.lock().items.first().cloned()
    }
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn job(id: &str, priority: i32, tick: i64) -> Job<&'static str> {
        Job::new(id.to_string(), "payload")
            .with_priority(priority)
            .with_created(Utc.timestamp_opt(tick, 0).unwrap())
    }

    #[test]
    fn pops_highest_priority_first() {
        let queue = PriorityQueue::new();
        queue.push(job("low", 1, 1));
        queue.push(job("high", 10, 2));
        queue.push(job("medium", 5, 3));

        assert_eq!(queue.pop().unwrap().id, "high");
        assert_eq!(queue.pop().unwrap().id, "medium");
        assert_eq!(queue.pop().unwrap().id, "low");
        assert!(queue.pop().is_none());
    }

    #[test]
    fn equal_priority_pops_in_enqueue_order() {
        let queue = PriorityQueue::new();
        queue.push(job("third", 5, 30));
        queue.push(job("first", 5, 10));
        queue.push(job("second", 5, 20));

        assert_eq!(queue.pop().unwrap().id, "first");
        assert_eq!(queue.pop().unwrap().id, "second");
        assert_eq!(queue.pop().unwrap().id, "third");
    }

    #[test]
    fn peek_does_not_remove() {
        let queue = PriorityQueue::new();
        queue.push(job("only", 3, 1));
        assert_eq!(queue.peek().unwrap().id, "only");
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop().unwrap().id, "only");
        assert!(queue.peek().is_none());
    }

    #[test]
    fn fairness_stats_track_live_counts() {
        let queue = PriorityQueue::new();
        queue.push(job("a", 1, 1));
        queue.push(job("b", 1, 2));
        queue.push(job("c", 9, 3));

        let stats = queue.fairness_stats();
        assert_eq!(stats.get(&1), Some(&2));
        assert_eq!(stats.get(&9), Some(&1));

        queue.pop();
        assert_eq!(queue.fairness_stats().get(&9), Some(&0));
    }

    proptest! {
        /// Popping everything yields a sequence sorted by
        /// (priority desc, created asc).
        #[test]
        fn drain_order_is_sorted(entries in prop::collection::vec((0i32..8, 0i64..1000), 1..64)) {
            let queue = PriorityQueue::new();
            for (i, (priority, tick)) in entries.iter().enumerate() {
                queue.push(job(&format!("j{i}"), *priority, *tick));
            }

            let mut drained = Vec::new();
            while let Some(job) = queue.pop() {
                drained.push((job.priority, job.created));
            }

            prop_assert_eq!(drained.len(), entries.len());
            for pair in drained.windows(2) {
                let (prio_a, created_a) = pair[0];
                let (prio_b, created_b) = pair[1];
                prop_assert!(
                    prio_a > prio_b || (prio_a == prio_b && created_a <= created_b),
                    "out of order: ({}, {:?}) before ({}, {:?})",
                    prio_a, created_a, prio_b, created_b
                );
            }
        }
    }
}
