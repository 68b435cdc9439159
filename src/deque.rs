//! Chase–Lev-style work-stealing deque.
//!
//! A double-ended queue with one owner and many thieves: the owner pushes
//! and pops at the bottom (LIFO, favoring recency and cache locality)
//! while thieves steal from the top (FIFO, minimizing contention with the
//! owner). Storage is a ring buffer indexed by monotonically
//! non-decreasing `top`/`bottom` counters; live items occupy
//! `[top, bottom)` modulo the current capacity, and the ring doubles when
//! full, rehoming live entries by index so pops and steals observe the
//! same logical sequence across a grow.
//!
//! All three operations take one exclusive lock. `steal` advances `top`,
//! so a shared lock would let two thieves deliver the same job; mutual
//! exclusion makes delivery exactly-once, including the single-element
//! race between a `pop` and a concurrent `steal`.

use parking_lot::Mutex;

use crate::job::Job;

const MIN_CAPACITY: usize = 64;

struct DequeState<T> {
    /// Next slot the owner writes; grows monotonically
    bottom: usize,
    /// Oldest live slot; grows monotonically
    top: usize,
    ring: Vec<Option<Job<T>>>,
}

impl<T> DequeState<T> {
    fn grow(&mut self) {
        let old_len = self.ring.len();
        let new_len = old_len * 2;
        let mut ring: Vec<Option<Job<T>>> = Vec::with_capacity(new_len);
        ring.resize_with(new_len, || None);

        for i in self.top..self.bottom {
            ring[i % new_len] = self.ring[i % old_len].take();
        }
        self.ring = ring;
    }
}

/// A work-stealing deque holding [`Job`]s for one worker.
///
/// Shared across workers as `Arc<WorkStealingDeque<T>>`: the owning
/// worker calls [`push`](Self::push)/[`pop`](Self::pop), every other
/// worker calls [`steal`](Self::steal).
pub struct WorkStealingDeque<T> {
    inner: Mutex<DequeState<T>>,
}

impl<T> WorkStealingDeque<T> {
    /// Create a deque with room for `initial_capacity` jobs before the
    /// first grow (64 when given zero).
    pub fn new(initial_capacity: usize) -> Self {
        let capacity = if initial_capacity == 0 {
            MIN_CAPACITY
        } else {
            initial_capacity
        };
        let mut ring = Vec::with_capacity(capacity);
        ring.resize_with(capacity, || None);
        Self {
            inner: Mutex::new(DequeState {
                bottom: 0,
                top: 0,
                ring,
            }),
        }
    }

    /// Append a job at the bottom (owner side).
    pub fn push(&self, job: Job<T>) {
        let mut state = self.inner.lock();
        if state.bottom - state.top == state.ring.len() {
            state.grow();
        }
        let len = state.ring.len();
        let slot = state.bottom % len;
        state.ring[slot] = Some(job);
        state.bottom += 1;
    }

    /// Remove the most recently pushed job (owner side, LIFO).
    pub fn pop(&self) -> Option<Job<T>> {
        let mut state = self.inner.lock();
        if state.bottom == state.top {
            return None;
        }
        state.bottom -= 1;
        let len = state.ring.len();
        let slot = state.bottom % len;
        state.ring[slot].take()
    }

    /// Remove the oldest job (thief side, FIFO).
    pub fn steal(&self) -> Option<Job<T>> {
        let mut state = self.inner.lock();
        if state.top >= state.bottom {
            return None;
        }
        let len = state.ring.len();
        let slot = state.top % len;
        let job = state.ring[slot].take();
        state.top += 1;
        job
    }

    /// Number of jobs currently held.
    pub fn len(&self) -> usize {
        let state = self.inner.lock();
        state.bottom - state.top
    }

    /// Returns true when no jobs are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
