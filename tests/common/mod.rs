//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use taskforce::prelude::*;

/// Build a batch of string jobs from `(id, data)` pairs.
pub fn string_jobs(pairs: &[(&str, &str)]) -> Vec<Job<String>> {
    pairs
        .iter()
        .map(|(id, data)| Job::new(*id, data.to_string()))
        .collect()
}

/// A config with retries and per-attempt deadlines off, for deterministic
/// scenarios.
pub fn plain_config(strategy: Distribution, num_workers: usize) -> Config {
    Config {
        num_workers,
        strategy,
        max_retries: 0,
        worker_timeout: Duration::ZERO,
        ..Default::default()
    }
}

/// Uppercase the job payload; never fails.
pub async fn uppercase(
    _scope: CancellationToken,
    job: Job<String>,
) -> std::result::Result<String, ProcessError> {
    Ok(job.data.to_uppercase())
}

/// Records the order in which jobs reach a processor.
#[derive(Clone, Default)]
pub struct DispatchRecorder {
    order: Arc<Mutex<Vec<String>>>,
}

impl DispatchRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, id: &str) {
        self.order.lock().push(id.to_string());
    }

    pub fn order(&self) -> Vec<String> {
        self.order.lock().clone()
    }
}

/// Counts processor invocations across all jobs and attempts.
#[derive(Clone, Default)]
pub struct CallCounter {
    calls: Arc<AtomicUsize>,
}

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump(&self) -> usize {
        self.calls.fetch_add(1, Ordering::SeqCst)
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Multiset of job ids from a result batch.
pub fn id_multiset<R>(results: &[JobResult<R>]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for result in results {
        *counts.entry(result.job_id.clone()).or_insert(0) += 1;
    }
    counts
}

/// Multiset of ids from a job batch.
pub fn job_id_multiset<T>(jobs: &[Job<T>]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for job in jobs {
        *counts.entry(job.id.clone()).or_insert(0) += 1;
    }
    counts
}
