//! Run metrics.
//!
//! The pool mutates one [`Metrics`] record per run; callers only ever see
//! by-value snapshots, so a snapshot taken mid-run is a consistent view of
//! the counters at that instant.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Performance counters for a pool run.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    /// Jobs currently loaded into the pool
    pub total_jobs: usize,
    /// Jobs that terminally succeeded
    pub processed_jobs: usize,
    /// Jobs that terminally failed after exhausting retries
    pub failed_jobs: usize,
    /// When the run started
    pub start_time: Option<DateTime<Utc>>,
    /// When the run finished
    pub end_time: Option<DateTime<Utc>>,
    /// Wall-clock span of the run
    pub total_duration: Duration,
    /// `total_duration / max(processed_jobs, 1)`
    pub average_duration: Duration,
}

impl Metrics {
    /// Reset the per-run counters, keeping `total_jobs`.
    ///
    /// Called at the start of each run so the success/failure partition
    /// holds per run on a reused pool.
    pub(crate) fn begin_run(&mut self, start: DateTime<Utc>) {
        self.processed_jobs = 0;
        self.failed_jobs = 0;
        self.start_time = Some(start);
        self.end_time = None;
        self.total_duration = Duration::ZERO;
        self.average_duration = Duration::ZERO;
    }

    /// Stamp the end of the run and derive the duration aggregates.
    pub(crate) fn finish_run(&mut self, end: DateTime<Utc>) {
        self.end_time = Some(end);
        if let Some(start) = self.start_time {
            self.total_duration = (end - start).to_std().unwrap_or_default();
        }
        self.average_duration = self.total_duration / self.processed_jobs.max(1) as u32;
    }
}
