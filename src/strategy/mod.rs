//! Job distribution strategies.
//!
//! A strategy owns the whole worker side of a run: it starts the worker
//! tasks, feeds or partitions the job batch, and guarantees the results
//! channel closes exactly once after every worker has exited. The close
//! is driven by ownership, not timing: the strategy drops its own result
//! sender before dispatching, each worker drops its clone on exit, and
//! the strategy joins all workers before returning, so the last sender is
//! gone precisely when the last worker is.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        WorkerPool::run                       │
//! │                              │                               │
//! │                    strategy.execute(…)                       │
//! │          ┌───────────┬───────┴───────┬─────────────┐        │
//! │     round-robin   chunked      work-stealing    priority     │
//! │      (inboxes)   (slices)       (deques)      (heap+queue)   │
//! │          └───────────┴───────┬───────┴─────────────┘        │
//! │                          run_job(…)                          │
//! │             retry · per-attempt timeout · backoff            │
//! │                              │                               │
//! │                       results channel                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::{Config, Distribution};
use crate::error::{AttemptTimeout, ProcessError, Result};
use crate::job::{Job, JobResult, Processor};

pub mod chunked;
pub mod priority;
pub mod round_robin;
pub mod work_stealing;

pub use chunked::ChunkedStrategy;
pub use priority::PriorityStrategy;
pub use round_robin::RoundRobinStrategy;
pub use work_stealing::WorkStealingStrategy;

/// Linear backoff step between failed attempts: attempt `k` (1-based)
/// waits `k * BACKOFF_STEP`.
const BACKOFF_STEP: Duration = Duration::from_millis(100);

/// A pluggable job assignment policy.
///
/// `execute` returns `Ok(())` once all workers have completed, or
/// [`Error::Cancelled`](crate::error::Error::Cancelled) when the run
/// scope was cancelled first. Implementations must not close `results`
/// while any worker can still emit.
#[async_trait]
pub trait Strategy<T, R>: Send + Sync
where
    T: Clone + Send + 'static,
    R: Default + Send + 'static,
{
    /// Drive `jobs` through `config.num_workers` workers, emitting one
    /// result per executed job into `results`.
    async fn execute(
        &self,
        scope: CancellationToken,
        config: Config,
        jobs: Vec<Job<T>>,
        processor: Processor<T, R>,
        results: mpsc::Sender<JobResult<R>>,
    ) -> Result<()>;

    /// Human-readable strategy name.
    fn name(&self) -> &'static str;
}

/// Map a [`Distribution`] to its strategy instance.
///
/// Exhaustive by construction; unrecognized strategy *names* already fell
/// back to round-robin in [`Distribution::from_name`].
pub fn create<T, R>(kind: Distribution) -> Arc<dyn Strategy<T, R>>
where
    T: Clone + Send + 'static,
    R: Default + Send + 'static,
{
    match kind {
        Distribution::RoundRobin => Arc::new(RoundRobinStrategy),
        Distribution::Chunked => Arc::new(ChunkedStrategy),
        Distribution::WorkStealing => Arc::new(WorkStealingStrategy),
        Distribution::Priority => Arc::new(PriorityStrategy),
    }
}

/// Execute one job to its terminal outcome and emit the result.
///
/// Runs up to `max_retries + 1` attempts. Each attempt gets a child token
/// of the run scope; when `worker_timeout` is non-zero the attempt is
/// raced against that deadline and a timeout cancels the child token and
/// counts against the retry budget like any processor error. Backoff
/// sleeps between attempts are part of the job's measured duration.
///
/// If the run scope is cancelled before an attempt starts, the job is
/// abandoned without emitting a result; never-dispatched jobs are not
/// reported.
pub(crate) async fn run_job<T, R>(
    scope: &CancellationToken,
    worker_id: usize,
    job: Job<T>,
    processor: &Processor<T, R>,
    results: &mpsc::Sender<JobResult<R>>,
    config: &Config,
) where
    T: Clone + Send + 'static,
    R: Default + Send + 'static,
{
    let started = Utc::now();
    let mut data = R::default();
    let mut error: Option<ProcessError> = None;

    for attempt in 0..=config.max_retries {
        if scope.is_cancelled() {
            return;
        }

        let attempt_scope = scope.child_token();
        let invocation = processor(attempt_scope.clone(), job.clone());

        let outcome = if config.worker_timeout > Duration::ZERO {
            match tokio::time::timeout(config.worker_timeout, invocation).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    attempt_scope.cancel();
                    Err(AttemptTimeout {
                        timeout: config.worker_timeout,
                    }
                    .into())
                }
            }
        } else {
            invocation.await
        };

        match outcome {
            Ok(output) => {
                data = output;
                error = None;
                break;
            }
            Err(err) => {
                trace!(
                    "worker {} attempt {}/{} for job '{}' failed: {}",
                    worker_id,
                    attempt + 1,
                    config.max_retries + 1,
                    job.id,
                    err
                );
                error = Some(err);
                if attempt < config.max_retries {
                    tokio::time::sleep(BACKOFF_STEP * (attempt + 1)).await;
                }
            }
        }
    }

    let completed = Utc::now();
    let duration = (completed - started).to_std().unwrap_or_default();

    let result = JobResult {
        job_id: job.id,
        data,
        error,
        worker: worker_id,
        started,
        completed,
        duration,
    };
    if results.send(result).await.is_err() {
        debug!("worker {} found the result channel closed", worker_id);
    }
}
