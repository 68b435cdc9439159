//! The worker pool orchestrator.
//!
//! A pool is configured once, loaded with a job batch, and driven through
//! one-shot runs: [`run`](WorkerPool::run) validates pre-conditions,
//! opens a fresh cancellation scope composed with the run timeout, hands
//! the batch to the configured strategy, and drains the result channel
//! concurrently with the workers so emission never wedges the run. The
//! pool is reusable after a run fully drains.

use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, ProcessError, Result};
use crate::job::{processor_fn, Job, JobResult, Processor};
use crate::metrics::Metrics;
use crate::strategy;

type ScopeSlot = Arc<RwLock<Option<CancellationToken>>>;

/// A bounded pool of parallel workers consuming a finite job batch.
///
/// # Examples
///
/// ```rust,ignore
/// let mut pool = WorkerPool::new()
///     .with_processor(|_scope, job: Job<String>| async move {
///         Ok(job.data.to_uppercase())
///     });
/// pool.add_jobs(batch);
/// let results = pool.run().await?;
/// ```
pub struct WorkerPool<T, R> {
    config: Config,
    processor: Option<Processor<T, R>>,
    jobs: Vec<Job<T>>,
    metrics: Arc<RwLock<Metrics>>,
    scope: ScopeSlot,
}

impl<T, R> WorkerPool<T, R>
where
    T: Clone + Send + 'static,
    R: Default + Send + 'static,
{
    /// Create a pool with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a pool with a custom configuration; out-of-range values are
    /// clamped (see [`Config::validated`]).
    pub fn with_config(config: Config) -> Self {
        Self {
            config: config.validated(),
            processor: None,
            jobs: Vec::new(),
            metrics: Arc::new(RwLock::new(Metrics::default())),
            scope: Arc::new(RwLock::new(None)),
        }
    }

    /// Install the processor. Must be called before [`run`](Self::run).
    pub fn with_processor<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(CancellationToken, Job<T>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = std::result::Result<R, ProcessError>> + Send + 'static,
    {
        self.processor = Some(processor_fn(f));
        self
    }

    /// Append one job, stamping its creation time when unset.
    pub fn add_job(&mut self, mut job: Job<T>) -> &mut Self {
        job.created.get_or_insert_with(Utc::now);
        self.jobs.push(job);
        self.metrics.write().total_jobs = self.jobs.len();
        self
    }

    /// Append a batch of jobs, stamping unset creation times.
    pub fn add_jobs(&mut self, jobs: impl IntoIterator<Item = Job<T>>) -> &mut Self {
        let now = Utc::now();
        for mut job in jobs {
            job.created.get_or_insert(now);
            self.jobs.push(job);
        }
        self.metrics.write().total_jobs = self.jobs.len();
        self
    }

    /// Execute the loaded batch with the configured strategy.
    ///
    /// Returns every emitted [`JobResult`] on success. Fails with
    /// [`Error::NoProcessor`] or [`Error::NoJobs`] before doing any work,
    /// and with [`Error::Cancelled`] when the run was stopped or timed
    /// out, in which case partial results are discarded.
    pub async fn run(&mut self) -> Result<Vec<JobResult<R>>> {
        let processor = match &self.processor {
            Some(processor) => Arc::clone(processor),
            None => return Err(Error::NoProcessor),
        };
        if self.jobs.is_empty() {
            return Err(Error::NoJobs);
        }

        let config = self.config.clone();
        let scope = CancellationToken::new();
        *self.scope.write() = Some(scope.clone());

        // The watchdog turns the run timeout into a scope cancellation;
        // the end-of-run cancel below also retires it on the happy path.
        let watchdog = tokio::spawn({
            let scope = scope.clone();
            let timeout = config.timeout;
            async move {
                tokio::select! {
                    _ = tokio::time::sleep(timeout) => {
                        debug!("run timeout of {:?} elapsed; cancelling", timeout);
                        scope.cancel();
                    }
                    _ = scope.cancelled() => {}
                }
            }
        });

        self.metrics.write().begin_run(Utc::now());

        let (results_tx, mut results_rx) = mpsc::channel(config.buffer_size);
        let strategy = strategy::create::<T, R>(config.strategy);
        let strategy_name = strategy.name();
        debug!(
            "running {} jobs on {} workers with strategy '{}'",
            self.jobs.len(),
            config.num_workers,
            strategy_name
        );

        let runner = tokio::spawn({
            let scope = scope.clone();
            let jobs = self.jobs.clone();
            async move { strategy.execute(scope, config, jobs, processor, results_tx).await }
        });

        // Drain concurrently with the workers: the channel need not hold
        // the whole batch, and senders can never wedge against a full
        // buffer with nobody reading.
        let mut results = Vec::new();
        while let Some(result) = results_rx.recv().await {
            {
                let mut metrics = self.metrics.write();
                if result.is_success() {
                    metrics.processed_jobs += 1;
                } else {
                    metrics.failed_jobs += 1;
                }
            }
            results.push(result);
        }

        let outcome = match runner.await {
            Ok(outcome) => outcome,
            Err(err) => Err(Error::strategy(strategy_name, err.to_string())),
        };

        scope.cancel();
        let _ = watchdog.await;
        *self.scope.write() = None;
        self.metrics.write().finish_run(Utc::now());

        outcome?;
        Ok(results)
    }

    /// Cancel the in-flight run, if any. Idempotent; results already
    /// produced remain valid, pending jobs are never reported.
    pub fn stop(&self) {
        if let Some(scope) = self.scope.read().as_ref() {
            scope.cancel();
        }
    }

    /// By-value metrics snapshot, safe concurrently with a run. Returns
    /// an empty record when metrics exposure is disabled.
    pub fn get_metrics(&self) -> Metrics {
        if !self.config.enable_metrics {
            return Metrics::default();
        }
        self.metrics.read().clone()
    }

    /// Number of workers this pool runs.
    pub fn get_num_workers(&self) -> usize {
        self.config.num_workers
    }

    /// A cloneable handle for stopping the pool or sampling metrics from
    /// another task while [`run`](Self::run) holds the pool itself.
    pub fn handle(&self) -> PoolHandle {
        PoolHandle {
            scope: Arc::clone(&self.scope),
            metrics: Arc::clone(&self.metrics),
            enable_metrics: self.config.enable_metrics,
        }
    }
}

impl<T, R> Default for WorkerPool<T, R>
where
    T: Clone + Send + 'static,
    R: Default + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Remote control for a [`WorkerPool`] owned elsewhere.
///
/// Holds no job or payload types, so it can be stored and cloned freely.
#[derive(Clone)]
pub struct PoolHandle {
    scope: ScopeSlot,
    metrics: Arc<RwLock<Metrics>>,
    enable_metrics: bool,
}

impl PoolHandle {
    /// Cancel the in-flight run, if any. Idempotent.
    pub fn stop(&self) {
        if let Some(scope) = self.scope.read().as_ref() {
            scope.cancel();
        }
    }

    /// By-value metrics snapshot; empty when exposure is disabled.
    pub fn metrics(&self) -> Metrics {
        if !self.enable_metrics {
            return Metrics::default();
        }
        self.metrics.read().clone()
    }
}
