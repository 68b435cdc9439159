//! Work-stealing distribution.
//!
//! Jobs are seeded round-robin into per-worker deques before any worker
//! starts. A worker pops its own deque (LIFO) while it can; when empty it
//! probes the other deques in `(id + attempt) mod N` order, stealing from
//! the top (FIFO). A worker exits once it observes every deque empty —
//! sound because seeding finishes before workers start and workers never
//! produce new jobs, so emptiness is stable.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::{run_job, Strategy};
use crate::config::Config;
use crate::deque::WorkStealingDeque;
use crate::error::{Error, Result};
use crate::job::{Job, JobResult, Processor};

/// Pause between probe rounds when nothing was stealable but work is
/// still in flight elsewhere.
const IDLE_BACKOFF: Duration = Duration::from_millis(1);

/// Per-worker deques with top-end stealing for dynamic load balancing.
pub struct WorkStealingStrategy;

#[async_trait]
impl<T, R> Strategy<T, R> for WorkStealingStrategy
where
    T: Clone + Send + 'static,
    R: Default + Send + 'static,
{
    async fn execute(
        &self,
        scope: CancellationToken,
        config: Config,
        jobs: Vec<Job<T>>,
        processor: Processor<T, R>,
        results: mpsc::Sender<JobResult<R>>,
    ) -> Result<()> {
        let num_workers = config.num_workers;
        let config = Arc::new(config);

        let deques: Arc<Vec<WorkStealingDeque<T>>> = Arc::new(
            (0..num_workers)
                .map(|_| WorkStealingDeque::new(jobs.len() / num_workers + 1))
                .collect(),
        );

        debug!(
            "work-stealing: seeding {} jobs into {} deques",
            jobs.len(),
            num_workers
        );
        for (index, job) in jobs.into_iter().enumerate() {
            deques[index % num_workers].push(job);
        }

        let mut workers = JoinSet::new();
        for worker_id in 0..num_workers {
            let scope = scope.clone();
            let deques = Arc::clone(&deques);
            let processor = Arc::clone(&processor);
            let results = results.clone();
            let config = Arc::clone(&config);
            workers.spawn(async move {
                loop {
                    if scope.is_cancelled() {
                        return;
                    }

                    // Own work first: LIFO keeps the cache warm.
                    if let Some(job) = deques[worker_id].pop() {
                        run_job(&scope, worker_id, job, &processor, &results, &config).await;
                        continue;
                    }

                    let mut stolen = false;
                    for attempt in 1..=(2 * num_workers) {
                        let victim = (worker_id + attempt) % num_workers;
                        if victim == worker_id {
                            continue;
                        }
                        if let Some(job) = deques[victim].steal() {
                            trace!("worker {} stole job '{}' from worker {}", worker_id, job.id, victim);
                            run_job(&scope, worker_id, job, &processor, &results, &config).await;
                            stolen = true;
                            break;
                        }
                    }

                    if !stolen {
                        if deques.iter().all(WorkStealingDeque::is_empty) {
                            return;
                        }
                        tokio::time::sleep(IDLE_BACKOFF).await;
                    }
                }
            });
        }
        drop(results);

        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                return Err(Error::strategy(
                    Strategy::<T, R>::name(self),
                    err.to_string(),
                ));
            }
        }

        if scope.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "work-stealing"
    }
}
