//! Priority-based distribution.
//!
//! All jobs go into a fair max-heap, and a single dispatcher pops it in
//! strict (priority desc, created asc) order into one bounded shared
//! queue that N workers consume uniformly. The heap must be consulted in
//! pop order to honor priority; serializing the ordering decisions in one
//! dispatcher avoids cross-worker reordering while the workers absorb
//! processor latency. Completion order is still arbitrary — workers run
//! in parallel.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{run_job, Strategy};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::heap::PriorityQueue;
use crate::job::{Job, JobResult, Processor};

/// Heap-fed dispatcher with N uniform consumers.
pub struct PriorityStrategy;

#[async_trait]
impl<T, R> Strategy<T, R> for PriorityStrategy
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
        let queue_capacity = config.buffer_size;
        let config = Arc::new(config);

        let heap = PriorityQueue::new();
        let now = Utc::now();
        for mut job in jobs {
            // The pool stamps at enqueue; re-stamp here so fairness holds
            // even for batches fed to the strategy directly.
            job.created.get_or_insert(now);
            heap.push(job);
        }
        debug!(
            "priority: {} jobs heaped for {} workers (queue capacity {})",
            heap.len(),
            num_workers,
            queue_capacity
        );

        // tokio mpsc is single-consumer; workers share the receiving end
        // behind an async mutex so consumption stays affinity-free.
        let (queue_tx, queue_rx) = mpsc::channel::<Job<T>>(queue_capacity);
        let queue_rx = Arc::new(Mutex::new(queue_rx));

        let mut workers = JoinSet::new();
        for worker_id in 0..num_workers {
            let scope = scope.clone();
            let queue_rx = Arc::clone(&queue_rx);
            let processor = Arc::clone(&processor);
            let results = results.clone();
            let config = Arc::clone(&config);
            workers.spawn(async move {
                loop {
                    let job = {
                        let mut queue = queue_rx.lock().await;
                        tokio::select! {
                            _ = scope.cancelled() => None,
                            job = queue.recv() => job,
                        }
                    };
                    let Some(job) = job else { return };
                    run_job(&scope, worker_id, job, &processor, &results, &config).await;
                }
            });
        }
        drop(queue_rx);
        drop(results);

        let dispatcher = tokio::spawn({
            let scope = scope.clone();
            async move {
                while let Some(job) = heap.pop() {
                    tokio::select! {
                        _ = scope.cancelled() => return,
                        sent = queue_tx.send(job) => {
                            if sent.is_err() {
                                return;
                            }
                        }
                    }
                }
                // queue_tx drops here, closing the shared queue.
            }
        });

        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                return Err(Error::strategy(
                    Strategy::<T, R>::name(self),
                    err.to_string(),
                ));
            }
        }
        let _ = dispatcher.await;

        if scope.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "priority"
    }
}
