//! Round-robin distribution.
//!
//! Each worker owns a bounded inbox; job `i` is dispatched to inbox
//! `i mod N`. Assignment is static and even by count, order within a
//! worker is enqueue order, and nothing rebalances afterwards — the
//! cheapest strategy when job costs are uniform.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{run_job, Strategy};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::job::{Job, JobResult, Processor};

/// Static `i mod N` assignment through per-worker inboxes.
pub struct RoundRobinStrategy;

#[async_trait]
impl<T, R> Strategy<T, R> for RoundRobinStrategy
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
        // Every inbox can hold the worker's whole share, so dispatch only
        // blocks when a worker falls far behind.
        let inbox_capacity = jobs.len() / num_workers + 1;
        let config = Arc::new(config);

        debug!(
            "round-robin: {} jobs across {} workers",
            jobs.len(),
            num_workers
        );

        let mut inboxes = Vec::with_capacity(num_workers);
        let mut workers = JoinSet::new();
        for worker_id in 0..num_workers {
            let (inbox_tx, mut inbox_rx) = mpsc::channel::<Job<T>>(inbox_capacity);
            inboxes.push(inbox_tx);

            let scope = scope.clone();
            let processor = Arc::clone(&processor);
            let results = results.clone();
            let config = Arc::clone(&config);
            workers.spawn(async move {
                while let Some(job) = inbox_rx.recv().await {
                    if scope.is_cancelled() {
                        return;
                    }
                    run_job(&scope, worker_id, job, &processor, &results, &config).await;
                }
            });
        }
        // Workers now hold the only result senders that matter.
        drop(results);

        let mut cancelled = false;
        for (index, job) in jobs.into_iter().enumerate() {
            let inbox = &inboxes[index % num_workers];
            tokio::select! {
                sent = inbox.send(job) => {
                    if sent.is_err() {
                        break;
                    }
                }
                _ = scope.cancelled() => {
                    cancelled = true;
                    break;
                }
            }
        }
        // Closing the inboxes lets each worker drain its backlog and exit.
        drop(inboxes);

        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                return Err(Error::strategy(
                    Strategy::<T, R>::name(self),
                    err.to_string(),
                ));
            }
        }

        if cancelled || scope.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "round-robin"
    }
}
