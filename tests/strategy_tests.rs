//! Distribution strategy behavior tests.
//!
//! One suite per strategy: assignment and ordering guarantees, the
//! priority heap's dispatch order, work-stealing conservation under a
//! heterogeneous workload, and result conservation across all four.

mod common;

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use common::{id_multiset, job_id_multiset, plain_config, string_jobs, uppercase, DispatchRecorder};
use taskforce::prelude::*;

// ============================================================================
// Round-Robin
// ============================================================================

#[tokio::test]
async fn round_robin_uppercases_whole_batch() {
    let mut pool = WorkerPool::with_config(plain_config(Distribution::RoundRobin, 2))
        .with_processor(uppercase);
    pool.add_jobs(string_jobs(&[
        ("1", "hello"),
        ("2", "world"),
        ("3", "test"),
        ("4", "data"),
    ]));

    let results = pool.run().await.unwrap();
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(JobResult::is_success));

    let outputs: HashSet<String> = results.iter().map(|result| result.data.clone()).collect();
    let expected: HashSet<String> = ["HELLO", "WORLD", "TEST", "DATA"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(outputs, expected);

    let metrics = pool.get_metrics();
    assert_eq!(metrics.processed_jobs, 4);
    assert_eq!(metrics.failed_jobs, 0);
}

#[tokio::test]
async fn round_robin_assigns_job_i_to_worker_i_mod_n() {
    const WORKERS: usize = 3;
    let jobs: Vec<Job<String>> = (0..10)
        .map(|i| Job::new(i.to_string(), format!("payload-{i}")))
        .collect();

    let mut pool = WorkerPool::with_config(plain_config(Distribution::RoundRobin, WORKERS))
        .with_processor(uppercase);
    pool.add_jobs(jobs);

    let results = pool.run().await.unwrap();
    assert_eq!(results.len(), 10);
    for result in &results {
        let index: usize = result.job_id.parse().unwrap();
        assert_eq!(
            result.worker,
            index % WORKERS,
            "job {index} ran on worker {}",
            result.worker
        );
    }
}

// ============================================================================
// Chunked
// ============================================================================

#[tokio::test]
async fn chunked_partitions_contiguous_ranges() {
    const WORKERS: usize = 3;
    const JOBS: usize = 8;
    let jobs: Vec<Job<String>> = (0..JOBS)
        .map(|i| Job::new(i.to_string(), String::new()))
        .collect();

    let mut pool = WorkerPool::with_config(plain_config(Distribution::Chunked, WORKERS))
        .with_processor(uppercase);
    pool.add_jobs(jobs);

    let results = pool.run().await.unwrap();
    assert_eq!(results.len(), JOBS);

    let mut per_worker: HashMap<usize, Vec<usize>> = HashMap::new();
    for result in &results {
        per_worker
            .entry(result.worker)
            .or_default()
            .push(result.job_id.parse().unwrap());
    }

    let mut covered = HashSet::new();
    for (worker, indices) in &mut per_worker {
        indices.sort_unstable();
        // Contiguous range of the right size.
        let span = indices.last().unwrap() - indices.first().unwrap() + 1;
        assert_eq!(
            span,
            indices.len(),
            "worker {worker} got a non-contiguous range: {indices:?}"
        );
        assert!(
            indices.len() == JOBS / WORKERS || indices.len() == JOBS / WORKERS + 1,
            "worker {worker} chunk size {} out of bounds",
            indices.len()
        );
        covered.extend(indices.iter().copied());
    }
    assert_eq!(covered, (0..JOBS).collect::<HashSet<_>>());
}

#[tokio::test]
async fn chunked_with_fewer_jobs_than_workers() {
    let mut pool =
        WorkerPool::with_config(plain_config(Distribution::Chunked, 8)).with_processor(uppercase);
    pool.add_jobs(string_jobs(&[("1", "a"), ("2", "b"), ("3", "c")]));

    let results = pool.run().await.unwrap();
    assert_eq!(results.len(), 3);
    // Only the first L workers receive a (single-job) chunk.
    assert!(results.iter().all(|result| result.worker < 3));
}

// ============================================================================
// Work-Stealing
// ============================================================================

#[tokio::test]
async fn work_stealing_conserves_heterogeneous_batch() {
    const WORKERS: usize = 8;
    const JOBS: usize = 2_000;

    let jobs: Vec<Job<u64>> = (0..JOBS)
        .map(|i| Job::new(i.to_string(), i as u64))
        .collect();
    let expected = job_id_multiset(&jobs);

    let mut pool: WorkerPool<u64, u64> = WorkerPool::with_config(Config {
        num_workers: WORKERS,
        strategy: Distribution::WorkStealing,
        max_retries: 0,
        worker_timeout: Duration::ZERO,
        ..Default::default()
    })
    .with_processor(|_scope, job: Job<u64>| async move {
        // Heterogeneous costs so some deques drain much faster than
        // others and stealing actually happens.
        let delay = match job.data % 3 {
            0 => Duration::from_micros(100),
            1 => Duration::from_millis(1),
            _ => Duration::from_millis(10),
        };
        tokio::time::sleep(delay).await;
        Ok::<_, ProcessError>(job.data)
    });
    pool.add_jobs(jobs);

    let results = pool.run().await.unwrap();
    assert_eq!(results.len(), JOBS);
    assert_eq!(id_multiset(&results), expected);

    let metrics = pool.get_metrics();
    assert_eq!(metrics.processed_jobs, JOBS);
    assert_eq!(metrics.failed_jobs, 0);
}

#[tokio::test]
async fn work_stealing_single_worker_degenerates_cleanly() {
    let mut pool = WorkerPool::with_config(plain_config(Distribution::WorkStealing, 1))
        .with_processor(uppercase);
    pool.add_jobs(string_jobs(&[("1", "a"), ("2", "b"), ("3", "c")]));

    let results = pool.run().await.unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|result| result.worker == 0));
}

// ============================================================================
// Priority
// ============================================================================

#[tokio::test]
async fn priority_dispatches_high_to_low() {
    let recorder = DispatchRecorder::new();
    let mut pool =
        WorkerPool::with_config(plain_config(Distribution::Priority, 1)).with_processor({
            let recorder = recorder.clone();
            move |_scope, job: Job<String>| {
                recorder.record(&job.id);
                async move { Ok::<_, ProcessError>(job.data) }
            }
        });

    let base = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    pool.add_job(
        Job::new("1", "low".to_string())
            .with_priority(1)
            .with_created(base),
    );
    pool.add_job(
        Job::new("2", "high".to_string())
            .with_priority(10)
            .with_created(base + chrono::Duration::seconds(1)),
    );
    pool.add_job(
        Job::new("3", "medium".to_string())
            .with_priority(5)
            .with_created(base + chrono::Duration::seconds(2)),
    );

    let results = pool.run().await.unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(recorder.order(), vec!["2", "3", "1"]);
}

#[tokio::test]
async fn priority_is_fifo_within_a_band() {
    let recorder = DispatchRecorder::new();
    let mut pool =
        WorkerPool::with_config(plain_config(Distribution::Priority, 1)).with_processor({
            let recorder = recorder.clone();
            move |_scope, job: Job<String>| {
                recorder.record(&job.id);
                async move { Ok::<_, ProcessError>(job.data) }
            }
        });

    let base = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    for (index, id) in ["a", "b", "c", "d"].into_iter().enumerate() {
        pool.add_job(
            Job::new(id, id.to_string())
                .with_priority(5)
                .with_created(base + chrono::Duration::seconds(index as i64)),
        );
    }

    pool.run().await.unwrap();
    assert_eq!(recorder.order(), vec!["a", "b", "c", "d"]);
}

#[tokio::test]
async fn priority_with_many_workers_conserves_results() {
    let jobs: Vec<Job<String>> = (0..100)
        .map(|i| Job::new(i.to_string(), format!("p{i}")).with_priority((i % 7) as i32))
        .collect();
    let expected = job_id_multiset(&jobs);

    let mut pool = WorkerPool::with_config(plain_config(Distribution::Priority, 4))
        .with_processor(uppercase);
    pool.add_jobs(jobs);

    let results = pool.run().await.unwrap();
    assert_eq!(id_multiset(&results), expected);
}

// ============================================================================
// Cross-Strategy Properties
// ============================================================================

#[tokio::test]
async fn every_strategy_conserves_the_result_multiset() {
    for strategy in [
        Distribution::RoundRobin,
        Distribution::Chunked,
        Distribution::WorkStealing,
        Distribution::Priority,
    ] {
        let jobs: Vec<Job<String>> = (0..50)
            .map(|i| Job::new(format!("job-{i}"), format!("data-{i}")))
            .collect();
        let expected = job_id_multiset(&jobs);

        let mut pool =
            WorkerPool::with_config(plain_config(strategy, 4)).with_processor(uppercase);
        pool.add_jobs(jobs);

        let results = pool.run().await.unwrap();
        assert_eq!(
            id_multiset(&results),
            expected,
            "strategy {strategy} lost or duplicated results"
        );

        let metrics = pool.get_metrics();
        assert_eq!(
            metrics.processed_jobs + metrics.failed_jobs,
            results.len(),
            "strategy {strategy} broke the success/failure partition"
        );
    }
}

#[tokio::test]
async fn worker_ids_stay_in_range_for_every_strategy() {
    for strategy in [
        Distribution::RoundRobin,
        Distribution::Chunked,
        Distribution::WorkStealing,
        Distribution::Priority,
    ] {
        let mut pool =
            WorkerPool::with_config(plain_config(strategy, 3)).with_processor(uppercase);
        pool.add_jobs(string_jobs(&[
            ("1", "a"),
            ("2", "b"),
            ("3", "c"),
            ("4", "d"),
            ("5", "e"),
        ]));

        let results = pool.run().await.unwrap();
        assert!(
            results.iter().all(|result| result.worker < 3),
            "strategy {strategy} reported an out-of-range worker id"
        );
    }
}
