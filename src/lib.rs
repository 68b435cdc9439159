//! # Taskforce - A Strategy-Driven Async Worker Pool
//!
//! Taskforce runs a finite batch of typed jobs across a bounded set of
//! parallel workers, with a pluggable distribution strategy deciding who
//! executes what. Every job that enters execution yields exactly one
//! typed result carrying per-job diagnostics, and retry, per-attempt
//! timeout and cancellation behave identically under every strategy.
//!
//! ## Core Concepts
//!
//! - **Jobs**: typed payloads with an id, a priority and an enqueue time
//! - **Processor**: caller-supplied async capability mapping a job to an
//!   output or an error; opaque to the pool
//! - **Strategies**: round-robin, chunked, work-stealing and priority
//!   assignment policies behind one interface
//! - **Workers**: `N` parallel tasks with stable ids `0..N`
//! - **Scope**: a cancellation token composed with the run timeout and
//!   threaded through every worker and processor attempt
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          WorkerPool                              │
//! │        (validate config · open scope · collect results)          │
//! └─────────────────────────────────────────────────────────────────┘
//!                                  │
//!                                  ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Strategy::execute                          │
//! │   round-robin  │   chunked   │  work-stealing  │   priority      │
//! │   (inboxes)    │  (slices)   │    (deques)     │ (heap + queue)  │
//! └─────────────────────────────────────────────────────────────────┘
//!                                  │
//!                                  ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Workers 0..N (tokio)                        │
//! │          retry · per-attempt timeout · linear backoff            │
//! └─────────────────────────────────────────────────────────────────┘
//!                                  │
//!                                  ▼
//!                      bounded result channel
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use taskforce::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> taskforce::Result<()> {
//!     let mut pool = WorkerPool::with_config(Config {
//!         num_workers: 4,
//!         strategy: Distribution::WorkStealing,
//!         ..Default::default()
//!     })
//!     .with_processor(|_scope, job: Job<String>| async move {
//!         Ok(job.data.to_uppercase())
//!     });
//!
//!     pool.add_jobs(vec![
//!         Job::new("1", "hello".to_string()),
//!         Job::new("2", "world".to_string()),
//!     ]);
//!
//!     for result in pool.run().await? {
//!         println!("{} -> {}", result.job_id, result.data);
//!     }
//!     println!("{:?}", pool.get_metrics());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-export commonly used items in prelude
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::config::{Config, Distribution};
    pub use crate::error::{Error, ProcessError, Result};
    pub use crate::job::{Job, JobResult, Processor};
    pub use crate::metrics::Metrics;
    pub use crate::pool::{PoolHandle, WorkerPool};
    pub use crate::strategy::Strategy;
}

// ============================================================================
// Core Modules
// ============================================================================

pub mod config;
pub mod error;
pub mod job;
pub mod metrics;

// ============================================================================
// Concurrent Data Structures
// ============================================================================

pub mod deque;
pub mod heap;

// ============================================================================
// Execution Engine
// ============================================================================

pub mod pool;
pub mod strategy;

pub use config::{Config, Distribution};
pub use error::{Error, ProcessError, Result};
pub use job::{Job, JobResult, Processor};
pub use metrics::Metrics;
pub use pool::{PoolHandle, WorkerPool};

/// Returns the current version of Taskforce.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
