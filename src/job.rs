//! Job and result records, and the processor capability.
//!
//! A [`Job`] wraps a typed payload with scheduling metadata; a
//! [`JobResult`] is the outcome record for exactly one job that entered
//! execution. The [`Processor`] is the caller-supplied capability that
//! maps a job to an output; the pool never inspects payloads.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::ProcessError;

/// A unit of work queued for processing.
///
/// Jobs are immutable once enqueued; the pool only stamps [`created`]
/// when the caller left it unset. The `id` is caller-assigned, preserved
/// verbatim in the result, and need not be unique.
///
/// [`created`]: Job::created
///
/// # Examples
///
/// ```rust,ignore
/// let job = Job::new("invoice-17", payload).with_priority(5);
/// ```
#[derive(Debug, Clone)]
pub struct Job<T> {
    /// Caller-assigned identifier, echoed in the result
    pub id: String,
    /// The payload handed to the processor
    pub data: T,
    /// Scheduling priority; higher runs earlier under the priority
    /// strategy, ignored by the others
    pub priority: i32,
    /// Enqueue timestamp; stamped by the pool when unset. Tie-breaker for
    /// equal priorities (earlier wins).
    pub created: Option<DateTime<Utc>>,
}

impl<T> Job<T> {
    /// Create a job with default priority and an unset creation time.
    pub fn new(id: impl Into<String>, data: T) -> Self {
        Self {
            id: id.into(),
            data,
            priority: 0,
            created: None,
        }
    }

    /// Set the scheduling priority (higher = earlier under the priority
    /// strategy).
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set an explicit creation timestamp.
    ///
    /// Jobs enqueued within the same timestamp tick pop in unspecified
    /// relative order; callers needing a total order assign distinct
    /// timestamps themselves.
    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }
}

/// The outcome record for one job.
///
/// Exactly one of these is emitted per job that entered execution,
/// covering all retry attempts. `started`/`completed` bracket every
/// attempt plus the backoff sleeps between them.
#[derive(Debug)]
pub struct JobResult<R> {
    /// Echo of the input job's id
    pub job_id: String,
    /// Processor output; `R::default()` when the job terminally failed
    pub data: R,
    /// Error from the final attempt, absent on success
    pub error: Option<ProcessError>,
    /// Identifier of the worker that executed the job (stable `0..N`)
    pub worker: usize,
    /// When the first attempt began
    pub started: DateTime<Utc>,
    /// When the final attempt finished
    pub completed: DateTime<Utc>,
    /// `completed - started`
    pub duration: Duration,
}

impl<R> JobResult<R> {
    /// Returns true when the job succeeded within its retry budget.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Caller-supplied capability mapping a cancellation scope and a job to an
/// output or an error.
///
/// The scope passed to each invocation is a child of the run scope, with
/// the per-attempt deadline attached when one is configured; cooperative
/// processors should poll it (`scope.is_cancelled()`) or select on
/// `scope.cancelled()` inside long operations.
pub type Processor<T, R> = Arc<
    dyn Fn(CancellationToken, Job<T>) -> BoxFuture<'static, std::result::Result<R, ProcessError>>
        + Send
        + Sync,
>;

/// Box an async closure into a [`Processor`].
///
/// Used by [`WorkerPool::with_processor`](crate::pool::WorkerPool::with_processor);
/// exposed for callers that build processors ahead of time.
pub fn processor_fn<T, R, F, Fut>(f: F) -> Processor<T, R>
where
    F: Fn(CancellationToken, Job<T>) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = std::result::Result<R, ProcessError>> + Send + 'static,
{
    Arc::new(move |scope, job| Box::pin(f(scope, job)))
}
