//! Error types for Taskforce.
//!
//! Run-level failures (pre-flight validation, cancellation, internal
//! strategy faults) are expressed through [`Error`] and surface from
//! [`WorkerPool::run`](crate::pool::WorkerPool::run). Per-job failures
//! never abort a run: they travel inside
//! [`JobResult::error`](crate::job::JobResult) as an opaque
//! [`ProcessError`].

use std::time::Duration;
use thiserror::Error;

/// Result type alias for Taskforce operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error returned by a processor attempt.
///
/// The pool treats the processor as opaque: whatever error type the caller
/// produces is carried through to the job's result unmodified.
pub type ProcessError = Box<dyn std::error::Error + Send + Sync>;

/// The main error type for Taskforce.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Pre-flight Errors
    // ========================================================================
    /// `run` was invoked before a processor was supplied.
    #[error("no processor configured")]
    NoProcessor,

    /// `run` was invoked with an empty job batch.
    #[error("no jobs to process")]
    NoJobs,

    // ========================================================================
    // Run Errors
    // ========================================================================
    /// The run scope was cancelled before all jobs were accounted for,
    /// whether by [`stop`](crate::pool::WorkerPool::stop), by the run
    /// timeout, or by a caller-held [`PoolHandle`](crate::pool::PoolHandle).
    #[error("run cancelled")]
    Cancelled,

    /// A distribution strategy failed internally (e.g. a worker task
    /// panicked). This is a pool defect, not a job failure.
    #[error("strategy '{strategy}' failed: {message}")]
    Strategy {
        /// Name of the strategy that failed
        strategy: String,
        /// Failure description
        message: String,
    },
}

impl Error {
    /// Creates a new strategy error.
    pub fn strategy(strategy: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Strategy {
            strategy: strategy.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error reports a cancelled run.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// A single processor attempt exceeded the per-attempt deadline.
///
/// Converted into a [`ProcessError`] and counted against the retry budget
/// exactly like any other processor failure.
#[derive(Error, Debug)]
#[error("attempt timed out after {timeout:?}")]
pub struct AttemptTimeout {
    /// The per-attempt budget that elapsed
    pub timeout: Duration,
}
