//! Pool configuration and strategy selection.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Job distribution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Distribution {
    /// Job `i` goes to worker `i mod N`; even static spread, per-worker
    /// FIFO order
    RoundRobin,
    /// Contiguous slices, one per worker; best locality, no load balancing
    Chunked,
    /// Per-worker deques with stealing; dynamic load balancing for uneven
    /// job costs
    WorkStealing,
    /// Single dispatcher draining a fair max-heap into a shared queue
    Priority,
}

impl Default for Distribution {
    fn default() -> Self {
        Self::RoundRobin
    }
}

impl std::fmt::Display for Distribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoundRobin => write!(f, "round-robin"),
            Self::Chunked => write!(f, "chunked"),
            Self::WorkStealing => write!(f, "work-stealing"),
            Self::Priority => write!(f, "priority"),
        }
    }
}

impl Distribution {
    /// Map a strategy name to a variant. Unrecognized names fall back to
    /// round-robin; there is no implicit strategy switching after this
    /// point.
    pub fn from_name(name: &str) -> Self {
        match name {
            "round-robin" => Self::RoundRobin,
            "chunked" => Self::Chunked,
            "work-stealing" => Self::WorkStealing,
            "priority" => Self::Priority,
            _ => Self::RoundRobin,
        }
    }
}

/// Configuration for a [`WorkerPool`](crate::pool::WorkerPool).
///
/// Values are validated and clamped once, when the pool is constructed;
/// see [`Config::validated`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Number of worker tasks (clamped to at least 1)
    pub num_workers: usize,
    /// Capacity of the result channel and of the priority strategy's
    /// shared queue (clamped to at least 10)
    pub buffer_size: usize,
    /// How jobs are assigned to workers
    pub strategy: Distribution,
    /// Wall-clock budget for the whole run; `ZERO` means the 5-minute
    /// default
    pub timeout: Duration,
    /// Budget per processor attempt; `ZERO` disables the per-attempt
    /// deadline
    pub worker_timeout: Duration,
    /// Retry attempts after the first failure (total attempts =
    /// `max_retries + 1`)
    pub max_retries: u32,
    /// Gates `get_metrics` exposure; metrics are computed either way
    pub enable_metrics: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_workers: 4,
            buffer_size: 100,
            strategy: Distribution::RoundRobin,
            timeout: Duration::from_secs(5 * 60),
            worker_timeout: Duration::from_secs(30),
            max_retries: 3,
            enable_metrics: true,
        }
    }
}

impl Config {
    /// Returns a copy with out-of-range values clamped.
    ///
    /// `num_workers == 0` becomes 1; `buffer_size == 0` becomes 100 and
    /// anything below 10 becomes 10, so small configurations never block
    /// result emission; a zero `timeout` becomes 5 minutes.
    pub fn validated(mut self) -> Self {
        if self.num_workers == 0 {
            self.num_workers = 1;
        }
        if self.buffer_size == 0 {
            self.buffer_size = 100;
        }
        if self.buffer_size < 10 {
            self.buffer_size = 10;
        }
        if self.timeout.is_zero() {
            self.timeout = Duration::from_secs(5 * 60);
        }
        self
    }
}
