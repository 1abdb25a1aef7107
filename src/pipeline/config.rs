//! Pipeline configuration surface

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::retry::RetryPolicy;

/// Which failing processors the retry policy applies to within one walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryScope {
    /// Every failing processor in the chain is retried
    AllProcessors,
    /// Only the first failing processor is retried; later failures in the
    /// same walk fail fast
    FirstFailureOnly,
}

/// Tunables for the pipeline manager and dispatch engine
///
/// `max_queue_size` of 0 rejects every submission; the default is effectively
/// unbounded. `max_concurrency` above 1 lets the consumer fan out message
/// passes to a bounded worker pool; the per-message processor walk stays
/// sequential regardless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub max_queue_size: usize,
    pub enable_retry: bool,
    pub max_retry_attempts: usize,
    pub retry_delay: Duration,
    pub retry_scope: RetryScope,
    /// Per-attempt bound on a processor invocation; `None` disables it
    pub processing_timeout: Option<Duration>,
    pub enable_statistics: bool,
    pub max_concurrency: usize,
    pub max_history_entries: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_queue_size: usize::MAX,
            enable_retry: false,
            max_retry_attempts: 3,
            retry_delay: Duration::from_millis(500),
            retry_scope: RetryScope::AllProcessors,
            processing_timeout: Some(Duration::from_secs(30)),
            enable_statistics: true,
            max_concurrency: 1,
            max_history_entries: 1000,
        }
    }
}

impl PipelineConfig {
    /// Clamp out-of-range values instead of erroring: at least one attempt,
    /// at least one worker
    pub fn normalized(mut self) -> Self {
        self.max_retry_attempts = self.max_retry_attempts.max(1);
        self.max_concurrency = self.max_concurrency.max(1);
        self
    }

    /// Retry settings as a [`RetryPolicy`]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retry_attempts.max(1),
            delay: self.retry_delay,
        }
    }
}
