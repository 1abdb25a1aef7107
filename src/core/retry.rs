//! Retry utility for handling transient errors in async operations
//!
//! Provides a configurable retry policy with fixed delay between attempts.
//! The dispatch engine reuses [`RetryPolicy`] but drives its own attempt loop
//! because it needs per-attempt timeouts and retry accounting; `retry_async`
//! is the general-purpose form used elsewhere (e.g. token renewal).

use std::time::Duration;
use tokio::time::sleep;

/// Configurable retry policy for async operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}

/// Execute an async operation with retry logic for transient errors
///
/// Attempts the operation up to `policy.max_attempts` times, sleeping
/// `policy.delay` between attempts. Only the final failure is returned;
/// intermediate failures are logged at debug level.
pub async fn retry_async<F, T, E, Fut>(
    operation_name: &str,
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut last_error = None;

    for attempt in 0..policy.max_attempts {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) => {
                last_error = Some(error);
                if attempt < policy.max_attempts - 1 {
                    log::debug!(
                        "Operation '{}' failed on attempt {}/{}, retrying in {:?}: {}",
                        operation_name,
                        attempt + 1,
                        policy.max_attempts,
                        policy.delay,
                        last_error.as_ref().unwrap()
                    );
                    sleep(policy.delay).await;
                }
            }
        }
    }

    Err(last_error.unwrap())
}
