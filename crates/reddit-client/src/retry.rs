//! Bounded retry with a per-attempt timeout and exponential backoff.

use std::future::Future;
use std::time::Duration;

use crate::error::RedditError;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Deadline for each individual attempt.
    pub attempt_timeout: Duration,
    /// Delay after the first failure; doubles after each subsequent one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(8),
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt following failed attempt `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Run `op` until it succeeds or `policy.max_attempts` is reached.
///
/// Only [transient](RedditError::is_transient) failures are retried.
///
/// # Errors
///
/// Returns a non-transient failure as is, without backing off. Returns
/// [`RedditError::RetriesExhausted`] wrapping the last failure once every
/// attempt has failed or timed out.
pub async fn with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, RedditError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RedditError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        let result = match tokio::time::timeout(policy.attempt_timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(RedditError::Timeout(policy.attempt_timeout)),
        };

        match result {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!("{} succeeded on attempt {}", label, attempt + 1);
                }
                return Ok(value);
            }
            Err(e) if !e.is_transient() => {
                tracing::error!("{} failed: {}", label, e);
                return Err(e);
            }
            Err(e) => {
                tracing::warn!("{} attempt {} failed: {}", label, attempt + 1, e);

                if attempt + 1 >= max_attempts {
                    return Err(RedditError::RetriesExhausted {
                        attempts: attempt + 1,
                        last: Box::new(e),
                    });
                }

                let delay = policy.delay_for(attempt);
                tracing::debug!("{} retrying in {:?}", label, delay);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
