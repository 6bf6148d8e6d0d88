//! Retry policy for individual API queries
//!
//! A poll re-queries the platform anyway, so by default a failed query is
//! not retried. With `max_retries > 0`, transient failures are retried with
//! exponential backoff: attempt `n` waits `first × factor^n`, capped at `max`.

use std::future::Future;
use std::time::Duration;

use queue_client::ClientError;
use tracing::warn;

/// Growth factor between consecutive retry delays
const BACKOFF_FACTOR: f64 = 2.0;

/// Bounded retry-with-backoff policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub first: Duration,
    /// Maximum delay cap
    pub max: Duration,
    /// Multiplicative growth factor
    pub factor: f64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, first: Duration, max: Duration) -> Self {
        Self {
            max_retries,
            first,
            max,
            factor: BACKOFF_FACTOR,
        }
    }

    /// A single attempt, no retries
    pub fn none() -> Self {
        Self::new(0, Duration::from_secs(1), Duration::from_secs(30))
    }

    /// Delay before retry number `attempt` (0-indexed)
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = attempt.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    /// Runs `query`, retrying transient failures
    ///
    /// Non-transient errors and the error of the last allowed attempt are
    /// returned unchanged.
    pub async fn run<T, F, Fut>(&self, what: &str, mut query: F) -> Result<T, ClientError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let mut attempt = 0;

        loop {
            match query().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.delay(attempt);
                    attempt += 1;
                    warn!(
                        "Failed to {} (attempt {}/{}): {}",
                        what,
                        attempt,
                        self.max_retries + 1,
                        e
                    );
                    warn!("Retrying in {:?}...", delay);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(1), Duration::from_millis(4))
    }

    #[test]
    fn test_delay_grows_and_caps() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100), Duration::from_secs(1));
        assert_eq!(policy.delay(0), Duration::from_millis(100));
        assert_eq!(policy.delay(1), Duration::from_millis(200));
        assert_eq!(policy.delay(2), Duration::from_millis(400));
        assert_eq!(policy.delay(4), Duration::from_secs(1));
        assert_eq!(policy.delay(u32::MAX), Duration::from_secs(1));
    }

    #[test]
    fn test_none_has_no_retries() {
        assert_eq!(RetryPolicy::none().max_retries, 0);
        assert_eq!(RetryPolicy::default(), RetryPolicy::none());
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = fast(3)
            .run("list jobs", move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ClientError::api_error(502, "Bad Gateway"))
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_budget_exhaustion_returns_last_error() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = fast(2)
            .run("list jobs", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ClientError::api_error(503, "Service Unavailable"))
            })
            .await;

        assert!(matches!(result, Err(ClientError::ApiError { status: 503, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fatal_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = fast(5)
            .run("list jobs", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ClientError::api_error(401, "401 Unauthorized"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_retry_policy_makes_one_attempt() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = RetryPolicy::none()
            .run("list jobs", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ClientError::api_error(500, "boom"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
