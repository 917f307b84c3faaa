//! Bounded retry with randomized backoff
//!
//! [`RetryPolicy::run`] wraps any fallible async operation. Errors the caller
//! classifies as retryable are retried up to `max_attempts` times in total,
//! sleeping `base_wait * (1 + U)` (U uniform in [0, 1)) between attempts.
//! When attempts run out the result is `Ok(None)`: exhaustion is an expected
//! outcome, not an error. Non-retryable errors are returned immediately.

use crate::config::RetryConfig;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Immutable retry parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_wait: Duration,
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is clamped to at least one
    pub fn new(max_attempts: u32, base_wait: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_wait,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::try_from_secs_f64(config.base_wait_secs.max(0.0))
                .unwrap_or(Duration::MAX),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_wait(&self) -> Duration {
        self.base_wait
    }

    /// Draws one randomized backoff in `[base_wait, 2 * base_wait)`, saturating
    pub fn backoff(&self) -> Duration {
        let secs = self.base_wait.as_secs_f64() * (1.0 + rand::random::<f64>());
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Runs `operation` under this policy
    ///
    /// # Returns
    ///
    /// * `Ok(Some(value))` - An attempt succeeded
    /// * `Ok(None)` - Every attempt failed with a retryable error
    /// * `Err(error)` - An attempt failed with a non-retryable error
    pub async fn run<T, E, F, Fut, P>(&self, mut operation: F, is_retryable: P) -> Result<Option<T>, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        for attempt in 1..=self.max_attempts {
            match operation().await {
                Ok(value) => return Ok(Some(value)),
                Err(e) if is_retryable(&e) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        "Retryable failure: {}",
                        e
                    );
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.backoff()).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Ok(None)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    enum TestError {
        Transient,
        Fatal,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    fn is_transient(e: &TestError) -> bool {
        matches!(e, TestError::Transient)
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let calls = AtomicU32::new(0);

        let result = policy
            .run(
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, TestError>("page")
                },
                is_transient,
            )
            .await;

        assert!(matches!(result, Ok(Some("page"))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_always_retryable_is_attempted_exactly_max_times() {
        let policy = RetryPolicy::new(4, Duration::ZERO);
        let calls = AtomicU32::new(0);

        let result = policy
            .run(
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(TestError::Transient)
                },
                is_transient,
            )
            .await;

        assert!(matches!(result, Ok(None)));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let calls = AtomicU32::new(0);

        let result = policy
            .run(
                || async {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(TestError::Transient)
                    } else {
                        Ok(42)
                    }
                },
                is_transient,
            )
            .await;

        assert!(matches!(result, Ok(Some(42))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_propagates_immediately() {
        let policy = RetryPolicy::new(5, Duration::ZERO);
        let calls = AtomicU32::new(0);

        let result = policy
            .run(
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(TestError::Fatal)
                },
                is_transient,
            )
            .await;

        assert!(matches!(result, Err(TestError::Fatal)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.max_attempts(), 1);
    }

    #[test]
    fn test_backoff_stays_within_jitter_window() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        for _ in 0..100 {
            let wait = policy.backoff();
            assert!(wait >= Duration::from_millis(100));
            assert!(wait < Duration::from_millis(200));
        }
    }

    #[test]
    fn test_from_config_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.base_wait(), Duration::from_secs(5));
    }

    #[test]
    fn test_oversized_base_wait_saturates() {
        let config = RetryConfig {
            base_wait_secs: 1e300,
            ..RetryConfig::default()
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.base_wait(), Duration::MAX);
        assert_eq!(policy.backoff(), Duration::MAX);
    }
}
