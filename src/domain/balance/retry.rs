//! Bounded retry with a fixed delay between attempts

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Retry configuration. No backoff: every wait is `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }

    /// Policy used for balance polling: 3 attempts, 2 s apart
    pub fn balance_polling() -> Self {
        Self::new(3, Duration::from_millis(2000))
    }

    /// Run `op` until it succeeds or attempts run out. The last error is returned as is.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= max_attempts => return Err(e),
                Err(e) => {
                    warn!("Retrying {}... Attempt {} failed: {}", label, attempt, e);
                    sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::ZERO);

        let result: Result<u32, String> = policy
            .run("test", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(format!("fail {}", n))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_surfaces_last_error() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::ZERO);

        let result: Result<(), String> = policy
            .run("test", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(format!("fail {}", n))
            })
            .await;

        assert_eq!(result, Err("fail 3".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(0, Duration::ZERO);

        let result: Result<(), &str> = policy
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("nope")
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_fixed_delay_between_attempts() {
        let policy = RetryPolicy::balance_polling();
        let start = Instant::now();

        let result: Result<(), &str> = policy.run("test", || async { Err("down") }).await;

        assert!(result.is_err());
        // Two waits between three attempts, none after the last one.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(4000));
        assert!(elapsed < Duration::from_millis(6000));
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_millis(1000));
    }
}
