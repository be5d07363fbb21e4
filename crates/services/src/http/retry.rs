use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use reqwest::{RequestBuilder, Response};
use tracing::warn;

/// Exponential backoff for requests whose transport failed.
///
/// Only failures that produced no response are retried. A response with an
/// error status is returned to the caller as is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound of the random delay added to each attempt.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(16),
            max_jitter: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy that never waits, for tests and in-process fakes.
    #[must_use]
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self::immediate(0)
    }

    /// Delay before retry number `retry` (0-based) with a given jitter.
    #[must_use]
    pub fn backoff(&self, retry: u32, jitter: Duration) -> Duration {
        let exponential = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(retry.min(31)));
        exponential.saturating_add(jitter).min(self.max_delay)
    }

    /// Delay before retry number `retry` with random jitter.
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let jitter_ms = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::rng().random_range(0..jitter_ms))
        };
        self.backoff(retry, jitter)
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error, or
    /// the retry budget is spent.
    ///
    /// # Errors
    ///
    /// Returns the last error produced by `operation`.
    pub async fn run<T, E, F, Fut>(
        &self,
        mut operation: F,
        is_retryable: impl Fn(&E) -> bool,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut retries = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if retries < self.max_retries && is_retryable(&err) => {
                    let delay = self.announce_retry(retries, &err);
                    tokio::time::sleep(delay).await;
                    retries += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Send `request`, retrying when no response arrives.
    ///
    /// # Errors
    ///
    /// Returns the last transport error once retries are exhausted.
    pub async fn send_with_retry(&self, request: RequestBuilder) -> Result<Response, reqwest::Error> {
        let mut retries = 0;
        loop {
            // Streaming bodies cannot be replayed, so they get a single attempt.
            let Some(attempt) = request.try_clone() else {
                return request.send().await;
            };
            match attempt.send().await {
                Ok(response) => return Ok(response),
                Err(err) if retries < self.max_retries => {
                    let delay = self.announce_retry(retries, &err);
                    tokio::time::sleep(delay).await;
                    retries += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn announce_retry(&self, retry: u32, err: &dyn Display) -> Duration {
        let delay = self.delay_for(retry);
        warn!(
            attempt = retry + 1,
            max_retries = self.max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "request failed, retrying"
        );
        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0, Duration::ZERO), Duration::from_secs(1));
        assert_eq!(policy.backoff(1, Duration::ZERO), Duration::from_secs(2));
        assert_eq!(policy.backoff(3, Duration::from_millis(500)), Duration::from_millis(8500));
        assert_eq!(policy.backoff(10, Duration::ZERO), Duration::from_secs(16));
        assert_eq!(policy.backoff(40, Duration::ZERO), Duration::from_secs(16));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let policy = RetryPolicy {
            max_delay: Duration::from_secs(60),
            ..RetryPolicy::default()
        };
        for _ in 0..50 {
            let delay = policy.delay_for(1);
            assert!(delay >= Duration::from_secs(2));
            assert!(delay < Duration::from_secs(3));
        }
    }

    #[tokio::test]
    async fn run_retries_until_success() {
        let attempts = AtomicU32::new(0);
        let counter = &attempts;
        let result: Result<u32, String> = RetryPolicy::immediate(2)
            .run(
                move || async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if n < 2 { Err(format!("fail {n}")) } else { Ok(n) }
                },
                |_| true,
            )
            .await;
        assert_eq!(result, Ok(2));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn run_gives_up_after_budget() {
        let attempts = AtomicU32::new(0);
        let counter = &attempts;
        let result: Result<(), String> = RetryPolicy::immediate(2)
            .run(
                move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err("down".to_string())
                },
                |_| true,
            )
            .await;
        assert_eq!(result, Err("down".to_string()));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn run_does_not_retry_rejected_errors() {
        let attempts = AtomicU32::new(0);
        let counter = &attempts;
        let result: Result<(), String> = RetryPolicy::immediate(5)
            .run(
                move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err("status 400".to_string())
                },
                |err| !err.starts_with("status"),
            )
            .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn send_retries_connection_failures() {
        // Port 9 on localhost refuses connections, so every attempt fails fast.
        let client = reqwest::Client::new();
        let request = client.get("http://127.0.0.1:9/unreachable");
        let err = RetryPolicy::immediate(1).send_with_retry(request).await.unwrap_err();
        assert!(err.is_connect() || err.is_request());
    }
}
