//! Retrying transient request failures with capped exponential backoff.

use std::future::Future;
use std::time::Duration;

#[cfg(feature = "metrics")]
use metrics::counter;

use crate::config;
use crate::Result;

/// How often, and how patiently, a failed request is repeated.
///
/// Only errors for which [`Error::is_retryable`](crate::Error::is_retryable)
/// holds are retried. The wait before retry `n` is
/// `initial_delay * multiplier^(n - 1)`, never more than `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `0` sends each request once.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: config::default_max_retries(),
            initial_delay: Duration::from_millis(500),
            multiplier: 2.0,
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// The wait before the given 1-based retry.
    pub fn delay_for(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs.max(0.0))
    }

    /// Runs `attempt` until it succeeds, fails permanently, or the retries
    /// are used up. The last error is returned in the latter two cases.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retry = 0;
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && retry < self.max_retries => {
                    retry += 1;
                    let delay = self.delay_for(retry);

                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        operation,
                        retry,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "request failed, retrying"
                    );
                    #[cfg(feature = "metrics")]
                    counter!("ollama_forge.retries_total", "operation" => operation).increment(1);
                    #[cfg(not(any(feature = "tracing", feature = "metrics")))]
                    let _ = (operation, &err);

                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::Error;

    fn quick() -> RetryPolicy {
        RetryPolicy::default()
            .max_retries(3)
            .initial_delay(Duration::ZERO)
    }

    #[test]
    fn delays_grow_exponentially() {
        let policy = RetryPolicy::default()
            .initial_delay(Duration::from_millis(100))
            .multiplier(2.0)
            .max_delay(Duration::from_secs(60));

        assert_eq!(policy.delay_for(0), Duration::ZERO);
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
    }

    #[test]
    fn delays_are_capped() {
        let policy = RetryPolicy::default()
            .initial_delay(Duration::from_secs(1))
            .max_delay(Duration::from_secs(5));

        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
        assert_eq!(policy.delay_for(4), Duration::from_secs(5));
        assert_eq!(policy.delay_for(200), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn transient_errors_are_retried_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = quick()
            .run("test", move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Error::Connection("refused".into()))
                } else {
                    Ok("ok")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = quick()
            .run("test", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(Error::Server {
                    status: 503,
                    message: "loading".into(),
                })
            })
            .await;

        assert!(matches!(result, Err(Error::Server { status: 503, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = quick()
            .run("test", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(Error::ModelNotFound("llama9".into()))
            })
            .await;

        assert!(matches!(result, Err(Error::ModelNotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_between_attempts() {
        let policy = RetryPolicy::default()
            .max_retries(2)
            .initial_delay(Duration::from_secs(1));
        let started = tokio::time::Instant::now();

        let _: Result<()> = policy
            .run("test", || async { Err(Error::Timeout("slow".into())) })
            .await;

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(3));
        assert!(elapsed < Duration::from_millis(3100));
    }
}
