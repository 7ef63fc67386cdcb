//! Retry-with-backoff decorator around a [`Transport`].

use std::time::Duration;

use tracing::warn;

use super::error::TransportError;
use super::transport::{RawResponse, Transport};

/// Bounded exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,

    /// Delay before the first retry. Doubles for each following retry.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Policy that never retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay before retry number `retry` (zero-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_secs(1))
    }
}

/// Transport that retries transient failures of the wrapped transport.
///
/// Non-transient errors (4xx other than 429, bad credentials) are returned
/// immediately.
#[derive(Debug, Clone)]
pub struct RetryingTransport<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T> RetryingTransport<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

impl<T: Transport> Transport for RetryingTransport<T> {
    async fn request(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<RawResponse, TransportError> {
        let mut retry = 0;
        loop {
            match self.inner.request(path, query).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && retry < self.policy.max_retries => {
                    let delay = self.policy.delay_for(retry);
                    retry += 1;
                    warn!(
                        path,
                        attempt = retry,
                        max_retries = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "upstream request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays a fixed script of outcomes.
    struct Scripted {
        outcomes: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(outcomes: Vec<Result<RawResponse, TransportError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Transport for Scripted {
        async fn request(
            &self,
            _path: &str,
            _query: &[(&str, String)],
        ) -> Result<RawResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(TransportError::Timeout))
        }
    }

    fn ok() -> Result<RawResponse, TransportError> {
        Ok(RawResponse {
            status: 200,
            body: "{}".into(),
        })
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_then_succeeds() {
        let transport = RetryingTransport::new(
            Scripted::new(vec![Err(TransportError::Timeout), ok()]),
            RetryPolicy::default(),
        );

        let start = tokio::time::Instant::now();
        let result = transport.request("/pid/departureboards", &[]).await;

        assert!(result.is_ok());
        assert_eq!(transport.inner().calls(), 2);
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let transport = RetryingTransport::new(
            Scripted::new(vec![
                Err(TransportError::Network("reset".into())),
                Err(TransportError::Network("reset".into())),
                Err(TransportError::Network("reset".into())),
                ok(),
            ]),
            RetryPolicy::default(),
        );

        let start = tokio::time::Instant::now();
        let result = transport.request("/", &[]).await;

        assert_eq!(result, Err(TransportError::Network("reset".into())));
        assert_eq!(transport.inner().calls(), 3);
        // 1s + 2s of backoff
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_retry_permanent_errors() {
        let transport = RetryingTransport::new(
            Scripted::new(vec![Err(TransportError::Unauthorized), ok()]),
            RetryPolicy::default(),
        );

        let result = transport.request("/", &[]).await;

        assert_eq!(result, Err(TransportError::Unauthorized));
        assert_eq!(transport.inner().calls(), 1);
    }

    #[tokio::test]
    async fn no_retry_policy_makes_one_attempt() {
        let transport = RetryingTransport::new(
            Scripted::new(vec![Err(TransportError::Timeout), ok()]),
            RetryPolicy::none(),
        );

        assert_eq!(transport.request("/", &[]).await, Err(TransportError::Timeout));
        assert_eq!(transport.inner().calls(), 1);
    }
}
