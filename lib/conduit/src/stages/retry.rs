//! Retry with backoff.

use std::fmt;
use std::sync::Arc;

use conduit_core::{Request, Result, Shape, SharedRetryPolicy, Stage};
use tracing::debug;

/// Resolves the retry policy that applies to one input.
pub type PolicyResolver<I> = Arc<dyn Fn(&I) -> Option<SharedRetryPolicy> + Send + Sync>;

/// Stage that re-runs the stage it wraps while its retry policy asks for it.
///
/// Configuration errors are never retried. When the policy gives up, the last
/// error is returned unchanged.
pub struct Retry<S: Stage> {
    inner: S,
    resolve: PolicyResolver<S::Input>,
    marker: Shape,
}

impl<S: Stage> Retry<S> {
    /// Wrap `inner`, resolving the policy of each input with `resolve`.
    ///
    /// The resolver may ignore request options, so this stage does not
    /// satisfy a request that sets its own retry policy.
    #[must_use]
    pub fn new(inner: S, resolve: PolicyResolver<S::Input>) -> Self {
        Self {
            inner,
            resolve,
            marker: Shape::RETRY,
        }
    }
}

impl<S: Stage<Input = Request>> Retry<S> {
    /// Wrap `inner`, applying the retry policy option of each request, or `default`.
    #[must_use]
    pub fn from_request(inner: S, default: Option<SharedRetryPolicy>) -> Self {
        Self {
            inner,
            resolve: Arc::new(move |request: &Request| {
                request.retry_policy().cloned().or_else(|| default.clone())
            }),
            marker: Shape::RETRY | Shape::REQUEST_RETRY,
        }
    }
}

impl<S: Stage + fmt::Debug> fmt::Debug for Retry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retry")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<S> Stage for Retry<S>
where
    S: Stage,
    S::Input: Clone,
{
    type Input = S::Input;
    type Output = S::Output;

    async fn run(&self, input: S::Input) -> Result<S::Output> {
        let policy = (self.resolve)(&input);
        let mut attempts = 0_u32;

        loop {
            attempts = attempts.saturating_add(1);
            let error = match self.inner.run(input.clone()).await {
                Ok(output) => return Ok(output),
                Err(error) => error,
            };
            if error.is_configuration() {
                return Err(error);
            }
            let Some(delay) = policy
                .as_ref()
                .and_then(|policy| policy.retry_delay(&error, attempts))
            else {
                return Err(error);
            };

            let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
            debug!(attempts, delay_ms, error = %error, "retrying after failure");
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    fn shape(&self) -> Shape {
        self.inner.shape() | self.marker
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use assert2::{check, let_assert};
    use conduit_core::{Backoff, ConfigurationError, Error, from_fn};
    use tokio::time::Instant;

    use super::*;
    use crate::PipelineExt;

    /// Fails `failures` times with a connection error, then echoes its input.
    fn flaky(calls: &Arc<AtomicU32>, failures: u32) -> impl Stage<Input = u32, Output = u32> {
        let calls = Arc::clone(calls);
        from_fn(move |value: u32| {
            let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if call <= failures {
                    Err(Error::connection(format!("failure {call}")))
                } else {
                    Ok(value)
                }
            }
        })
    }

    #[tokio::test]
    async fn succeeds_after_two_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let stage = flaky(&calls, 2).retry(Backoff::constant(Duration::ZERO, 3));

        check!(stage.run(9).await.expect("success") == 9);
        check!(calls.load(Ordering::SeqCst) == 3);
    }

    #[tokio::test]
    async fn returns_last_error_when_exhausted() {
        let calls = Arc::new(AtomicU32::new(0));
        let stage = flaky(&calls, u32::MAX).retry(Backoff::constant(Duration::ZERO, 2));

        let_assert!(Err(Error::Connection(message)) = stage.run(1).await);
        check!(message == "failure 2");
        check!(calls.load(Ordering::SeqCst) == 2);
    }

    #[tokio::test]
    async fn zero_max_attempts_runs_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let stage = flaky(&calls, u32::MAX).retry(Backoff::immediately(0));

        check!(stage.run(1).await.is_err());
        check!(calls.load(Ordering::SeqCst) == 1);
    }

    #[tokio::test]
    async fn configuration_errors_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let stage = from_fn(move |_: u32| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err::<u32, _>(ConfigurationError::MissingTimeoutStage.into()) }
        })
        .retry(Backoff::new(|_, _| Some(Duration::ZERO)));

        let_assert!(Err(Error::Configuration(_)) = stage.run(1).await);
        check!(calls.load(Ordering::SeqCst) == 1);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_between_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let stage =
            flaky(&calls, 3).retry(Backoff::exponential(Duration::from_millis(100), 2, 10));

        let start = Instant::now();
        check!(stage.run(4).await.expect("success") == 4);

        // 100 + 200 + 400
        check!(start.elapsed() >= Duration::from_millis(700));
        check!(start.elapsed() < Duration::from_millis(800));
    }

    #[tokio::test]
    async fn no_policy_means_no_retry() {
        let calls = Arc::new(AtomicU32::new(0));
        let stage = flaky(&calls, 1).retry_with(|_: &u32| None);

        check!(stage.run(1).await.is_err());
        check!(calls.load(Ordering::SeqCst) == 1);
        check!(stage.shape().contains(Shape::RETRY));
    }
}
