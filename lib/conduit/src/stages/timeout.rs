//! Deadlines.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use conduit_core::{Error, Request, Result, Shape, Stage};
use tracing::debug;

/// Resolves the deadline that applies to one input.
pub type DeadlineResolver<I> = Arc<dyn Fn(&I) -> Option<Duration> + Send + Sync>;

/// Stage that cancels the stage it wraps when a deadline elapses.
///
/// Cancellation drops the wrapped execution and returns [`Error::Timeout`].
/// Inputs without a deadline run to completion.
pub struct Timeout<S: Stage> {
    inner: S,
    resolve: DeadlineResolver<S::Input>,
    marker: Shape,
}

impl<S: Stage> Timeout<S> {
    /// Wrap `inner`, resolving the deadline of each input with `resolve`.
    ///
    /// The resolver may ignore request options, so this stage does not
    /// satisfy a request that sets its own timeout.
    #[must_use]
    pub fn new(inner: S, resolve: DeadlineResolver<S::Input>) -> Self {
        Self {
            inner,
            resolve,
            marker: Shape::TIMEOUT,
        }
    }
}

impl<S: Stage<Input = Request>> Timeout<S> {
    /// Wrap `inner`, enforcing the timeout option of each request, or `default`.
    #[must_use]
    pub fn from_request(inner: S, default: Option<Duration>) -> Self {
        Self {
            inner,
            resolve: Arc::new(move |request: &Request| request.timeout().or(default)),
            marker: Shape::TIMEOUT | Shape::REQUEST_TIMEOUT,
        }
    }
}

impl<S: Stage + fmt::Debug> fmt::Debug for Timeout<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeout")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<S: Stage> Stage for Timeout<S> {
    type Input = S::Input;
    type Output = S::Output;

    async fn run(&self, input: S::Input) -> Result<S::Output> {
        let Some(deadline) = (self.resolve)(&input) else {
            return self.inner.run(input).await;
        };

        if let Ok(result) = tokio::time::timeout(deadline, self.inner.run(input)).await {
            result
        } else {
            let deadline_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX);
            debug!(deadline_ms, "deadline elapsed, execution cancelled");
            Err(Error::Timeout)
        }
    }

    fn shape(&self) -> Shape {
        self.inner.shape() | self.marker
    }
}
