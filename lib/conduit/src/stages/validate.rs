//! Pre-dispatch validation.

use conduit_core::{Error, Request, Requirements, Result, Shape, Stage};
use tracing::debug;

/// Stage that rejects requests the pipeline below it cannot honor.
///
/// A request that sets a timeout, a retry policy or a server environment
/// needs a stage below this one that reads that option. A timeout or retry
/// stage with a fixed setting does not count. A GET or HEAD request must not
/// carry a body. Rejected requests never reach the wrapped stage.
#[derive(Debug, Clone)]
pub struct Validate<S> {
    inner: S,
}

impl<S> Validate<S> {
    /// Wrap `inner`.
    #[must_use]
    pub const fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: Stage<Input = Request>> Validate<S> {
    /// Check `request` against the pipeline below.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unmet requirements, and an invalid
    /// request error for a body on a method that forbids one.
    pub fn check(&self, request: &Request) -> Result<()> {
        if let Some(missing) = Requirements::of(request).unmet(self.inner.shape()) {
            debug!(reason = %missing, "request rejected");
            return Err(missing.into());
        }
        let method = request.method();
        if method.forbids_body() && !request.body().is_empty() {
            debug!(%method, "request rejected, body not allowed");
            return Err(Error::invalid_request(format!(
                "{method} request must not have a body"
            )));
        }
        Ok(())
    }
}

impl<S: Stage<Input = Request>> Stage for Validate<S> {
    type Input = Request;
    type Output = S::Output;

    async fn run(&self, request: Request) -> Result<S::Output> {
        self.check(&request)?;
        self.inner.run(request).await
    }

    fn shape(&self) -> Shape {
        self.inner.shape() | Shape::VALIDATE
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use assert2::{check, let_assert};
    use conduit_core::{
        Backoff, ConfigurationError, Method, ServerEnvironment, StageExt, from_fn,
    };

    use super::*;
    use crate::{HttpPipelineExt, PipelineExt};

    fn transport(calls: &Arc<AtomicU32>) -> impl Stage<Input = Request, Output = u16> + Clone {
        let calls = Arc::clone(calls);
        from_fn(move |_: Request| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(200) }
        })
    }

    fn get() -> Request {
        Request::builder(Method::Get)
            .url("https://api.example.com/items")
            .build()
            .expect("valid")
    }

    #[tokio::test]
    async fn timeout_without_timeout_stage_is_rejected() {
        let calls = Arc::new(AtomicU32::new(0));
        let stage = transport(&calls).validated();
        let mut request = get();
        request.set_timeout(Duration::from_secs(1));

        let_assert!(
            Err(Error::Configuration(ConfigurationError::MissingTimeoutStage)) =
                stage.run(request).await
        );
        check!(calls.load(Ordering::SeqCst) == 0);
    }

    #[tokio::test]
    async fn retry_and_environment_need_their_stages() {
        let calls = Arc::new(AtomicU32::new(0));
        let stage = transport(&calls).validated();

        let mut request = get();
        request.set_retry_policy(Backoff::immediately(2).shared());
        let_assert!(
            Err(Error::Configuration(ConfigurationError::MissingRetryStage)) =
                stage.run(request).await
        );

        let mut request = get();
        request.set_server_environment(ServerEnvironment::new());
        let_assert!(
            Err(Error::Configuration(ConfigurationError::MissingServerEnvironmentStage)) =
                stage.run(request).await
        );
        check!(calls.load(Ordering::SeqCst) == 0);
    }

    #[tokio::test]
    async fn passes_when_stages_are_present() {
        let calls = Arc::new(AtomicU32::new(0));
        let stage = transport(&calls)
            .apply_timeout(None)
            .apply_retry(None)
            .apply_server_environment(None)
            .validated();

        let mut request = get();
        request.set_timeout(Duration::from_secs(1));
        request.set_retry_policy(Backoff::immediately(2).shared());
        request.set_server_environment(ServerEnvironment::new());

        check!(stage.run(request).await.expect("valid") == 200);
        check!(calls.load(Ordering::SeqCst) == 1);
        check!(
            stage.shape()
                == Shape::TIMEOUT
                    | Shape::REQUEST_TIMEOUT
                    | Shape::RETRY
                    | Shape::REQUEST_RETRY
                    | Shape::SERVER_ENVIRONMENT
                    | Shape::VALIDATE
        );
    }

    #[tokio::test]
    async fn stages_found_through_pipes() {
        let calls = Arc::new(AtomicU32::new(0));
        let front = from_fn(|request: Request| async move { Ok(request) }).apply_timeout(None);
        let stage = front.pipe(transport(&calls)).validated();

        let mut request = get();
        request.set_timeout(Duration::from_secs(1));

        check!(stage.run(request).await.is_ok());
        check!(calls.load(Ordering::SeqCst) == 1);
    }

    #[tokio::test]
    async fn fixed_timeout_does_not_honor_request_timeout() {
        let calls = Arc::new(AtomicU32::new(0));
        let front = from_fn(|request: Request| async move { Ok(request) })
            .timeout(Duration::from_secs(5));
        let stage = front.pipe(transport(&calls)).validated();

        let mut request = get();
        request.set_timeout(Duration::from_secs(1));

        let_assert!(
            Err(Error::Configuration(ConfigurationError::MissingTimeoutStage)) =
                stage.run(request).await
        );
        check!(calls.load(Ordering::SeqCst) == 0);
        check!(stage.shape().contains(Shape::TIMEOUT));
    }

    #[tokio::test]
    async fn fixed_retry_does_not_honor_request_policy() {
        let calls = Arc::new(AtomicU32::new(0));
        let stage = transport(&calls)
            .retry(Backoff::immediately(3))
            .validated();

        let mut request = get();
        request.set_retry_policy(Backoff::immediately(2).shared());

        let_assert!(
            Err(Error::Configuration(ConfigurationError::MissingRetryStage)) =
                stage.run(request).await
        );
        check!(calls.load(Ordering::SeqCst) == 0);

        // requests without a retry policy still pass
        check!(stage.run(get()).await.expect("valid") == 200);
    }

    #[tokio::test]
    async fn get_with_body_is_rejected() {
        let calls = Arc::new(AtomicU32::new(0));
        let stage = transport(&calls).validated();
        let request = Request::builder(Method::Get)
            .url("https://api.example.com/items")
            .body("payload")
            .build()
            .expect("valid");

        let_assert!(Err(Error::InvalidRequest(message)) = stage.run(request).await);
        check!(message == "GET request must not have a body");
        check!(calls.load(Ordering::SeqCst) == 0);
    }

    #[tokio::test]
    async fn post_with_body_is_accepted() {
        let calls = Arc::new(AtomicU32::new(0));
        let stage = transport(&calls).validated();
        let request = Request::builder(Method::Post)
            .url("https://api.example.com/items")
            .body("payload")
            .build()
            .expect("valid");

        check!(stage.run(request).await.is_ok());
    }
}
