//! Bridges between stages and tower services.
//!
//! [`ServiceStage`] runs a tower [`Service`] as a stage, so tower middleware
//! can sit inside a pipeline. [`StageService`] goes the other way and exposes
//! a pipeline wherever a tower service is expected.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::task::{Context, Poll};

use conduit_core::{Error, Result, Stage};
use futures_util::future::BoxFuture;
use tower::ServiceExt;
use tower_service::Service;

/// Stage running a tower service on inputs of type `I`.
///
/// Every call runs on a clone of the service, readied with
/// [`ServiceExt::oneshot`], so concurrent calls never contend on `&mut self`.
pub struct ServiceStage<S, I> {
    service: S,
    _input: PhantomData<fn(I)>,
}

impl<S, I> ServiceStage<S, I> {
    /// Wrap `service`.
    #[must_use]
    pub const fn new(service: S) -> Self {
        Self {
            service,
            _input: PhantomData,
        }
    }
}

impl<S: Clone, I> Clone for ServiceStage<S, I> {
    fn clone(&self) -> Self {
        Self::new(self.service.clone())
    }
}

impl<S, I> fmt::Debug for ServiceStage<S, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceStage").finish_non_exhaustive()
    }
}

impl<S, I> Stage for ServiceStage<S, I>
where
    S: Service<I> + Clone + Send + Sync,
    S::Response: Send,
    S::Error: Into<Error>,
    S::Future: Send,
    I: Send,
{
    type Input = I;
    type Output = S::Response;

    async fn run(&self, input: I) -> Result<S::Response> {
        self.service.clone().oneshot(input).await.map_err(Into::into)
    }
}

/// Tower service running a stage.
///
/// Always ready: backpressure belongs to the throttle stage.
pub struct StageService<S> {
    stage: Arc<S>,
}

impl<S> StageService<S> {
    /// Wrap `stage`.
    #[must_use]
    pub fn new(stage: S) -> Self {
        Self {
            stage: Arc::new(stage),
        }
    }
}

impl<S> Clone for StageService<S> {
    fn clone(&self) -> Self {
        Self {
            stage: Arc::clone(&self.stage),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for StageService<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageService")
            .field("stage", &self.stage)
            .finish()
    }
}

impl<S> Service<S::Input> for StageService<S>
where
    S: Stage + 'static,
    S::Input: 'static,
{
    type Response = S::Output;
    type Error = Error;
    type Future = BoxFuture<'static, Result<S::Output>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, input: S::Input) -> Self::Future {
        let stage = Arc::clone(&self.stage);
        Box::pin(async move { stage.run(input).await })
    }
}
