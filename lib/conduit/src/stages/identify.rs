//! Request identity.

use std::fmt;
use std::sync::Arc;

use conduit_core::{Request, RequestId, Result, Shape, Stage};
use uuid::Uuid;

/// Generates the identity of a request.
pub type IdGenerator = Arc<dyn Fn(&Request) -> RequestId + Send + Sync>;

/// Random UUID v4 identity.
#[must_use]
pub fn uuid_request_id(_: &Request) -> RequestId {
    RequestId::from(Uuid::new_v4().to_string())
}

/// Stage that stamps every request with a fresh [`RequestId`].
///
/// The identity lives in the request options, so it stays the same across
/// the retries of stages below.
pub struct Identify<S> {
    inner: S,
    generate: IdGenerator,
}

impl<S> Identify<S> {
    /// Wrap `inner`, generating identities with `generate`.
    #[must_use]
    pub fn new(inner: S, generate: IdGenerator) -> Self {
        Self { inner, generate }
    }
}

impl<S: fmt::Debug> fmt::Debug for Identify<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identify")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<S: Stage<Input = Request>> Stage for Identify<S> {
    type Input = Request;
    type Output = S::Output;

    fn run(&self, mut request: Request) -> impl Future<Output = Result<S::Output>> + Send {
        let id = (self.generate)(&request);
        request.set_id(id);
        self.inner.run(request)
    }

    fn shape(&self) -> Shape {
        self.inner.shape() | Shape::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;
    use conduit_core::{Method, from_fn};

    use super::*;
    use crate::HttpPipelineExt;

    fn echo_id() -> impl Stage<Input = Request, Output = Option<RequestId>> {
        from_fn(|request: Request| async move { Ok(request.id().cloned()) })
    }

    #[tokio::test]
    async fn stamps_uuid_by_default() {
        let stage = echo_id().identified();

        let id = stage
            .run(Request::new(Method::Get, "/"))
            .await
            .expect("run")
            .expect("identity");
        check!(Uuid::parse_str(id.as_str()).is_ok());
        check!(stage.shape() == Shape::IDENTITY);
    }

    #[tokio::test]
    async fn custom_generator_sees_request() {
        let stage = echo_id().identified_with(|request: &Request| {
            RequestId::from(format!("{}-{}", request.method(), request.path()))
        });

        let id = stage
            .run(Request::new(Method::Delete, "/items/3"))
            .await
            .expect("run");
        check!(id == Some(RequestId::from("DELETE-/items/3")));
    }

    #[tokio::test]
    async fn every_call_gets_a_new_identity() {
        let stage = echo_id().identified();
        let first = stage.run(Request::new(Method::Get, "/")).await.expect("run");
        let second = stage.run(Request::new(Method::Get, "/")).await.expect("run");
        check!(first != second);
    }
}
