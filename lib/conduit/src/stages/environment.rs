//! Server environment resolution.

use conduit_core::{Request, Result, ServerEnvironment, Shape, Stage};

/// Stage that rewrites requests with their server environment.
///
/// The environment set on the request wins over the stage default. Requests
/// with neither pass through unchanged.
#[derive(Debug, Clone)]
pub struct ApplyServerEnvironment<S> {
    inner: S,
    default: Option<ServerEnvironment>,
}

impl<S> ApplyServerEnvironment<S> {
    /// Wrap `inner`, falling back to `default` for requests without an environment.
    #[must_use]
    pub const fn new(inner: S, default: Option<ServerEnvironment>) -> Self {
        Self { inner, default }
    }
}

impl<S: Stage<Input = Request>> Stage for ApplyServerEnvironment<S> {
    type Input = Request;
    type Output = S::Output;

    fn run(&self, mut request: Request) -> impl Future<Output = Result<S::Output>> + Send {
        let environment = request
            .server_environment()
            .or(self.default.as_ref())
            .cloned();
        if let Some(environment) = environment {
            environment.apply(&mut request);
        }
        self.inner.run(request)
    }

    fn shape(&self) -> Shape {
        self.inner.shape() | Shape::SERVER_ENVIRONMENT
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;
    use conduit_core::header::{HeaderName, HeaderValue};
    use conduit_core::{Method, from_fn};

    use super::*;
    use crate::HttpPipelineExt;

    fn echo_url() -> impl Stage<Input = Request, Output = String> {
        from_fn(|request: Request| async move { Ok(request.url()?.to_string()) })
    }

    fn production() -> ServerEnvironment {
        ServerEnvironment::new()
            .host("prod.example.com")
            .path_prefix("v1")
    }

    #[tokio::test]
    async fn default_environment_applies() {
        let stage = echo_url().apply_server_environment(Some(production()));
        let request = Request::builder(Method::Get)
            .path("endpoint")
            .query("q", "search")
            .build()
            .expect("valid");

        check!(stage.run(request).await.expect("run") == "https://prod.example.com/v1/endpoint?q=search");
    }

    #[tokio::test]
    async fn request_environment_wins_over_default() {
        let stage = echo_url().apply_server_environment(Some(production()));
        let staging = ServerEnvironment::new()
            .host("staging.example.com")
            .header(
                HeaderName::from_static("x-env"),
                HeaderValue::from_static("staging"),
            );
        let request = Request::builder(Method::Get)
            .path("/endpoint")
            .server_environment(staging)
            .build()
            .expect("valid");

        check!(stage.run(request).await.expect("run") == "https://staging.example.com/endpoint");
    }

    #[tokio::test]
    async fn no_environment_passes_through() {
        let stage = echo_url().apply_server_environment(None);
        let request = Request::builder(Method::Get)
            .url("https://api.example.com/a")
            .build()
            .expect("valid");

        check!(stage.run(request).await.expect("run") == "https://api.example.com/a");
        check!(stage.shape() == Shape::SERVER_ENVIRONMENT);
    }
}
