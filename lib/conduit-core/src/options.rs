//! Per-request options.
//!
//! Options attach request-scoped configuration (identity, timeout, retry policy,
//! server environment, or any user-defined value) to a [`Request`] without
//! widening it. They are keyed by type and never serialized to the wire.

use std::fmt;
use std::time::Duration;

use derive_more::{Display, From};
use http::Extensions;

use crate::{ConfigurationError, Request, ServerEnvironment, Shape, SharedRetryPolicy};

/// Type-keyed bag of request options.
#[derive(Clone, Default)]
pub struct Options {
    extensions: Extensions,
}

impl Options {
    /// Empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the previous value of the same type.
    pub fn insert<T>(&mut self, value: T) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.extensions.insert(value)
    }

    /// Value of type `T`, if set.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get()
    }

    /// Remove and return the value of type `T`.
    pub fn remove<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions.remove()
    }

    /// Returns `true` if no option is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Number of options set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Remove every option.
    pub fn clear(&mut self) {
        self.extensions.clear();
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("len", &self.extensions.len())
            .finish()
    }
}

// ============================================================================
// Built-in Keys
// ============================================================================

/// Identity of a request, stable across retries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, From)]
pub struct RequestId(String);

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl RequestId {
    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy)]
struct RequestTimeout(Duration);

#[derive(Debug, Clone)]
struct RequestRetryPolicy(SharedRetryPolicy);

impl Request {
    /// Identity of this request.
    #[must_use]
    pub fn id(&self) -> Option<&RequestId> {
        self.options().get()
    }

    /// Set the identity of this request.
    pub fn set_id(&mut self, id: impl Into<RequestId>) {
        self.options_mut().insert(id.into());
    }

    /// Deadline requested for this request.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.options().get::<RequestTimeout>().map(|t| t.0)
    }

    /// Request a deadline, honored by the timeout stage.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.options_mut().insert(RequestTimeout(timeout));
    }

    /// Retry policy requested for this request.
    #[must_use]
    pub fn retry_policy(&self) -> Option<&SharedRetryPolicy> {
        self.options().get::<RequestRetryPolicy>().map(|p| &p.0)
    }

    /// Request a retry policy, honored by the retry stage.
    pub fn set_retry_policy(&mut self, policy: SharedRetryPolicy) {
        self.options_mut().insert(RequestRetryPolicy(policy));
    }

    /// Server environment requested for this request.
    #[must_use]
    pub fn server_environment(&self) -> Option<&ServerEnvironment> {
        self.options().get()
    }

    /// Request a server environment, honored by the server environment stage.
    pub fn set_server_environment(&mut self, environment: ServerEnvironment) {
        self.options_mut().insert(environment);
    }

    /// User-defined option of type `T`.
    #[must_use]
    pub fn option<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.options().get()
    }

    /// Set a user-defined option.
    pub fn set_option<T: Clone + Send + Sync + 'static>(&mut self, value: T) {
        self.options_mut().insert(value);
    }
}

// ============================================================================
// Requirements
// ============================================================================

/// Stage markers a request needs from the pipeline that runs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirements(Shape);

impl Requirements {
    /// Markers demanded by the options set on `request`.
    #[must_use]
    pub fn of(request: &Request) -> Self {
        let mut shape = Shape::empty();
        if request.timeout().is_some() {
            shape |= Shape::REQUEST_TIMEOUT;
        }
        if request.retry_policy().is_some() {
            shape |= Shape::REQUEST_RETRY;
        }
        if request.server_environment().is_some() {
            shape |= Shape::SERVER_ENVIRONMENT;
        }
        Self(shape)
    }

    /// The demanded markers.
    #[must_use]
    pub const fn shape(&self) -> Shape {
        self.0
    }

    /// First requirement that `available` does not satisfy.
    ///
    /// A timeout or retry stage with a fixed setting does not satisfy the
    /// matching request option: only stages that read the option do.
    #[must_use]
    pub fn unmet(&self, available: Shape) -> Option<ConfigurationError> {
        let missing = self.0.difference(available);
        if missing.contains(Shape::REQUEST_TIMEOUT) {
            Some(ConfigurationError::MissingTimeoutStage)
        } else if missing.contains(Shape::REQUEST_RETRY) {
            Some(ConfigurationError::MissingRetryStage)
        } else if missing.contains(Shape::SERVER_ENVIRONMENT) {
            Some(ConfigurationError::MissingServerEnvironmentStage)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert2::{check, let_assert};

    use super::*;
    use crate::{Backoff, Method};

    #[derive(Debug, Clone, PartialEq)]
    struct Tenant(&'static str);

    fn request() -> Request {
        Request::builder(Method::Get)
            .url("https://api.example.com/items")
            .build()
            .expect("valid request")
    }

    #[test]
    fn options_are_type_keyed() {
        let mut options = Options::new();
        check!(options.is_empty());

        check!(options.insert(Tenant("a")).is_none());
        check!(options.insert(Tenant("b")) == Some(Tenant("a")));
        options.insert(7_u8);

        check!(options.len() == 2);
        check!(options.get::<Tenant>() == Some(&Tenant("b")));
        check!(options.remove::<u8>() == Some(7));
        check!(options.get::<u8>().is_none());
    }

    #[test]
    fn typed_accessors() {
        let mut request = request();
        check!(request.id().is_none());
        check!(request.timeout().is_none());

        request.set_id("req-1");
        request.set_timeout(Duration::from_secs(2));
        request.set_option(Tenant("acme"));

        check!(request.id().map(RequestId::as_str) == Some("req-1"));
        check!(request.timeout() == Some(Duration::from_secs(2)));
        check!(request.option::<Tenant>() == Some(&Tenant("acme")));
    }

    #[test]
    fn duration_option_does_not_clash_with_timeout() {
        let mut request = request();
        request.set_option(Duration::from_secs(9));
        check!(request.timeout().is_none());
    }

    #[test]
    fn requirements_follow_options() {
        let mut request = request();
        check!(Requirements::of(&request).shape().is_empty());

        request.set_timeout(Duration::from_millis(10));
        request.set_retry_policy(Arc::new(Backoff::immediately(2)));
        request.set_server_environment(ServerEnvironment::new().host("prod.example.com"));

        let requirements = Requirements::of(&request);
        check!(
            requirements.shape()
                == Shape::REQUEST_TIMEOUT | Shape::REQUEST_RETRY | Shape::SERVER_ENVIRONMENT
        );
        check!(requirements.unmet(Shape::all()).is_none());

        let_assert!(
            Some(ConfigurationError::MissingRetryStage) =
                requirements.unmet(Shape::REQUEST_TIMEOUT | Shape::SERVER_ENVIRONMENT)
        );
        let_assert!(
            Some(ConfigurationError::MissingTimeoutStage) =
                requirements.unmet(Shape::REQUEST_RETRY)
        );
    }

    #[test]
    fn fixed_stages_do_not_satisfy_request_options() {
        let mut request = request();
        request.set_timeout(Duration::from_millis(10));
        request.set_retry_policy(Arc::new(Backoff::immediately(2)));
        let requirements = Requirements::of(&request);

        let fixed = Shape::TIMEOUT | Shape::RETRY;
        let_assert!(Some(ConfigurationError::MissingTimeoutStage) = requirements.unmet(fixed));
        let_assert!(
            Some(ConfigurationError::MissingRetryStage) =
                requirements.unmet(fixed | Shape::REQUEST_TIMEOUT)
        );
    }
}
