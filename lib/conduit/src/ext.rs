//! Builder methods for the built-in stages.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use conduit_core::{
    Request, RequestId, Response, Result, RetryPolicy, ServerEnvironment, SharedRetryPolicy,
    Stage, StageExt, TryMap,
};
use serde::de::DeserializeOwned;

use crate::stages::{
    ApplyServerEnvironment, Deduplicate, Delay, Identify, LogLevel, Logged, Retry, Throttle,
    Timeout, Validate, uuid_request_id,
};

/// Clones the input to use it as its own deduplication key.
pub type CloneKey<I> = fn(&I) -> I;

/// Stateful stages available on every [`Stage`].
pub trait PipelineExt: Stage + Sized {
    /// Coalesce concurrent calls with equal inputs into one execution.
    fn deduplicate(self) -> Deduplicate<Self, Self::Input, CloneKey<Self::Input>>
    where
        Self::Input: Clone + Hash + Eq,
    {
        Deduplicate::new(self, <Self::Input as Clone>::clone as CloneKey<Self::Input>)
    }

    /// Coalesce concurrent calls whose inputs share the key computed by `key`.
    fn deduplicate_by<K, F>(self, key: F) -> Deduplicate<Self, K, F>
    where
        K: Hash + Eq,
        F: Fn(&Self::Input) -> K + Send + Sync,
    {
        Deduplicate::new(self, key)
    }

    /// Allow at most `maximum` concurrent executions.
    fn throttle(self, maximum: usize) -> Throttle<Self> {
        Throttle::new(self, maximum)
    }

    /// Retry every input with `policy`.
    ///
    /// Request retry policy options are not read; use
    /// [`HttpPipelineExt::apply_retry`] for that.
    fn retry(self, policy: impl RetryPolicy + 'static) -> Retry<Self>
    where
        Self::Input: Clone,
    {
        let policy: SharedRetryPolicy = Arc::new(policy);
        Retry::new(
            self,
            Arc::new(move |_: &Self::Input| Some(Arc::clone(&policy))),
        )
    }

    /// Retry each input with the policy `resolve` picks for it.
    fn retry_with<F>(self, resolve: F) -> Retry<Self>
    where
        Self::Input: Clone,
        F: Fn(&Self::Input) -> Option<SharedRetryPolicy> + Send + Sync + 'static,
    {
        Retry::new(self, Arc::new(resolve))
    }

    /// Cancel executions that take longer than `deadline`.
    ///
    /// Request timeout options are not read; use
    /// [`HttpPipelineExt::apply_timeout`] for that.
    fn timeout(self, deadline: Duration) -> Timeout<Self> {
        Timeout::new(self, Arc::new(move |_: &Self::Input| Some(deadline)))
    }

    /// Cancel each execution after the deadline `resolve` picks for its input.
    fn timeout_with<F>(self, resolve: F) -> Timeout<Self>
    where
        F: Fn(&Self::Input) -> Option<Duration> + Send + Sync + 'static,
    {
        Timeout::new(self, Arc::new(resolve))
    }

    /// Wait `duration` before each execution.
    fn delay(self, duration: Duration) -> Delay<Self> {
        Delay::new(self, duration)
    }

    /// Log every call at info level.
    fn logged(self) -> Logged<Self> {
        Logged::new(self, LogLevel::Info)
    }

    /// Log every call at `level`.
    fn logged_at(self, level: LogLevel) -> Logged<Self> {
        Logged::new(self, level)
    }
}

impl<S: Stage> PipelineExt for S {}

/// Request-aware stages, available on stages that take a [`Request`].
///
/// Stages reading request options resolve them per call: the value set on
/// the request wins over the default given here.
pub trait HttpPipelineExt: Stage<Input = Request> + Sized {
    /// Stamp each request with a random UUID identity.
    fn identified(self) -> Identify<Self> {
        Identify::new(self, Arc::new(uuid_request_id))
    }

    /// Stamp each request with the identity computed by `generate`.
    fn identified_with<F>(self, generate: F) -> Identify<Self>
    where
        F: Fn(&Request) -> RequestId + Send + Sync + 'static,
    {
        Identify::new(self, Arc::new(generate))
    }

    /// Rewrite requests with their server environment, or `default`.
    fn apply_server_environment(
        self,
        default: Option<ServerEnvironment>,
    ) -> ApplyServerEnvironment<Self> {
        ApplyServerEnvironment::new(self, default)
    }

    /// Enforce the request timeout option, or `default`.
    fn apply_timeout(self, default: Option<Duration>) -> Timeout<Self> {
        Timeout::from_request(self, default)
    }

    /// Retry with the request retry policy option, or `default`.
    fn apply_retry(self, default: Option<SharedRetryPolicy>) -> Retry<Self> {
        Retry::from_request(self, default)
    }

    /// Reject requests this pipeline cannot honor.
    fn validated(self) -> Validate<Self> {
        Validate::new(self)
    }

    /// Turn non-2xx responses into [`Error::Http`](conduit_core::Error::Http).
    fn error_for_status(self) -> TryMap<Self, fn(Response) -> Result<Response>>
    where
        Self: Stage<Output = Response>,
    {
        self.try_map(Response::error_for_status as fn(Response) -> Result<Response>)
    }

    /// Decode successful response bodies as JSON.
    fn decode_json<T>(self) -> TryMap<Self, fn(Response) -> Result<T>>
    where
        Self: Stage<Output = Response>,
        T: DeserializeOwned + Send,
    {
        self.try_map(decode_json::<T> as fn(Response) -> Result<T>)
    }
}

impl<S: Stage<Input = Request>> HttpPipelineExt for S {}

fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    response.json()
}
