//! Composable asynchronous request pipelines.
//!
//! A pipeline is a [`Stage`]: an async, fallible function from an input to an
//! output. Stages compose with the operators of [`StageExt`], and the built-in
//! [`stages`] add deduplication, throttling, retry, deadlines, server
//! environments and validation around any stage, including the
//! [`HyperClient`] transport.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use conduit::prelude::*;
//!
//! #[derive(Debug, Clone, Deserialize)]
//! pub struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! # async fn demo() -> conduit::Result<()> {
//! let production = ServerEnvironment::new().host("api.example.com").path_prefix("v1");
//!
//! let users = HyperClient::new()?
//!     .apply_timeout(Some(Duration::from_secs(5)))
//!     .apply_retry(Some(Backoff::exponential(Duration::from_millis(100), 2, 3).shared()))
//!     .apply_server_environment(Some(production))
//!     .identified()
//!     .validated()
//!     .error_for_status()
//!     .decode_json::<User>()
//!     .deduplicate();
//!
//! let user = users.run(Request::new(Method::Get, "/users/42")).await?;
//! println!("{}: {}", user.id, user.name);
//! # Ok(())
//! # }
//! ```
//!
//! See the [tutorial][_tutorial] for a complete guide.

pub mod _tutorial;
#[cfg(feature = "transport")]
mod client;
#[cfg(feature = "transport")]
mod config;
#[cfg(feature = "transport")]
mod connector;
mod ext;
pub mod prelude;
mod service;
pub mod stages;

#[cfg(feature = "transport")]
pub use client::HyperClient;
#[cfg(feature = "transport")]
pub use config::{DEFAULT_USER_AGENT, TransportConfig, TransportConfigBuilder};
pub use ext::{CloneKey, HttpPipelineExt, PipelineExt};
pub use service::{ServiceStage, StageService};
pub use stages::{LogLevel, Loggable};

// Re-export tower for service interop
pub use tower;

// Re-export core types
pub use conduit_core::{
    Backoff, Body, BoxStage, Capture, ConfigurationError, ContentType, CurlFormatter, Error,
    ErrorKind, FlatMap, FnStage, Formatter, Intercept, Map, Method, Options, Pipe, Pullback,
    Request, RequestBuilder, RequestId, Requirements, Response, Result, RetryPolicy,
    ServerEnvironment, Shape, SharedRetryPolicy, Stage, StageExt, TryMap, WireFormatter,
    from_fn, from_json, to_form, to_json, to_query_string,
};

// Re-export http types for status codes and headers
pub use conduit_core::{HeaderMap, StatusCode, Version, header};
