//! Core types and traits for conduit composable request pipelines.
//!
//! This crate provides the foundations used by `conduit`:
//! - [`Stage`] - asynchronous, fallible transformation, the unit of composition
//! - [`StageExt`] - composition operators (`pipe`, `map`, `flat_map`, `pullback`, ...)
//! - [`Shape`] - markers of the stages a composed pipeline contains
//! - [`Request`], [`RequestBuilder`] and [`Response`] - the HTTP request model
//! - [`Options`] - per-request options that never reach the wire
//! - [`ServerEnvironment`] - host, path prefix, header and query defaults
//! - [`RetryPolicy`] and [`Backoff`] - retry decisions
//! - [`Formatter`] - cURL and wire renderings
//! - [`Error`] and [`Result`] - error handling

mod backoff;
mod body;
mod combinators;
mod environment;
mod error;
mod format;
mod method;
mod options;
pub mod prelude;
mod request;
mod response;
mod shape;
mod stage;

pub use backoff::{Backoff, RetryPolicy, SharedRetryPolicy};
pub use body::{Body, ContentType, from_json, to_form, to_json, to_query_string};
pub use combinators::{Capture, FlatMap, Intercept, Map, Pipe, Pullback, StageExt, TryMap};
pub use environment::ServerEnvironment;
pub use error::{ConfigurationError, Error, ErrorKind, Result};
pub use format::{CurlFormatter, Formatter, WireFormatter};
pub use method::Method;
pub use options::{Options, RequestId, Requirements};
pub use request::{DEFAULT_SCHEME, Request, RequestBuilder};
pub use response::Response;
pub use shape::Shape;
pub use stage::{BoxStage, FnStage, Stage, from_fn};

// Re-export http crate types for status codes and headers
pub use http::{HeaderMap, StatusCode, Version, header};
