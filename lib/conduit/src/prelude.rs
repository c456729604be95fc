//! Prelude module for convenient imports.
//!
//! Brings the stage traits, the request model and the most used stage
//! configuration types into scope:
//!
//! ```
//! use conduit::prelude::*;
//! ```

#[cfg(feature = "transport")]
pub use crate::{HyperClient, TransportConfig};
pub use crate::{
    Backoff, Body, ContentType, Error, HttpPipelineExt, LogLevel, Method, PipelineExt, Request,
    RequestBuilder, RequestId, Response, Result, RetryPolicy, ServerEnvironment, Shape, Stage,
    StageExt, StatusCode, from_fn,
};
pub use serde::{Deserialize, Serialize};
