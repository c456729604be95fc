//! Prelude module for convenient imports.
//!
//! ```
//! use conduit_core::prelude::*;
//! ```

pub use crate::{
    Backoff, Body, Error, Method, Request, RequestBuilder, Response, Result, RetryPolicy,
    ServerEnvironment, Shape, Stage, StageExt, from_fn,
};
