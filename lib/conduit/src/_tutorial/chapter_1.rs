//! # Chapter 1: Requests & Options
//!
//! Build requests and attach options stages read along the way.
//!
//! ## Building a Request
//!
//! ```ignore
//! use std::time::Duration;
//!
//! use conduit::prelude::*;
//!
//! let request = Request::builder(Method::Post)
//!     .url("https://api.example.com/users")
//!     .header("x-trace", "abc")
//!     .json(&serde_json::json!({ "name": "Ada" }))
//!     .timeout(Duration::from_secs(2))
//!     .build()?;
//! ```
//!
//! Builder errors, such as an invalid URL or header, are reported by `build`.
//!
//! ## Relative Requests
//!
//! A request without a host is relative. The server environment stage fills
//! the host later:
//!
//! ```ignore
//! let request = Request::new(Method::Get, "/users/42");
//! assert!(request.url().is_err());
//! ```
//!
//! ## Options
//!
//! Options travel with the request but never reach the wire:
//!
//! | Option | Setter | Read by |
//! |--------|--------|---------|
//! | identity | `set_id` | `identified` |
//! | timeout | `set_timeout` | `apply_timeout` |
//! | retry policy | `set_retry_policy` | `apply_retry` |
//! | server environment | `set_server_environment` | `apply_server_environment` |
//!
//! Any `Clone + Send + Sync` value can be attached with `set_option` and
//! read back with `option::<T>()`.
//!
//! Equality and hashing only consider the wire fields, so two requests that
//! differ only by their options are equal.
//!
//! ## Rendering
//!
//! ```ignore
//! use conduit::{CurlFormatter, Formatter};
//!
//! println!("{}", CurlFormatter.format(&request));
//! println!("{request}"); // wire format
//! ```
//!
//! ## Next Steps
//!
//! Continue to [Chapter 2: Stateful Stages][super::chapter_2].
