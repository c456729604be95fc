//! # Chapter 2: Stateful Stages
//!
//! Wrap any stage with deduplication, admission control, retry and deadlines.
//!
//! ## Available Stages
//!
//! | Method | Stage | Description |
//! |--------|-------|-------------|
//! | `.deduplicate()` | [`Deduplicate`](crate::stages::Deduplicate) | Share one execution between concurrent equal calls |
//! | `.throttle(n)` | [`Throttle`](crate::stages::Throttle) | At most `n` executions at a time |
//! | `.retry(policy)` | [`Retry`](crate::stages::Retry) | Re-run failures while the policy allows |
//! | `.timeout(d)` | [`Timeout`](crate::stages::Timeout) | Cancel executions after `d` |
//! | `.delay(d)` | [`Delay`](crate::stages::Delay) | Wait `d` before each execution |
//! | `.logged()` | [`Logged`](crate::stages::Logged) | Log calls with `tracing` |
//!
//! ## Retry Policies
//!
//! ```ignore
//! use std::time::Duration;
//!
//! use conduit::prelude::*;
//!
//! // 100ms, 200ms, 400ms... at most 5 attempts in total
//! let policy = Backoff::exponential(Duration::from_millis(100), 2, 5)
//!     .filter(|error| !error.is_client_error());
//!
//! let pipeline = fetch.retry(policy);
//! ```
//!
//! Transport failures, HTTP error statuses, timeouts and custom errors can be
//! retried. Configuration and codec errors never are. Use `filter` to narrow
//! further, as above.
//!
//! ## Stage Order
//!
//! Stages wrap in the order added. The last one runs first:
//!
//! ```text
//! fetch.timeout(d).retry(p).deduplicate()
//!
//! call ──► deduplicate ──► retry ──► timeout ──► fetch
//! ```
//!
//! Here each attempt gets its own deadline, and concurrent equal calls share
//! the retried execution. Swap `timeout` and `retry` to bound all attempts
//! together instead.
//!
//! ## Next Steps
//!
//! Continue to [Chapter 3: HTTP Pipelines][super::chapter_3].
