//! # Chapter 3: HTTP Pipelines
//!
//! Put it together around a real transport.
//!
//! ## The Transport
//!
//! [`HyperClient`](crate::HyperClient) is a stage from
//! [`Request`](crate::Request) to [`Response`](crate::Response), with pooled
//! connections and rustls:
//!
//! ```ignore
//! let client = HyperClient::with_config(
//!     TransportConfig::builder()
//!         .timeout(Duration::from_secs(10))
//!         .build(),
//! )?;
//! ```
//!
//! Any other stage with the same types works too, which is how tests swap
//! the network for a closure.
//!
//! ## Request-Aware Stages
//!
//! ```ignore
//! let pipeline = client
//!     .apply_timeout(None)
//!     .apply_retry(Some(Backoff::immediately(3).shared()))
//!     .apply_server_environment(Some(ServerEnvironment::new().host("api.example.com")))
//!     .identified()
//!     .validated()
//!     .error_for_status()
//!     .decode_json::<User>();
//! ```
//!
//! Each `apply_*` stage reads its option from the request and falls back to
//! the default given when the pipeline is built.
//!
//! ## Validation
//!
//! `validated` rejects a request before any work is done when:
//!
//! - it sets a timeout and no `apply_timeout` stage is below
//! - it sets a retry policy and no `apply_retry` stage is below
//! - it sets a server environment and no server environment stage is below
//! - it is a GET or HEAD request with a body
//!
//! A fixed `.timeout(d)` or `.retry(policy)` never reads the request, so it
//! does not satisfy these checks.
//!
//! Put it outermost so it sees the whole pipeline.
//!
//! ## Tower
//!
//! [`StageService`](crate::StageService) exposes a pipeline as a tower
//! service, and [`ServiceStage`](crate::ServiceStage) runs a tower service
//! as a stage.
