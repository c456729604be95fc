//! # Chapter 0: Stages
//!
//! Everything in conduit is a [`Stage`](crate::Stage).
//!
//! ## What You'll Learn
//!
//! - Build a stage from an async closure
//! - Chain stages with `pipe`
//! - Adapt inputs and outputs with `map`, `pullback` and `flat_map`
//!
//! ## Prerequisites
//!
//! Add to `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! conduit = "0.1"
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! ## Your First Stage
//!
//! ```ignore
//! use conduit::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> conduit::Result<()> {
//!     let double = from_fn(|value: u32| async move { Ok(value * 2) });
//!     let describe = from_fn(|value: u32| async move { Ok(format!("got {value}")) });
//!
//!     let pipeline = double.pipe(describe);
//!     println!("{}", pipeline.run(21).await?); // got 42
//!     Ok(())
//! }
//! ```
//!
//! A pipeline is built once and called many times. `run` takes `&self`, so a
//! single pipeline can serve concurrent callers.
//!
//! ## Operators
//!
//! ```text
//! a.pipe(b)             a then b, b never runs if a fails
//! a.map(f)              transform the output
//! a.try_map(f)          transform the output, f may fail
//! a.flat_map(f)         build the next stage from the output
//! a.pullback(f)         accept another input type
//! a.intercept(f)        mutate the input before a sees it
//! a.capture(fi, fo)     observe input and output
//! ```
//!
//! Errors flow through every operator unchanged.
//!
//! ## Next Steps
//!
//! Continue to [Chapter 1: Requests & Options][super::chapter_1].
