//! # Tutorial: Building Request Pipelines with conduit
//!
//! Learn to compose request pipelines step by step.
//!
//! ## Chapters
//!
//! 1. [Stages][chapter_0] - The unit of composition
//! 2. [Requests & Options][chapter_1] - The request model and per-request options
//! 3. [Stateful Stages][chapter_2] - Deduplicate, throttle, retry, timeout
//! 4. [HTTP Pipelines][chapter_3] - Server environments, validation, transport
//!
//! Ready? Start with [Chapter 0: Stages][chapter_0].

pub mod chapter_0;
pub mod chapter_1;
pub mod chapter_2;
pub mod chapter_3;
