//! Fixed delay before each execution.

use std::time::Duration;

use conduit_core::{Result, Shape, Stage};

/// Stage that waits a fixed duration before running the stage it wraps.
#[derive(Debug, Clone)]
pub struct Delay<S> {
    inner: S,
    duration: Duration,
}

impl<S> Delay<S> {
    /// Wrap `inner`, waiting `duration` before each execution.
    #[must_use]
    pub const fn new(inner: S, duration: Duration) -> Self {
        Self { inner, duration }
    }
}

impl<S: Stage> Stage for Delay<S> {
    type Input = S::Input;
    type Output = S::Output;

    async fn run(&self, input: S::Input) -> Result<S::Output> {
        tokio::time::sleep(self.duration).await;
        self.inner.run(input).await
    }

    fn shape(&self) -> Shape {
        self.inner.shape() | Shape::DELAY
    }
}
