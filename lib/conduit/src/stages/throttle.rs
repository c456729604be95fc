//! Admission control.

use std::fmt;

use conduit_core::{Error, Result, Shape, Stage};
use tokio::sync::Semaphore;
use tracing::debug;

/// Stage that bounds the number of concurrent executions of the stage it wraps.
///
/// A slot is held for the whole execution and released when it completes,
/// fails, or is cancelled. Waiters are admitted in arrival order.
pub struct Throttle<S> {
    inner: S,
    slots: Semaphore,
    maximum: usize,
}

impl<S> Throttle<S> {
    /// Wrap `inner`, allowing at most `maximum` concurrent executions.
    ///
    /// `maximum` is clamped to `1..=Semaphore::MAX_PERMITS`.
    #[must_use]
    pub fn new(inner: S, maximum: usize) -> Self {
        let maximum = maximum.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            inner,
            slots: Semaphore::new(maximum),
            maximum,
        }
    }

    /// Maximum number of concurrent executions.
    #[must_use]
    pub const fn maximum(&self) -> usize {
        self.maximum
    }

    /// Number of executions currently running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.maximum - self.slots.available_permits()
    }
}

impl<S: fmt::Debug> fmt::Debug for Throttle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttle")
            .field("inner", &self.inner)
            .field("maximum", &self.maximum)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

impl<S: Stage> Stage for Throttle<S> {
    type Input = S::Input;
    type Output = S::Output;

    async fn run(&self, input: S::Input) -> Result<S::Output> {
        if self.slots.available_permits() == 0 {
            debug!(maximum = self.maximum, "waiting for a free slot");
        }
        let _slot = self
            .slots
            .acquire()
            .await
            .map_err(|e| Error::custom(format!("throttle unavailable: {e}")))?;

        self.inner.run(input).await
    }

    fn shape(&self) -> Shape {
        self.inner.shape() | Shape::THROTTLE
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use assert2::check;
    use conduit_core::from_fn;
    use futures_util::future::join_all;

    use super::*;

    #[derive(Default)]
    struct Gauge {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    fn gauged(gauge: &Arc<Gauge>) -> impl Stage<Input = u32, Output = u32> + 'static {
        let gauge = Arc::clone(gauge);
        from_fn(move |value: u32| {
            let gauge = Arc::clone(&gauge);
            async move {
                let active = gauge.active.fetch_add(1, Ordering::SeqCst) + 1;
                gauge.peak.fetch_max(active, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                gauge.active.fetch_sub(1, Ordering::SeqCst);
                if value == 0 {
                    Err(Error::custom("zero"))
                } else {
                    Ok(value)
                }
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn never_exceeds_maximum() {
        let gauge = Arc::new(Gauge::default());
        let stage = Throttle::new(gauged(&gauge), 3);

        let results = join_all((1..=10).map(|value| stage.run(value))).await;

        check!(results.iter().all(|result| result.is_ok()));
        check!(gauge.peak.load(Ordering::SeqCst) == 3);
        check!(stage.in_flight() == 0);
    }

    #[tokio::test(start_paused = true)]
    async fn slot_released_on_failure() {
        let gauge = Arc::new(Gauge::default());
        let stage = Throttle::new(gauged(&gauge), 1);

        check!(stage.run(0).await.is_err());
        check!(stage.in_flight() == 0);
        check!(stage.run(5).await.expect("run") == 5);
    }

    #[tokio::test(start_paused = true)]
    async fn slot_released_on_cancellation() {
        let gauge = Arc::new(Gauge::default());
        let stage = Throttle::new(gauged(&gauge), 1);

        let cancelled = tokio::time::timeout(Duration::from_millis(5), stage.run(1)).await;
        check!(cancelled.is_err());
        check!(stage.in_flight() == 0);
        check!(stage.run(2).await.expect("run") == 2);
    }

    #[test]
    fn maximum_is_clamped() {
        let stage = Throttle::new(from_fn(|v: u8| async move { Ok(v) }), 0);
        check!(stage.maximum() == 1);
        check!(stage.shape() == Shape::THROTTLE);
    }
}
