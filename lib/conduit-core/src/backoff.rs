//! Retry policies.
//!
//! A [`RetryPolicy`] maps a failure and the number of attempts made so far to
//! the delay before the next attempt, or to `None` to stop retrying.
//!
//! `max_attempts` counts every execution, the first one included: with
//! `Backoff::constant(Duration::ZERO, 3)` a stage runs at most three times.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::Error;

/// Decides whether, and after which delay, a failed execution is retried.
pub trait RetryPolicy: Send + Sync + fmt::Debug {
    /// Delay before the next attempt, or `None` to give up.
    ///
    /// `attempts` is the number of executions already made, including the
    /// one that produced `error`. Implementations treat zero as one.
    fn retry_delay(&self, error: &Error, attempts: u32) -> Option<Duration>;
}

/// Retry policy shared between requests and stages.
pub type SharedRetryPolicy = Arc<dyn RetryPolicy>;

impl<P: RetryPolicy + ?Sized> RetryPolicy for Arc<P> {
    fn retry_delay(&self, error: &Error, attempts: u32) -> Option<Duration> {
        (**self).retry_delay(error, attempts)
    }
}

type Strategy = dyn Fn(&Error, u32) -> Option<Duration> + Send + Sync;

/// Closure-backed [`RetryPolicy`] with the usual backoff curves.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use conduit_core::{Backoff, Error, RetryPolicy};
///
/// let policy = Backoff::exponential(Duration::from_millis(100), 2, 4);
/// let error = Error::connection("reset");
///
/// assert_eq!(policy.retry_delay(&error, 1), Some(Duration::from_millis(100)));
/// assert_eq!(policy.retry_delay(&error, 3), Some(Duration::from_millis(400)));
/// assert_eq!(policy.retry_delay(&error, 4), None);
/// ```
#[derive(Clone)]
pub struct Backoff {
    name: &'static str,
    strategy: Arc<Strategy>,
}

impl fmt::Debug for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Backoff").field(&self.name).finish()
    }
}

impl RetryPolicy for Backoff {
    fn retry_delay(&self, error: &Error, attempts: u32) -> Option<Duration> {
        (self.strategy)(error, attempts)
    }
}

impl Backoff {
    /// Policy from a closure receiving the error and the attempt count.
    #[must_use]
    pub fn new<F>(strategy: F) -> Self
    where
        F: Fn(&Error, u32) -> Option<Duration> + Send + Sync + 'static,
    {
        Self {
            name: "custom",
            strategy: Arc::new(strategy),
        }
    }

    fn bounded<F>(name: &'static str, max_attempts: u32, delay: F) -> Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        Self {
            name,
            strategy: Arc::new(move |error: &Error, attempts: u32| {
                let attempts = attempts.max(1);
                (error.is_retryable() && attempts < max_attempts).then(|| delay(attempts))
            }),
        }
    }

    /// Never retry.
    #[must_use]
    pub fn never() -> Self {
        Self {
            name: "never",
            strategy: Arc::new(|_: &Error, _: u32| None),
        }
    }

    /// Retry without waiting, up to `max_attempts` executions.
    #[must_use]
    pub fn immediately(max_attempts: u32) -> Self {
        Self::bounded("immediately", max_attempts, |_| Duration::ZERO)
    }

    /// Wait `delay` between executions, up to `max_attempts` executions.
    #[must_use]
    pub fn constant(delay: Duration, max_attempts: u32) -> Self {
        Self::bounded("constant", max_attempts, move |_| delay)
    }

    /// Wait `initial * base^(attempts - 1)`, up to `max_attempts` executions.
    #[must_use]
    pub fn exponential(initial: Duration, base: u32, max_attempts: u32) -> Self {
        Self::bounded("exponential", max_attempts, move |attempts| {
            let factor = base.saturating_pow(attempts - 1);
            initial.saturating_mul(factor)
        })
    }

    /// Wait `unit * fib(attempts)` (1, 1, 2, 3, 5, ...), up to `max_attempts`
    /// executions.
    #[must_use]
    pub fn fibonacci(unit: Duration, max_attempts: u32) -> Self {
        Self::bounded("fibonacci", max_attempts, move |attempts| {
            unit.saturating_mul(fibonacci(attempts))
        })
    }

    /// Only retry errors matching `predicate`.
    #[must_use]
    pub fn filter<P>(self, predicate: P) -> Self
    where
        P: Fn(&Error) -> bool + Send + Sync + 'static,
    {
        let strategy = self.strategy;
        Self {
            name: self.name,
            strategy: Arc::new(move |error: &Error, attempts: u32| {
                if predicate(error) {
                    strategy(error, attempts)
                } else {
                    None
                }
            }),
        }
    }

    /// Share this policy.
    #[must_use]
    pub fn shared(self) -> SharedRetryPolicy {
        Arc::new(self)
    }
}

fn fibonacci(n: u32) -> u32 {
    let (mut current, mut next) = (0_u32, 1_u32);
    for _ in 0..n {
        (current, next) = (next, current.saturating_add(next));
    }
    current
}
