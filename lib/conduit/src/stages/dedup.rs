//! Coalescing of concurrent equal calls.
//!
//! The first caller for a key starts the execution as a shared future and
//! publishes a weak handle to it; callers arriving while it is in flight
//! upgrade the handle and await the same future instead of starting another
//! one. The map never keeps an execution alive: only callers do.
//!
//! Each execution owns a guard that removes its entry when the execution
//! ends, whether it completes (before any caller observes the result) or is
//! dropped because every caller went away. Dropping one caller never cancels
//! the execution for the others.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use conduit_core::{Result, Shape, Stage};
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared, WeakShared};
use tracing::debug;

type Execution<O> = BoxFuture<'static, Result<O>>;
type PendingMap<K, O> = Mutex<HashMap<K, Pending<O>>>;

struct Pending<O> {
    generation: u64,
    execution: WeakShared<Execution<O>>,
}

/// Stage that runs at most one execution per key at a time.
///
/// Created by [`PipelineExt::deduplicate`](crate::PipelineExt::deduplicate)
/// or [`PipelineExt::deduplicate_by`](crate::PipelineExt::deduplicate_by).
pub struct Deduplicate<S: Stage, K, F> {
    inner: Arc<S>,
    key: F,
    pending: Arc<PendingMap<K, S::Output>>,
    generations: AtomicU64,
}

impl<S: Stage, K, F> Deduplicate<S, K, F> {
    pub(crate) fn new(inner: S, key: F) -> Self {
        Self {
            inner: Arc::new(inner),
            key,
            pending: Arc::new(Mutex::new(HashMap::new())),
            generations: AtomicU64::new(0),
        }
    }

    /// Number of keys with an execution in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<S: Stage + fmt::Debug, K, F> fmt::Debug for Deduplicate<S, K, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deduplicate")
            .field("inner", &self.inner)
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}

impl<S, K, F> Stage for Deduplicate<S, K, F>
where
    S: Stage + 'static,
    S::Input: 'static,
    S::Output: Clone + Sync + 'static,
    K: Hash + Eq + Clone + Send + Sync + 'static,
    F: Fn(&S::Input) -> K + Send + Sync,
{
    type Input = S::Input;
    type Output = S::Output;

    async fn run(&self, input: S::Input) -> Result<S::Output> {
        let key = (self.key)(&input);

        let execution = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            let joined = pending
                .get(&key)
                .and_then(|entry| entry.execution.upgrade());
            if let Some(execution) = joined {
                debug!(in_flight = pending.len(), "joining in-flight execution");
                execution
            } else {
                let generation = self.generations.fetch_add(1, Ordering::Relaxed);
                let removal = Removal {
                    pending: Arc::downgrade(&self.pending),
                    key: key.clone(),
                    generation,
                };
                let execution = shared_execution(Arc::clone(&self.inner), removal, input);
                if let Some(handle) = execution.downgrade() {
                    pending.insert(
                        key,
                        Pending {
                            generation,
                            execution: handle,
                        },
                    );
                }
                debug!(in_flight = pending.len(), "leading new execution");
                execution
            }
        };

        execution.await
    }

    fn shape(&self) -> Shape {
        self.inner.shape() | Shape::DEDUPLICATE
    }
}

/// Removes the entry of one execution when that execution ends.
struct Removal<K: Hash + Eq, O> {
    pending: Weak<PendingMap<K, O>>,
    key: K,
    generation: u64,
}

impl<K: Hash + Eq, O> Drop for Removal<K, O> {
    fn drop(&mut self) {
        let Some(pending) = self.pending.upgrade() else {
            return;
        };
        let mut pending = pending.lock().unwrap_or_else(PoisonError::into_inner);
        // a newer execution may already hold the key
        if pending
            .get(&self.key)
            .is_some_and(|entry| entry.generation == self.generation)
        {
            pending.remove(&self.key);
        }
    }
}

fn shared_execution<S, K>(
    inner: Arc<S>,
    removal: Removal<K, S::Output>,
    input: S::Input,
) -> Shared<Execution<S::Output>>
where
    S: Stage + 'static,
    S::Input: 'static,
    S::Output: Clone + Sync + 'static,
    K: Hash + Eq + Send + Sync + 'static,
{
    async move {
        let _removal = removal;
        inner.run(input).await
    }
    .boxed()
    .shared()
}
