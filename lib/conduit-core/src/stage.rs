//! The [`Stage`] trait and its basic implementations.
//!
//! A stage is an asynchronous, fallible function from an input to an output.
//! Pipelines are built once by composing stages and then called repeatedly.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::{Result, Shape};

/// An asynchronous transformation from [`Stage::Input`] to [`Stage::Output`].
///
/// Stages are immutable once built. Stateful stages own their state behind
/// interior synchronization, so a single instance can serve many concurrent
/// calls through `&self`.
///
/// # Example
///
/// ```
/// use conduit_core::{Stage, StageExt, from_fn};
///
/// # let runtime = tokio::runtime::Builder::new_current_thread().build().expect("runtime");
/// # runtime.block_on(async {
/// let double = from_fn(|value: u32| async move { Ok(value * 2) });
/// let pipeline = double.map(|value| value + 1);
///
/// assert_eq!(pipeline.run(20).await.expect("run"), 41);
/// # });
/// ```
pub trait Stage: Send + Sync {
    /// Value accepted by this stage.
    type Input: Send;
    /// Value produced by this stage.
    type Output: Send;

    /// Run the stage on one input.
    ///
    /// # Errors
    ///
    /// Returns whatever error the stage, or one of the stages it wraps, produced.
    fn run(&self, input: Self::Input) -> impl Future<Output = Result<Self::Output>> + Send;

    /// Markers of the stages this stage is composed of.
    fn shape(&self) -> Shape {
        Shape::empty()
    }
}

impl<S: Stage> Stage for Arc<S> {
    type Input = S::Input;
    type Output = S::Output;

    fn run(&self, input: Self::Input) -> impl Future<Output = Result<Self::Output>> + Send {
        (**self).run(input)
    }

    fn shape(&self) -> Shape {
        (**self).shape()
    }
}

impl<S: Stage> Stage for &S {
    type Input = S::Input;
    type Output = S::Output;

    fn run(&self, input: Self::Input) -> impl Future<Output = Result<Self::Output>> + Send {
        (**self).run(input)
    }

    fn shape(&self) -> Shape {
        (**self).shape()
    }
}

// ============================================================================
// Function Stage
// ============================================================================

/// Build a stage from an async closure.
///
/// This is typically the base of a pipeline in tests, or an adapter around an
/// existing async API.
pub fn from_fn<F, I, Fut, O>(f: F) -> FnStage<F, I>
where
    F: Fn(I) -> Fut + Send + Sync,
    Fut: Future<Output = Result<O>> + Send,
    I: Send,
    O: Send,
{
    FnStage {
        f,
        _input: PhantomData,
    }
}

/// Stage backed by a closure, see [`from_fn`].
pub struct FnStage<F, I> {
    f: F,
    _input: PhantomData<fn(I)>,
}

impl<F: Clone, I> Clone for FnStage<F, I> {
    fn clone(&self) -> Self {
        Self {
            f: self.f.clone(),
            _input: PhantomData,
        }
    }
}

impl<F, I> fmt::Debug for FnStage<F, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStage").finish_non_exhaustive()
    }
}

impl<F, I, Fut, O> Stage for FnStage<F, I>
where
    F: Fn(I) -> Fut + Send + Sync,
    Fut: Future<Output = Result<O>> + Send,
    I: Send,
    O: Send,
{
    type Input = I;
    type Output = O;

    fn run(&self, input: I) -> impl Future<Output = Result<O>> + Send {
        (self.f)(input)
    }
}

// ============================================================================
// Type-Erased Stage
// ============================================================================

/// Object-safe mirror of [`Stage`].
trait DynStage<I, O>: Send + Sync {
    fn run_boxed(&self, input: I) -> BoxFuture<'_, Result<O>>;

    fn dyn_shape(&self) -> Shape;
}

impl<S: Stage> DynStage<S::Input, S::Output> for S {
    fn run_boxed(&self, input: S::Input) -> BoxFuture<'_, Result<S::Output>> {
        Box::pin(self.run(input))
    }

    fn dyn_shape(&self) -> Shape {
        self.shape()
    }
}

/// Type-erased, cheaply cloneable stage.
///
/// Hides the nested generic type of a composed pipeline behind a single
/// `BoxStage<Input, Output>`, keeping the shape of the erased stage.
pub struct BoxStage<I, O> {
    inner: Arc<dyn DynStage<I, O>>,
}

impl<I, O> BoxStage<I, O> {
    /// Erase a stage.
    pub fn new<S>(stage: S) -> Self
    where
        S: Stage<Input = I, Output = O> + 'static,
    {
        Self {
            inner: Arc::new(stage),
        }
    }
}

impl<I, O> Clone for BoxStage<I, O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I, O> fmt::Debug for BoxStage<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxStage")
            .field("shape", &self.inner.dyn_shape())
            .finish_non_exhaustive()
    }
}

impl<I: Send, O: Send> Stage for BoxStage<I, O> {
    type Input = I;
    type Output = O;

    fn run(&self, input: I) -> impl Future<Output = Result<O>> + Send {
        self.inner.run_boxed(input)
    }

    fn shape(&self) -> Shape {
        self.inner.dyn_shape()
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;

    use super::*;
    use crate::Error;

    #[tokio::test]
    async fn fn_stage_runs_closure() {
        let stage = from_fn(|name: &'static str| async move { Ok(format!("hello {name}")) });

        let output = stage.run("world").await.expect("run");
        check!(output == "hello world");
        check!(stage.shape().is_empty());
    }

    #[tokio::test]
    async fn fn_stage_propagates_error() {
        let stage = from_fn(|_: ()| async { Err::<(), _>(Error::connection("refused")) });

        let err = stage.run(()).await.expect_err("should fail");
        check!(err.is_connection());
    }

    #[tokio::test]
    async fn shared_stage_through_arc() {
        let stage = Arc::new(from_fn(|value: u8| async move { Ok(value + 1) }));
        let shared = Arc::clone(&stage);

        check!(shared.run(1).await.expect("run") == 2);
        check!((&*stage).run(2).await.expect("run") == 3);
    }

    #[tokio::test]
    async fn box_stage_erases_type() {
        let stage: BoxStage<u8, u8> = BoxStage::new(from_fn(|value: u8| async move { Ok(value) }));
        let cloned = stage.clone();

        check!(cloned.run(7).await.expect("run") == 7);
        check!(format!("{stage:?}").contains("BoxStage"));
    }
}
