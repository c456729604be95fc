//! Composition operators.
//!
//! Every operator consumes its operands and returns a new [`Stage`]. Errors
//! from the wrapped stage pass through unchanged. The operators are reached
//! through the blanket [`StageExt`] trait:
//!
//! ```
//! use conduit_core::{Stage, StageExt, from_fn};
//!
//! # let runtime = tokio::runtime::Builder::new_current_thread().build().expect("runtime");
//! # runtime.block_on(async {
//! let parse = from_fn(|text: String| async move {
//!     text.parse::<u32>()
//!         .map_err(|e| conduit_core::Error::custom(e.to_string()))
//! });
//! let square = from_fn(|value: u32| async move { Ok(value * value) });
//!
//! let pipeline = parse
//!     .pipe(square)
//!     .map(|value| value.to_string())
//!     .pullback(|value: u8| value.to_string());
//!
//! assert_eq!(pipeline.run(12).await.expect("run"), "144");
//! # });
//! ```

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use crate::{BoxStage, Result, Shape, Stage};

// ============================================================================
// Pipe
// ============================================================================

/// Runs `first`, then feeds its output to `second`.
#[derive(Debug, Clone)]
pub struct Pipe<A, B> {
    first: A,
    second: B,
}

impl<A, B> Stage for Pipe<A, B>
where
    A: Stage,
    B: Stage<Input = A::Output>,
{
    type Input = A::Input;
    type Output = B::Output;

    async fn run(&self, input: Self::Input) -> Result<Self::Output> {
        let intermediate = self.first.run(input).await?;
        self.second.run(intermediate).await
    }

    fn shape(&self) -> Shape {
        self.first.shape() | self.second.shape()
    }
}

// ============================================================================
// Map / TryMap
// ============================================================================

/// Transforms the successful output of a stage.
#[derive(Clone)]
pub struct Map<S, F> {
    inner: S,
    transform: F,
}

impl<S: fmt::Debug, F> fmt::Debug for Map<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<S, F, T> Stage for Map<S, F>
where
    S: Stage,
    F: Fn(S::Output) -> T + Send + Sync,
    T: Send,
{
    type Input = S::Input;
    type Output = T;

    async fn run(&self, input: Self::Input) -> Result<T> {
        let output = self.inner.run(input).await?;
        Ok((self.transform)(output))
    }

    fn shape(&self) -> Shape {
        self.inner.shape()
    }
}

/// Transforms the successful output of a stage with a fallible function.
#[derive(Clone)]
pub struct TryMap<S, F> {
    inner: S,
    transform: F,
}

impl<S: fmt::Debug, F> fmt::Debug for TryMap<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TryMap")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<S, F, T> Stage for TryMap<S, F>
where
    S: Stage,
    F: Fn(S::Output) -> Result<T> + Send + Sync,
    T: Send,
{
    type Input = S::Input;
    type Output = T;

    async fn run(&self, input: Self::Input) -> Result<T> {
        let output = self.inner.run(input).await?;
        (self.transform)(output)
    }

    fn shape(&self) -> Shape {
        self.inner.shape()
    }
}

// ============================================================================
// FlatMap
// ============================================================================

/// Builds a continuation stage from the output of a stage, then runs it with
/// that same output.
pub struct FlatMap<S, F, N> {
    inner: S,
    continuation: F,
    _next: PhantomData<fn() -> N>,
}

impl<S: Clone, F: Clone, N> Clone for FlatMap<S, F, N> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            continuation: self.continuation.clone(),
            _next: PhantomData,
        }
    }
}

impl<S: fmt::Debug, F, N> fmt::Debug for FlatMap<S, F, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatMap")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<S, F, N> Stage for FlatMap<S, F, N>
where
    S: Stage,
    F: Fn(&S::Output) -> Result<N> + Send + Sync,
    N: Stage<Input = S::Output>,
{
    type Input = S::Input;
    type Output = N::Output;

    async fn run(&self, input: Self::Input) -> Result<N::Output> {
        let output = self.inner.run(input).await?;
        let next = (self.continuation)(&output)?;
        next.run(output).await
    }

    // The continuation only exists at call time.
    fn shape(&self) -> Shape {
        self.inner.shape()
    }
}

// ============================================================================
// Pullback
// ============================================================================

/// Adapts a stage to a different input type.
pub struct Pullback<S, F, I> {
    inner: S,
    transform: F,
    _input: PhantomData<fn(I)>,
}

impl<S: Clone, F: Clone, I> Clone for Pullback<S, F, I> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            transform: self.transform.clone(),
            _input: PhantomData,
        }
    }
}

impl<S: fmt::Debug, F, I> fmt::Debug for Pullback<S, F, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pullback")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<S, F, I> Stage for Pullback<S, F, I>
where
    S: Stage,
    F: Fn(I) -> S::Input + Send + Sync,
    I: Send,
{
    type Input = I;
    type Output = S::Output;

    fn run(&self, input: I) -> impl Future<Output = Result<S::Output>> + Send {
        self.inner.run((self.transform)(input))
    }

    fn shape(&self) -> Shape {
        self.inner.shape()
    }
}

// ============================================================================
// Intercept
// ============================================================================

/// Mutates the input before delegating.
///
/// The input is owned by the call, so the caller's own value is never touched.
#[derive(Clone)]
pub struct Intercept<S, F> {
    inner: S,
    mutate: F,
}

impl<S: fmt::Debug, F> fmt::Debug for Intercept<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Intercept")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<S, F> Stage for Intercept<S, F>
where
    S: Stage,
    F: Fn(&mut S::Input) + Send + Sync,
{
    type Input = S::Input;
    type Output = S::Output;

    fn run(&self, mut input: S::Input) -> impl Future<Output = Result<S::Output>> + Send {
        (self.mutate)(&mut input);
        self.inner.run(input)
    }

    fn shape(&self) -> Shape {
        self.inner.shape()
    }
}

// ============================================================================
// Capture
// ============================================================================

/// Observes the input and the successful output without altering them.
#[derive(Clone)]
pub struct Capture<S, FI, FO> {
    inner: S,
    on_input: FI,
    on_output: FO,
}

impl<S: fmt::Debug, FI, FO> fmt::Debug for Capture<S, FI, FO> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capture")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<S, FI, FO> Stage for Capture<S, FI, FO>
where
    S: Stage,
    FI: Fn(&S::Input) + Send + Sync,
    FO: Fn(&S::Output) + Send + Sync,
{
    type Input = S::Input;
    type Output = S::Output;

    async fn run(&self, input: S::Input) -> Result<S::Output> {
        (self.on_input)(&input);
        let output = self.inner.run(input).await?;
        (self.on_output)(&output);
        Ok(output)
    }

    fn shape(&self) -> Shape {
        self.inner.shape()
    }
}

fn ignore<T>(_: &T) {}

// ============================================================================
// Extension Trait
// ============================================================================

/// Composition operators available on every [`Stage`].
pub trait StageExt: Stage + Sized {
    /// Feed the output of this stage into `next`.
    ///
    /// If this stage fails, `next` never runs.
    fn pipe<B>(self, next: B) -> Pipe<Self, B>
    where
        B: Stage<Input = Self::Output>,
    {
        Pipe {
            first: self,
            second: next,
        }
    }

    /// Transform the successful output.
    fn map<F, T>(self, transform: F) -> Map<Self, F>
    where
        F: Fn(Self::Output) -> T + Send + Sync,
        T: Send,
    {
        Map {
            inner: self,
            transform,
        }
    }

    /// Transform the successful output with a function that may fail.
    fn try_map<F, T>(self, transform: F) -> TryMap<Self, F>
    where
        F: Fn(Self::Output) -> Result<T> + Send + Sync,
        T: Send,
    {
        TryMap {
            inner: self,
            transform,
        }
    }

    /// Build the next stage from the output, then run it with that output.
    fn flat_map<F, N>(self, continuation: F) -> FlatMap<Self, F, N>
    where
        F: Fn(&Self::Output) -> Result<N> + Send + Sync,
        N: Stage<Input = Self::Output>,
    {
        FlatMap {
            inner: self,
            continuation,
            _next: PhantomData,
        }
    }

    /// Accept another input type, converted with `transform`.
    fn pullback<F, I>(self, transform: F) -> Pullback<Self, F, I>
    where
        F: Fn(I) -> Self::Input + Send + Sync,
        I: Send,
    {
        Pullback {
            inner: self,
            transform,
            _input: PhantomData,
        }
    }

    /// Mutate the input before it reaches this stage.
    fn intercept<F>(self, mutate: F) -> Intercept<Self, F>
    where
        F: Fn(&mut Self::Input) + Send + Sync,
    {
        Intercept {
            inner: self,
            mutate,
        }
    }

    /// Observe inputs and successful outputs.
    fn capture<FI, FO>(self, on_input: FI, on_output: FO) -> Capture<Self, FI, FO>
    where
        FI: Fn(&Self::Input) + Send + Sync,
        FO: Fn(&Self::Output) + Send + Sync,
    {
        Capture {
            inner: self,
            on_input,
            on_output,
        }
    }

    /// Observe inputs.
    fn capture_input<FI>(self, on_input: FI) -> Capture<Self, FI, fn(&Self::Output)>
    where
        FI: Fn(&Self::Input) + Send + Sync,
    {
        self.capture(on_input, ignore::<Self::Output> as fn(&Self::Output))
    }

    /// Observe successful outputs.
    fn capture_output<FO>(self, on_output: FO) -> Capture<Self, fn(&Self::Input), FO>
    where
        FO: Fn(&Self::Output) + Send + Sync,
    {
        self.capture(ignore::<Self::Input> as fn(&Self::Input), on_output)
    }

    /// Erase the concrete type of this stage.
    fn boxed(self) -> BoxStage<Self::Input, Self::Output>
    where
        Self: 'static,
    {
        BoxStage::new(self)
    }
}

impl<S: Stage> StageExt for S {}
