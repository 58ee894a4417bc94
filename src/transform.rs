//! The per-stage transform capability.
//!
//! This module provides the [`Transform`] trait, the one seam a stage user
//! implements, along with the execution context handed to each invocation,
//! the error taxonomy, and adapters for the common cases (identity
//! passthrough, plain closures).

// Standard library and external crates
use async_trait::async_trait;
use miette::Diagnostic;
use std::marker::PhantomData;
use thiserror::Error;

// Internal crate modules
use crate::control::Directive;
use crate::event_bus::Event;

// ============================================================================
// Core Trait
// ============================================================================

/// Core trait defining what happens to each item a stage consumes.
///
/// A transform receives one inbound item and decides, via [`Directive`],
/// whether the stage forwards a (possibly new) item, swallows it, or halts.
/// Forwarding itself is owned by the stage: implementations never see the
/// outbound queues, so there is no parent call to forget.
///
/// # Design Principles
///
/// - **One concern**: a transform is the item logic only; lifecycle, queue
///   wiring, and fan-out all live in [`Stage`](crate::stage::Stage)
/// - **Synchronous with respect to the queue**: the worker awaits `apply`
///   to completion before polling the next item
/// - **Observable**: use the context to emit diagnostics to the event bus
///
/// # Error Handling
///
/// Returning `Err` halts the stage's worker: the error is logged, surfaced
/// as a fault event, and that stage alone stops. Sibling stages keep
/// running until the driver decides to tear the graph down.
///
/// # Examples
///
/// ```
/// use flowline::control::Directive;
/// use flowline::transform::{StageContext, Transform, TransformError};
/// use async_trait::async_trait;
///
/// /// Drops odd numbers, doubles even ones, stops at zero.
/// struct EvenDoubler;
///
/// #[async_trait]
/// impl Transform<i64> for EvenDoubler {
///     async fn apply(
///         &self,
///         item: i64,
///         _ctx: StageContext,
///     ) -> Result<Directive<i64>, TransformError> {
///         Ok(match item {
///             0 => Directive::Halt,
///             n if n % 2 == 0 => Directive::Emit(n * 2),
///             _ => Directive::Skip,
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait Transform<T>: Send + Sync {
    /// Process one inbound item and decide what the stage does next.
    async fn apply(&self, item: T, ctx: StageContext) -> Result<Directive<T>, TransformError>;
}

// ============================================================================
// Execution Context
// ============================================================================

/// Execution context passed to a transform for each item.
///
/// Carries the stage's graph-assigned label, the 1-based sequence number of
/// the item within this worker's run, and a channel into the graph's event
/// bus for diagnostics.
#[derive(Clone, Debug)]
pub struct StageContext {
    /// Label assigned by the graph's wiring map (or the standalone default).
    pub stage: String,
    /// 1-based count of items this worker has consumed, this run.
    pub sequence: u64,
    /// Sender into the owning graph's event bus, if the stage is wired to one.
    pub event_sender: Option<flume::Sender<Event>>,
}

impl StageContext {
    /// Emit a stage-scoped diagnostic enriched with this context's metadata.
    pub fn emit(
        &self,
        scope: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<(), StageContextError> {
        let sender = self
            .event_sender
            .as_ref()
            .ok_or(StageContextError::EventBusUnavailable)?;
        sender
            .send(Event::diagnostic_with_meta(
                self.stage.clone(),
                self.sequence,
                scope,
                message,
            ))
            .map_err(|_| StageContextError::EventBusUnavailable)
    }
}

// ============================================================================
// Adapters
// ============================================================================

/// Identity transform: forward every item unchanged.
///
/// The base behavior of the system: a stage that only relays. Useful as a
/// junction point for fan-out wiring.
#[derive(Clone, Copy, Debug, Default)]
pub struct Passthrough;

#[async_trait]
impl<T: Send + 'static> Transform<T> for Passthrough {
    async fn apply(&self, item: T, _ctx: StageContext) -> Result<Directive<T>, TransformError> {
        Ok(Directive::Emit(item))
    }
}

/// Wrap a plain closure as a [`Transform`].
///
/// ```
/// use flowline::control::Directive;
/// use flowline::transform::from_fn;
///
/// let doubler = from_fn(|n: u32| Directive::Emit(n * 2));
/// ```
pub fn from_fn<T, F>(f: F) -> FnTransform<T, F>
where
    F: Fn(T) -> Directive<T> + Send + Sync,
{
    FnTransform {
        f,
        _marker: PhantomData,
    }
}

/// Closure adapter returned by [`from_fn`].
pub struct FnTransform<T, F> {
    f: F,
    _marker: PhantomData<fn(T) -> T>,
}

#[async_trait]
impl<T, F> Transform<T> for FnTransform<T, F>
where
    T: Send + 'static,
    F: Fn(T) -> Directive<T> + Send + Sync,
{
    async fn apply(&self, item: T, _ctx: StageContext) -> Result<Directive<T>, TransformError> {
        Ok((self.f)(item))
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur when using [`StageContext`] methods.
#[derive(Debug, Error, Diagnostic)]
pub enum StageContextError {
    /// Event could not be sent: no bus is wired, or it has shut down.
    #[error("failed to emit event: event bus unavailable")]
    #[diagnostic(
        code(flowline::transform::event_bus_unavailable),
        help("The stage may not be wired to a graph, or the bus listener has stopped.")
    )]
    EventBusUnavailable,
}

/// Errors returned by transform execution.
///
/// A `TransformError` halts the returning stage's worker. It is local to
/// that stage: the core never propagates it to siblings, so the driver is
/// expected to watch a sentinel stage and tear the graph down.
#[derive(Debug, Error, Diagnostic)]
pub enum TransformError {
    /// An external feed (decoder, capture device, upstream service) failed.
    #[error("feed error ({feed}): {message}")]
    #[diagnostic(code(flowline::transform::feed))]
    Feed {
        feed: &'static str,
        message: String,
    },

    /// The inbound item did not have the shape this transform requires.
    #[error("invalid item: {0}")]
    #[diagnostic(
        code(flowline::transform::invalid_item),
        help("Check the wiring: an upstream stage is forwarding an unexpected payload.")
    )]
    InvalidItem(String),

    /// Event bus communication error.
    #[error("event bus error: {0}")]
    #[diagnostic(code(flowline::transform::event_bus))]
    EventBus(#[from] StageContextError),
}
