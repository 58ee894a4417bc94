//! Control-flow primitives returned by transforms to steer their stage's
//! run loop.
//!
//! Directives are kept separate from the items themselves so a transform can
//! express "forward this", "swallow this", or "shut me down" without ever
//! touching the outbound queues. Forwarding is applied uniformly by the
//! stage after the transform returns.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Decision returned by a transform for a single inbound item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Directive<T> {
    /// Forward the payload to every outbound queue, in wiring order, and
    /// keep polling.
    Emit(T),
    /// Keep polling without forwarding anything.
    Skip,
    /// Stop this stage's worker. Nothing is forwarded; other stages are
    /// unaffected.
    Halt,
}

impl<T> Directive<T> {
    /// Returns `true` for [`Directive::Halt`].
    #[must_use]
    pub fn is_halt(&self) -> bool {
        matches!(self, Directive::Halt)
    }

    /// Map the emitted payload, leaving `Skip`/`Halt` untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Directive<U> {
        match self {
            Directive::Emit(item) => Directive::Emit(f(item)),
            Directive::Skip => Directive::Skip,
            Directive::Halt => Directive::Halt,
        }
    }
}

/// Why a stage's worker exited its run loop.
///
/// Reported in the halted lifecycle event so drivers and sinks can tell a
/// requested shutdown apart from a stage that wound itself down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HaltReason {
    /// `stop()` was observed (or the stage handle was dropped).
    Requested,
    /// The transform returned [`Directive::Halt`].
    Exhausted,
    /// The transform returned an error; the worker halted itself.
    Fault,
    /// Every sender for the inbound queue was dropped.
    Disconnected,
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested => write!(f, "requested"),
            Self::Exhausted => write!(f, "exhausted"),
            Self::Fault => write!(f, "fault"),
            Self::Disconnected => write!(f, "disconnected"),
        }
    }
}
