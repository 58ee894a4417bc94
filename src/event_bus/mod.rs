//! Lifecycle observability for running graphs.
//!
//! Stage workers emit [`Event`]s (started, halted with a reason, transform
//! faults, plus transform-authored diagnostics) into the graph's
//! [`EventBus`], which broadcasts them to pluggable [`EventSink`]s.

mod bus;
mod event;
pub mod sink;

pub use bus::EventBus;
pub use event::{DiagnosticEvent, Event, StageEvent, StageEventKind};
pub use sink::{ChannelSink, EventSink, MemorySink, StdOutSink};
