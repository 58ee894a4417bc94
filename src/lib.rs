//! # Flowline: Queue-wired Concurrent Stage Runtime
//!
//! Flowline builds directed dataflow graphs out of independent processing
//! stages connected by unbounded FIFO queues. Each stage runs a
//! user-supplied transform on its own worker; the graph is described
//! declaratively (stage names plus downstream targets), resolved eagerly
//! into concrete queue wiring, and driven from outside through named sinks
//! and sources.
//!
//! ## Core Concepts
//!
//! - **Transform**: the per-stage capability; one item in, a
//!   [`Directive`](control::Directive) out (emit, skip, or halt)
//! - **Stage**: one inbound queue, an ordered outbound list, one worker;
//!   forwarding is core-owned and uniform
//! - **Graph**: fixed wiring compiled from a builder; uniform
//!   start/stop/status over the whole collection
//! - **Taps**: edge targets that name no stage become external outputs,
//!   observable from outside the graph
//! - **Cycles**: edges may loop back upstream, which is the supported way
//!   for a terminal stage to re-arm or disable a source with a control item
//!
//! ## Quick Start
//!
//! ```
//! use flowline::control::Directive;
//! use flowline::graphs::GraphBuilder;
//! use flowline::transform::from_fn;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // increment -> "out", with the driver injecting the first item.
//! let graph = GraphBuilder::new()
//!     .add_stage("increment", from_fn(|n: u32| Directive::Emit(n + 1)))
//!     .add_edge("increment", "out")
//!     .compile()?;
//!
//! graph.start()?;
//! graph.sink("increment")?.send(1)?;
//! assert_eq!(graph.source("out")?.recv_async().await?, 2);
//! graph.stop().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feedback Cycles
//!
//! A stage's output may feed an upstream stage's inbound queue. The classic
//! shape is a source stage that treats its inbound items as enable/disable
//! control and a terminal display stage that pushes a control item back
//! after presenting each unit of data. The graph then free-runs until the
//! source is exhausted or the display reports it was closed. See
//! `demos/video_pipeline.rs` for a complete simulated pipeline.
//!
//! ## Queues Are Unbounded
//!
//! Enqueueing never blocks and there is no back-pressure: if a consumer
//! stalls, its inbound queue grows without bound. That is a deliberate
//! property of this design; keep an eye on producer/consumer rate
//! mismatches in long-running graphs.
//!
//! ## Module Guide
//!
//! - [`transform`] - The [`Transform`](transform::Transform) trait, context, and adapters
//! - [`control`] - [`Directive`](control::Directive) and halt reasons
//! - [`stage`] - Stage lifecycle and the worker run loop
//! - [`graphs`] - Declarative wiring and compilation
//! - [`graph`] - The compiled, runnable graph
//! - [`event_bus`] - Lifecycle events, sinks, background listener
//! - [`telemetry`] - Event formatting and tracing setup
//! - [`config`] - Runtime configuration

pub mod config;
pub mod control;
pub mod event_bus;
pub mod graph;
pub mod graphs;
pub mod stage;
pub mod telemetry;
pub mod transform;
