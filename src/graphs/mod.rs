//! Graph definition and compilation.
//!
//! [`GraphBuilder`] collects named stages and directed edges, then
//! [`compile`](GraphBuilder::compile) resolves every downstream name
//! (eagerly, exactly once) into concrete queues and produces a runnable
//! [`Graph`](crate::graph::Graph).
//!
//! # Core Concepts
//!
//! - **Stages**: queue-fed workers wrapping a [`Transform`](crate::transform::Transform)
//! - **Edges**: ordered downstream targets; a target that names a stage
//!   routes into its inbound queue, any other target becomes an external
//!   output ("tap")
//! - **Cycles**: permitted and used for feedback control (a sink re-arming
//!   a source)
//!
//! # Quick Start
//!
//! ```
//! use flowline::control::Directive;
//! use flowline::graphs::GraphBuilder;
//! use flowline::transform::from_fn;
//!
//! let graph = GraphBuilder::new()
//!     .add_stage("double", from_fn(|n: u32| Directive::Emit(n * 2)))
//!     .add_edge("double", "out")
//!     .compile()
//!     .unwrap();
//! ```

mod builder;
mod compilation;

pub use builder::GraphBuilder;
pub use compilation::GraphCompileError;
