//! GraphBuilder: declarative wiring of stages and downstream targets.

use rustc_hash::FxHashMap;

use crate::config::RuntimeConfig;
use crate::stage::Stage;
use crate::transform::Transform;

/// Builder for wiring a dataflow graph before compiling it.
///
/// A graph is described as a set of named stages plus directed edges. An
/// edge's source must be a declared stage; its target may be another
/// declared stage (routing into that stage's inbound queue) or any other
/// name, which creates a named external output readable through
/// [`Graph::source`](crate::graph::Graph::source). Edge order per stage is
/// preserved and becomes the stage's outbound forwarding order.
///
/// Cycles are allowed and deliberate: a downstream stage may feed an
/// upstream stage's inbound queue to re-arm or disable it.
///
/// # Examples
///
/// ```
/// use flowline::control::Directive;
/// use flowline::graphs::GraphBuilder;
/// use flowline::transform::{from_fn, Passthrough};
///
/// // relay -> double -> "out" (external output)
/// let graph = GraphBuilder::new()
///     .add_stage("relay", Passthrough)
///     .add_stage("double", from_fn(|n: u32| Directive::Emit(n * 2)))
///     .add_edge("relay", "double")
///     .add_edge("double", "out")
///     .compile()
///     .unwrap();
/// assert!(graph.source("out").is_ok());
/// ```
pub struct GraphBuilder<T> {
    /// Declared stages, keyed by wiring name.
    pub(crate) stages: FxHashMap<String, Stage<T>>,
    /// Ordered downstream targets per stage.
    pub(crate) edges: FxHashMap<String, Vec<String>>,
    /// Names declared more than once; reported at compile time.
    pub(crate) duplicates: Vec<String>,
    pub(crate) runtime_config: RuntimeConfig,
}

impl<T: Clone + Send + 'static> Default for GraphBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> GraphBuilder<T> {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stages: FxHashMap::default(),
            edges: FxHashMap::default(),
            duplicates: Vec::new(),
            runtime_config: RuntimeConfig::default(),
        }
    }

    /// Declare a stage under a unique wiring name.
    ///
    /// Redeclaring a name is recorded and rejected at
    /// [`compile`](Self::compile) time, so wiring mistakes fail before any
    /// worker starts.
    #[must_use]
    pub fn add_stage(mut self, name: impl Into<String>, transform: impl Transform<T> + 'static) -> Self {
        let name = name.into();
        if self.stages.insert(name.clone(), Stage::new(transform)).is_some() {
            self.duplicates.push(name);
        }
        self
    }

    /// Append a downstream target to `from`'s outbound list.
    ///
    /// Targets are resolved at compile time: declared stage names route to
    /// that stage's inbound queue; anything else becomes (or reuses) a named
    /// external output. Repeating the same `(from, to)` pair forwards each
    /// item twice, in order.
    #[must_use]
    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.entry(from.into()).or_default().push(to.into());
        self
    }

    /// Attach runtime configuration (status-poll interval, event sinks) to
    /// the compiled graph.
    #[must_use]
    pub fn with_runtime_config(mut self, runtime_config: RuntimeConfig) -> Self {
        self.runtime_config = runtime_config;
        self
    }

    /// Names declared so far, for inspection.
    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.keys().map(String::as_str)
    }
}
