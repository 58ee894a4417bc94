//! The compiled, runnable graph.

use rustc_hash::FxHashMap;

use miette::Diagnostic;
use thiserror::Error;

use crate::config::RuntimeConfig;
use crate::event_bus::{EventBus, MemorySink};
use crate::stage::{Stage, StageError};

/// A fixed collection of wired stages plus the external-output queues their
/// edges created.
///
/// Produced by [`GraphBuilder::compile`](crate::graphs::GraphBuilder::compile);
/// the wiring is immutable from then on. The graph owns every stage, every
/// tap, and the event bus; stages hold only cloned senders into each
/// other's queues.
///
/// A graph is driven from outside: inject the first item(s) through
/// [`sink`](Self::sink), watch a sentinel stage with
/// [`is_running`](Self::is_running) or [`wait_for_halt`](Self::wait_for_halt),
/// and call [`stop`](Self::stop) to tear everything down. One stage halting
/// never auto-terminates its siblings.
///
/// Dropping a running graph also winds the workers down: each stage's
/// shutdown sender is dropped with it, which its worker observes.
///
/// # Examples
///
/// ```no_run
/// use flowline::control::Directive;
/// use flowline::graphs::GraphBuilder;
/// use flowline::transform::from_fn;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let graph = GraphBuilder::new()
///     .add_stage("double", from_fn(|n: u32| Directive::Emit(n * 2)))
///     .add_edge("double", "out")
///     .compile()?;
///
/// graph.start()?;
/// graph.sink("double")?.send(21)?;
/// assert_eq!(graph.source("out")?.recv_async().await?, 42);
/// graph.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct Graph<T> {
    stages: FxHashMap<String, Stage<T>>,
    taps: FxHashMap<String, (flume::Sender<T>, flume::Receiver<T>)>,
    event_bus: EventBus,
    memory_sink: Option<MemorySink>,
    runtime_config: RuntimeConfig,
}

impl<T> std::fmt::Debug for Graph<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("stages", &self.stages.keys().collect::<Vec<_>>())
            .field("taps", &self.taps.keys().collect::<Vec<_>>())
            .field("memory_sink", &self.memory_sink.is_some())
            .field("runtime_config", &self.runtime_config)
            .finish_non_exhaustive()
    }
}

impl<T: Clone + Send + 'static> Graph<T> {
    /// Internal (crate) factory; wiring happens in the builder's compile.
    pub(crate) fn from_parts(
        stages: FxHashMap<String, Stage<T>>,
        taps: FxHashMap<String, (flume::Sender<T>, flume::Receiver<T>)>,
        event_bus: EventBus,
        memory_sink: Option<MemorySink>,
        runtime_config: RuntimeConfig,
    ) -> Self {
        Self {
            stages,
            taps,
            event_bus,
            memory_sink,
            runtime_config,
        }
    }

    /// Start the event-bus listener and every declared stage.
    ///
    /// Start order carries no meaning: stages only communicate through
    /// queues that already exist, and nothing flows until the driver injects
    /// an item. If any stage is already running the first
    /// [`StageError::AlreadyRunning`] is propagated; stages started earlier
    /// in the same call keep running and a subsequent [`stop`](Self::stop)
    /// still tears the whole graph down.
    pub fn start(&self) -> Result<(), GraphError> {
        self.event_bus.listen_for_events();
        for stage in self.stages.values() {
            stage.start()?;
        }
        tracing::info!(stages = self.stages.len(), "graph started");
        Ok(())
    }

    /// Stop every stage, then the event-bus listener. Stop order is not
    /// significant; each stage only waits on its own worker.
    pub async fn stop(&self) {
        for stage in self.stages.values() {
            stage.stop().await;
        }
        self.event_bus.stop_listener().await;
        tracing::info!("graph stopped");
    }

    /// Whether the named stage's worker is currently alive.
    pub fn is_running(&self, name: &str) -> Result<bool, GraphError> {
        self.stage(name).map(Stage::is_running)
    }

    /// The inbound queue of a declared stage, for injecting driving items.
    pub fn sink(&self, name: &str) -> Result<flume::Sender<T>, GraphError> {
        self.stage(name).map(Stage::inbound)
    }

    /// The external output registered under `name` during compilation.
    ///
    /// Only names that some stage targeted, and that are not themselves
    /// declared stages, exist as sources.
    pub fn source(&self, name: &str) -> Result<flume::Receiver<T>, GraphError> {
        self.taps
            .get(name)
            .map(|(_, rx)| rx.clone())
            .ok_or_else(|| GraphError::SourceNotFound {
                name: name.to_string(),
            })
    }

    /// Poll the named sentinel stages at the configured interval and return
    /// once any of them has stopped running.
    ///
    /// This is the driver loop of the system: pick the stages whose halt
    /// means the run is over (typically the source and the terminal sink)
    /// and call [`stop`](Self::stop) when this returns. Names are validated
    /// up front.
    pub async fn wait_for_halt(&self, sentinels: &[&str]) -> Result<(), GraphError> {
        for name in sentinels {
            self.stage(name)?;
        }
        loop {
            for name in sentinels {
                if !self.is_running(name)? {
                    tracing::debug!(stage = %name, "sentinel halted");
                    return Ok(());
                }
            }
            tokio::time::sleep(self.runtime_config.status_poll_interval).await;
        }
    }

    /// Names of all declared stages.
    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.keys().map(String::as_str)
    }

    /// Names of all external outputs created during compilation.
    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.taps.keys().map(String::as_str)
    }

    /// The graph's event bus, e.g. to add sinks before starting.
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// The memory sink, when [`SinkConfig::Memory`](crate::config::SinkConfig::Memory)
    /// was configured.
    pub fn memory_sink(&self) -> Option<&MemorySink> {
        self.memory_sink.as_ref()
    }

    pub fn runtime_config(&self) -> &RuntimeConfig {
        &self.runtime_config
    }

    fn stage(&self, name: &str) -> Result<&Stage<T>, GraphError> {
        self.stages
            .get(name)
            .ok_or_else(|| GraphError::StageNotFound {
                name: name.to_string(),
            })
    }
}

/// Usage errors on the graph surface.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    /// The named stage is not declared in the wiring.
    #[error("unknown stage `{name}`")]
    #[diagnostic(code(flowline::graph::stage_not_found))]
    StageNotFound { name: String },

    /// The named external output was never created during compilation.
    #[error("unknown external output `{name}`")]
    #[diagnostic(
        code(flowline::graph::source_not_found),
        help("External outputs exist only for edge targets that are not declared stages.")
    )]
    SourceNotFound { name: String },

    /// A stage-level lifecycle error.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Stage(#[from] StageError),
}
