//! Eager wiring resolution: builder → runnable graph.

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::config::SinkConfig;
use crate::event_bus::{EventBus, EventSink, MemorySink, StdOutSink};
use crate::graph::Graph;

impl<T: Clone + Send + 'static> super::builder::GraphBuilder<T> {
    /// Compile the wiring description into a runnable [`Graph`](crate::graph::Graph).
    ///
    /// Resolution is eager and happens exactly once, before any stage can
    /// start: every downstream name is bound either to a declared stage's
    /// inbound queue or to a named external output created here. A name
    /// targeted by several stages binds them all to the *same* queue,
    /// giving shared fan-in on a stage or a shared tap otherwise.
    ///
    /// No cycle detection is performed; cycles are a supported wiring
    /// pattern, not an error.
    ///
    /// # Errors
    ///
    /// - [`GraphCompileError::DuplicateStage`] if a stage name was declared
    ///   twice.
    /// - [`GraphCompileError::UnknownEdgeSource`] if an edge originates at a
    ///   name that is not a declared stage.
    pub fn compile(mut self) -> Result<Graph<T>, GraphCompileError> {
        if let Some(name) = self.duplicates.first() {
            return Err(GraphCompileError::DuplicateStage { name: name.clone() });
        }
        for from in self.edges.keys() {
            if !self.stages.contains_key(from) {
                return Err(GraphCompileError::UnknownEdgeSource { name: from.clone() });
            }
        }

        let (event_bus, memory_sink) = build_event_bus(self.runtime_config.event_bus.sinks());
        let event_sender = event_bus.sender();

        // Inbound senders have to be collected up front: resolution below
        // needs them while holding &mut borrows of the stages themselves.
        let inbounds: FxHashMap<String, flume::Sender<T>> = self
            .stages
            .iter()
            .map(|(name, stage)| (name.clone(), stage.inbound()))
            .collect();

        let mut taps: FxHashMap<String, (flume::Sender<T>, flume::Receiver<T>)> =
            FxHashMap::default();

        for (name, stage) in self.stages.iter_mut() {
            let targets = self.edges.get(name).map(Vec::as_slice).unwrap_or(&[]);
            let mut outputs = Vec::with_capacity(targets.len());
            for target in targets {
                if let Some(inbound) = inbounds.get(target) {
                    outputs.push(inbound.clone());
                } else {
                    let tap = taps.entry(target.clone()).or_insert_with(flume::unbounded);
                    outputs.push(tap.0.clone());
                }
            }
            stage.set_outputs(outputs);
            stage.set_label(name.clone());
            stage.set_event_sender(event_sender.clone());
        }

        Ok(Graph::from_parts(
            self.stages,
            taps,
            event_bus,
            memory_sink,
            self.runtime_config,
        ))
    }
}

fn build_event_bus(sinks: &[SinkConfig]) -> (EventBus, Option<MemorySink>) {
    let mut boxed: Vec<Box<dyn EventSink>> = Vec::with_capacity(sinks.len());
    let mut memory = None;
    for sink in sinks {
        match sink {
            SinkConfig::StdOut => boxed.push(Box::new(StdOutSink::default())),
            SinkConfig::Memory => {
                let sink = MemorySink::new();
                memory = Some(sink.clone());
                boxed.push(Box::new(sink));
            }
        }
    }
    (EventBus::with_sinks(boxed), memory)
}

/// Wiring mistakes caught before any stage starts.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphCompileError {
    /// The same stage name was declared more than once.
    #[error("stage `{name}` is declared more than once")]
    #[diagnostic(code(flowline::graphs::duplicate_stage))]
    DuplicateStage { name: String },

    /// An edge originates at a name with no declared stage behind it.
    #[error("edge source `{name}` is not a declared stage")]
    #[diagnostic(
        code(flowline::graphs::unknown_edge_source),
        help("Edges must originate at stages added with `add_stage`; only edge *targets* may name external outputs.")
    )]
    UnknownEdgeSource { name: String },
}
