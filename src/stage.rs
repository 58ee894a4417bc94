//! The stage: one queue-fed worker running an injected transform.
//!
//! A [`Stage`] owns its inbound unbounded FIFO queue and an ordered list of
//! outbound senders. [`start`](Stage::start) spawns a worker that races a
//! shutdown signal against the inbound queue, applies the transform to each
//! item, and forwards emitted results to every outbound queue. A stage stops
//! either cooperatively ([`stop`](Stage::stop)) or by its own transform's
//! decision, visible to observers through [`is_running`](Stage::is_running)
//! without any external intervention.

use std::sync::{Arc, Mutex};

use miette::Diagnostic;
use thiserror::Error;
use tokio::{sync::oneshot, task};

use crate::control::{Directive, HaltReason};
use crate::event_bus::Event;
use crate::transform::{StageContext, Transform};

/// Label carried by stages that have not been wired into a graph.
pub const UNWIRED_LABEL: &str = "stage";

/// An independently-scheduled processing unit: one inbound queue, zero or
/// more outbound queues, one worker.
///
/// Stages are not self-named; the graph assigns a label when it wires them.
/// Outbound wiring is fixed before start: [`set_outputs`](Self::set_outputs)
/// takes `&mut self`, so once a stage is shared (inside a compiled graph)
/// its wiring cannot change.
///
/// # Examples
///
/// ```no_run
/// use flowline::control::Directive;
/// use flowline::stage::Stage;
/// use flowline::transform::from_fn;
///
/// # async fn example() -> Result<(), flowline::stage::StageError> {
/// let (out_tx, out_rx) = flume::unbounded();
/// let mut stage = Stage::new(from_fn(|n: u32| Directive::Emit(n + 1)));
/// stage.set_outputs(vec![out_tx]);
///
/// stage.start()?;
/// stage.inbound().send(41).unwrap();
/// assert_eq!(out_rx.recv_async().await.unwrap(), 42);
/// stage.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct Stage<T> {
    transform: Arc<dyn Transform<T>>,
    label: String,
    inbound: (flume::Sender<T>, flume::Receiver<T>),
    outputs: Vec<flume::Sender<T>>,
    event_sender: Option<flume::Sender<Event>>,
    worker: Mutex<Option<WorkerState>>,
}

impl<T: Clone + Send + 'static> Stage<T> {
    /// Construct an idle stage around a transform. No outputs, no worker.
    pub fn new(transform: impl Transform<T> + 'static) -> Self {
        Self {
            transform: Arc::new(transform),
            label: UNWIRED_LABEL.to_string(),
            inbound: flume::unbounded(),
            outputs: Vec::new(),
            event_sender: None,
            worker: Mutex::new(None),
        }
    }

    /// Replace the outbound queue list. Must happen before [`start`](Self::start);
    /// the `&mut` receiver makes a later call impossible once the stage is
    /// shared.
    pub fn set_outputs(&mut self, outputs: Vec<flume::Sender<T>>) {
        self.outputs = outputs;
    }

    /// Assign the diagnostic label. Called by the graph with the wiring name.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Wire the stage into an event bus for lifecycle events and transform
    /// diagnostics.
    pub fn set_event_sender(&mut self, sender: flume::Sender<Event>) {
        self.event_sender = Some(sender);
    }

    /// The graph-assigned label (or [`UNWIRED_LABEL`]).
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Clone of the inbound queue's sender, for upstream wiring or external
    /// injection.
    pub fn inbound(&self) -> flume::Sender<T> {
        self.inbound.0.clone()
    }

    /// Spawn the worker. Fails with [`StageError::AlreadyRunning`] if a live
    /// worker exists; a stage whose previous worker has exited (stopped or
    /// self-halted) may be started again.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<(), StageError> {
        let mut guard = self.worker.lock().expect("worker poisoned");
        if let Some(state) = guard.as_ref() {
            if !state.handle.is_finished() {
                return Err(StageError::AlreadyRunning {
                    stage: self.label.clone(),
                });
            }
        }

        let transform = Arc::clone(&self.transform);
        let label = self.label.clone();
        let receiver = self.inbound.1.clone();
        let outputs = self.outputs.clone();
        let events = self.event_sender.clone();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let handle = task::spawn(async move {
            tracing::debug!(stage = %label, outputs = outputs.len(), "worker started");
            emit(&events, Event::stage_started(label.clone()));

            let mut sequence: u64 = 0;
            let reason = loop {
                tokio::select! {
                    // Checked first so a busy inbound queue cannot starve
                    // the shutdown signal.
                    biased;
                    _ = &mut shutdown_rx => break HaltReason::Requested,
                    recv = receiver.recv_async() => match recv {
                        // Stage (and its inbound sender) dropped mid-run.
                        Err(_) => break HaltReason::Disconnected,
                        Ok(item) => {
                            sequence += 1;
                            let ctx = StageContext {
                                stage: label.clone(),
                                sequence,
                                event_sender: events.clone(),
                            };
                            match transform.apply(item, ctx).await {
                                Ok(Directive::Emit(item)) => {
                                    for output in &outputs {
                                        if output.send(item.clone()).is_err() {
                                            tracing::warn!(
                                                stage = %label,
                                                "outbound queue disconnected; dropping item"
                                            );
                                        }
                                    }
                                }
                                Ok(Directive::Skip) => {}
                                Ok(Directive::Halt) => break HaltReason::Exhausted,
                                Err(err) => {
                                    tracing::error!(stage = %label, error = %err, "transform failed");
                                    emit(
                                        &events,
                                        Event::stage_fault(label.clone(), sequence, err.to_string()),
                                    );
                                    break HaltReason::Fault;
                                }
                            }
                        }
                    }
                }
            };

            tracing::debug!(stage = %label, %reason, items = sequence, "worker halted");
            emit(&events, Event::stage_halted(label.clone(), sequence, reason));
        });

        *guard = Some(WorkerState {
            shutdown_tx,
            handle,
        });
        Ok(())
    }

    /// True while the worker task is alive; false once it has exited,
    /// whether by [`stop`](Self::stop) or by self-halt.
    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .expect("worker poisoned")
            .as_ref()
            .map(|state| !state.handle.is_finished())
            .unwrap_or(false)
    }

    /// Request shutdown and wait for the worker to exit.
    ///
    /// The signal wakes an idle worker immediately; a worker inside a
    /// transform exits at the next poll. Idempotent: on a never-started or
    /// already-stopped stage this returns at once. A transform that never
    /// returns will block this call.
    pub async fn stop(&self) {
        let state = {
            let mut guard = self.worker.lock().expect("worker poisoned");
            guard.take()
        };
        if let Some(state) = state {
            let _ = state.shutdown_tx.send(());
            let _ = state.handle.await;
        }
    }
}

fn emit(events: &Option<flume::Sender<Event>>, event: Event) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}

/// Shutdown signal plus join handle for one live worker.
struct WorkerState {
    shutdown_tx: oneshot::Sender<()>,
    handle: task::JoinHandle<()>,
}

/// Stage lifecycle usage errors.
#[derive(Debug, Error, Diagnostic)]
pub enum StageError {
    /// `start` was called while a worker is still alive.
    #[error("stage `{stage}` is already running")]
    #[diagnostic(
        code(flowline::stage::already_running),
        help("Call `stop()` and let the worker exit before starting the stage again.")
    )]
    AlreadyRunning { stage: String },
}
