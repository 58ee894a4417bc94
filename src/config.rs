//! Runtime configuration for compiled graphs.

use std::time::Duration;

/// Environment variable overriding the driver status-poll interval, in
/// milliseconds.
pub const STATUS_POLL_ENV: &str = "FLOWLINE_STATUS_POLL_MS";

const DEFAULT_STATUS_POLL_MS: u64 = 100;

/// Configuration attached to a graph at compile time.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Interval at which [`Graph::wait_for_halt`](crate::graph::Graph::wait_for_halt)
    /// re-checks its sentinel stages.
    pub status_poll_interval: Duration,
    /// Event bus sink selection.
    pub event_bus: EventBusConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            status_poll_interval: Self::resolve_status_poll_interval(None),
            event_bus: EventBusConfig::default(),
        }
    }
}

impl RuntimeConfig {
    fn resolve_status_poll_interval(provided: Option<Duration>) -> Duration {
        if let Some(interval) = provided {
            return interval;
        }
        dotenvy::dotenv().ok();
        let millis = std::env::var(STATUS_POLL_ENV)
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(DEFAULT_STATUS_POLL_MS);
        Duration::from_millis(millis)
    }

    pub fn new(status_poll_interval: Option<Duration>) -> Self {
        Self {
            status_poll_interval: Self::resolve_status_poll_interval(status_poll_interval),
            event_bus: EventBusConfig::default(),
        }
    }

    #[must_use]
    pub fn with_event_bus(mut self, event_bus: EventBusConfig) -> Self {
        self.event_bus = event_bus;
        self
    }

    /// Convenience: lifecycle events rendered to stdout.
    #[must_use]
    pub fn with_stdout_event_bus(self) -> Self {
        self.with_event_bus(EventBusConfig::with_stdout_only())
    }

    /// Convenience: stdout plus an in-memory sink (tests, snapshots).
    #[must_use]
    pub fn with_memory_event_bus(self) -> Self {
        self.with_event_bus(EventBusConfig::with_memory_sink())
    }
}

/// Sinks the graph installs on its event bus at compile time.
///
/// Additional sinks (e.g. [`ChannelSink`](crate::event_bus::ChannelSink))
/// can be added through [`Graph::event_bus`](crate::graph::Graph::event_bus)
/// before starting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkConfig {
    StdOut,
    Memory,
}

#[derive(Clone, Debug)]
pub struct EventBusConfig {
    pub sinks: Vec<SinkConfig>,
}

impl EventBusConfig {
    #[must_use]
    pub fn new(sinks: Vec<SinkConfig>) -> Self {
        Self { sinks }
    }

    /// No sinks at all; events are drained and discarded.
    #[must_use]
    pub fn silent() -> Self {
        Self::new(Vec::new())
    }

    #[must_use]
    pub fn with_stdout_only() -> Self {
        Self::new(vec![SinkConfig::StdOut])
    }

    #[must_use]
    pub fn with_memory_sink() -> Self {
        Self::new(vec![SinkConfig::StdOut, SinkConfig::Memory])
    }

    #[must_use]
    pub fn add_sink(mut self, sink: SinkConfig) -> Self {
        if !self.sinks.contains(&sink) {
            self.sinks.push(sink);
        }
        self
    }

    pub fn sinks(&self) -> &[SinkConfig] {
        &self.sinks
    }
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self::silent()
    }
}
