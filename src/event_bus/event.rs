use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::control::HaltReason;

/// Structured event flowing through the [`EventBus`](super::EventBus).
///
/// Two families exist: lifecycle events produced by stage workers, and
/// diagnostics authored by transforms through
/// [`StageContext::emit`](crate::transform::StageContext::emit).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Event {
    Stage(StageEvent),
    Diagnostic(DiagnosticEvent),
}

impl Event {
    /// Lifecycle event: a stage's worker entered its run loop.
    pub fn stage_started(stage: impl Into<String>) -> Self {
        Event::Stage(StageEvent::new(stage.into(), 0, StageEventKind::Started))
    }

    /// Lifecycle event: a stage's worker exited its run loop.
    pub fn stage_halted(stage: impl Into<String>, sequence: u64, reason: HaltReason) -> Self {
        Event::Stage(StageEvent::new(
            stage.into(),
            sequence,
            StageEventKind::Halted { reason },
        ))
    }

    /// Lifecycle event: the transform returned an error and the worker is
    /// halting itself.
    pub fn stage_fault(stage: impl Into<String>, sequence: u64, message: impl Into<String>) -> Self {
        Event::Stage(StageEvent::new(
            stage.into(),
            sequence,
            StageEventKind::Fault {
                message: message.into(),
            },
        ))
    }

    /// Free-form diagnostic with no stage attribution.
    pub fn diagnostic(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Event::Diagnostic(DiagnosticEvent {
            stage: None,
            sequence: None,
            scope: scope.into(),
            message: message.into(),
        })
    }

    /// Diagnostic enriched with the emitting stage's label and item sequence.
    pub fn diagnostic_with_meta(
        stage: impl Into<String>,
        sequence: u64,
        scope: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Event::Diagnostic(DiagnosticEvent {
            stage: Some(stage.into()),
            sequence: Some(sequence),
            scope: scope.into(),
            message: message.into(),
        })
    }

    /// The stage this event is attributed to, if any.
    pub fn stage_label(&self) -> Option<&str> {
        match self {
            Event::Stage(ev) => Some(ev.stage()),
            Event::Diagnostic(diag) => diag.stage(),
        }
    }

    /// The scope label: a diagnostic's scope, or `"lifecycle"` for stage
    /// events.
    pub fn scope_label(&self) -> &str {
        match self {
            Event::Stage(_) => "lifecycle",
            Event::Diagnostic(diag) => diag.scope(),
        }
    }

    /// Convert the event to a structured JSON value with a normalized
    /// schema: `type`, `scope`, `stage`, `timestamp`, plus variant fields.
    ///
    /// # Example
    ///
    /// ```
    /// use flowline::event_bus::Event;
    ///
    /// let event = Event::diagnostic_with_meta("display", 7, "render", "frame shown");
    /// let json = event.to_json_value();
    ///
    /// assert_eq!(json["type"], "diagnostic");
    /// assert_eq!(json["stage"], "display");
    /// assert_eq!(json["sequence"], 7);
    /// assert_eq!(json["message"], "frame shown");
    /// ```
    pub fn to_json_value(&self) -> Value {
        use serde_json::json;

        match self {
            Event::Stage(ev) => {
                let (kind, detail) = match ev.kind() {
                    StageEventKind::Started => ("started", Value::Null),
                    StageEventKind::Halted { reason } => ("halted", json!(reason)),
                    StageEventKind::Fault { message } => ("fault", json!(message)),
                };
                json!({
                    "type": "stage",
                    "scope": self.scope_label(),
                    "stage": ev.stage(),
                    "sequence": ev.sequence(),
                    "kind": kind,
                    "detail": detail,
                    "timestamp": ev.when().to_rfc3339(),
                })
            }
            Event::Diagnostic(diag) => json!({
                "type": "diagnostic",
                "scope": diag.scope(),
                "stage": diag.stage(),
                "sequence": diag.sequence(),
                "message": diag.message(),
                "timestamp": Utc::now().to_rfc3339(),
            }),
        }
    }

    /// Compact JSON string representation, for log shipping.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_json_value())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Stage(ev) => match ev.kind() {
                StageEventKind::Started => write!(f, "[{}] started", ev.stage()),
                StageEventKind::Halted { reason } => {
                    write!(f, "[{}#{}] halted ({reason})", ev.stage(), ev.sequence())
                }
                StageEventKind::Fault { message } => {
                    write!(f, "[{}#{}] fault: {message}", ev.stage(), ev.sequence())
                }
            },
            Event::Diagnostic(diag) => match (diag.stage(), diag.sequence()) {
                (Some(stage), Some(seq)) => {
                    write!(f, "[{stage}#{seq}] {}: {}", diag.scope(), diag.message())
                }
                _ => write!(f, "{}: {}", diag.scope(), diag.message()),
            },
        }
    }
}

/// Lifecycle event for a single stage worker.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageEvent {
    stage: String,
    /// Items the worker had consumed when the event was recorded.
    sequence: u64,
    kind: StageEventKind,
    when: DateTime<Utc>,
}

impl StageEvent {
    pub fn new(stage: String, sequence: u64, kind: StageEventKind) -> Self {
        Self {
            stage,
            sequence,
            kind,
            when: Utc::now(),
        }
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn kind(&self) -> &StageEventKind {
        &self.kind
    }

    pub fn when(&self) -> DateTime<Utc> {
        self.when
    }
}

/// What happened to the worker.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum StageEventKind {
    Started,
    Halted { reason: HaltReason },
    Fault { message: String },
}

/// Transform-authored message, optionally attributed to a stage and item
/// sequence.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiagnosticEvent {
    stage: Option<String>,
    sequence: Option<u64>,
    scope: String,
    message: String,
}

impl DiagnosticEvent {
    pub fn stage(&self) -> Option<&str> {
        self.stage.as_deref()
    }

    pub fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
