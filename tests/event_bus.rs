mod common;

use std::time::Duration;

use common::*;
use flowline::config::{EventBusConfig, RuntimeConfig, SinkConfig};
use flowline::control::HaltReason;
use flowline::event_bus::{ChannelSink, Event, EventBus, MemorySink, StageEventKind};
use flowline::graphs::GraphBuilder;

fn memory_only_config() -> RuntimeConfig {
    RuntimeConfig::new(Some(Duration::from_millis(20)))
        .with_event_bus(EventBusConfig::new(vec![SinkConfig::Memory]))
}

#[tokio::test]
async fn lifecycle_events_reach_the_memory_sink() {
    let graph = GraphBuilder::new()
        .add_stage("limited", HaltAfter { limit: 1 })
        .with_runtime_config(memory_only_config())
        .compile()
        .unwrap();

    graph.start().unwrap();
    graph.sink("limited").unwrap().send(1).unwrap();
    assert!(wait_until(Duration::from_secs(2), || !graph.is_running("limited").unwrap()).await);
    graph.stop().await;

    let events = graph.memory_sink().unwrap().snapshot();
    let stage_events: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            Event::Stage(ev) => Some(ev),
            _ => None,
        })
        .collect();

    assert!(stage_events
        .iter()
        .any(|ev| ev.stage() == "limited" && matches!(ev.kind(), StageEventKind::Started)));
    assert!(stage_events.iter().any(|ev| {
        ev.stage() == "limited"
            && matches!(
                ev.kind(),
                StageEventKind::Halted {
                    reason: HaltReason::Exhausted
                }
            )
    }));
}

#[tokio::test]
async fn requested_stop_is_reported_as_such() {
    let graph = GraphBuilder::<u32>::new()
        .add_stage("relay", flowline::transform::Passthrough)
        .with_runtime_config(memory_only_config())
        .compile()
        .unwrap();

    graph.start().unwrap();
    graph.stop().await;

    let events = graph.memory_sink().unwrap().snapshot();
    assert!(events.iter().any(|e| matches!(
        e,
        Event::Stage(ev) if matches!(
            ev.kind(),
            StageEventKind::Halted { reason: HaltReason::Requested }
        )
    )));
}

#[tokio::test]
async fn transform_diagnostics_carry_stage_and_sequence() {
    let graph = GraphBuilder::new()
        .add_stage("announcer", Announcer)
        .with_runtime_config(memory_only_config())
        .compile()
        .unwrap();

    graph.start().unwrap();
    let sink = graph.sink("announcer").unwrap();
    sink.send(10).unwrap();
    sink.send(20).unwrap();

    let snapshot = graph.memory_sink().unwrap().clone();
    assert!(
        wait_until(Duration::from_secs(2), || {
            snapshot
                .snapshot()
                .iter()
                .filter(|e| matches!(e, Event::Diagnostic(_)))
                .count()
                >= 2
        })
        .await
    );
    graph.stop().await;

    let events = graph.memory_sink().unwrap().snapshot();
    let diags: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            Event::Diagnostic(d) => Some(d),
            _ => None,
        })
        .collect();
    assert_eq!(diags[0].stage(), Some("announcer"));
    assert_eq!(diags[0].sequence(), Some(1));
    assert_eq!(diags[0].scope(), "announce");
    assert_eq!(diags[0].message(), "saw 10");
    assert_eq!(diags[1].sequence(), Some(2));
}

#[tokio::test]
async fn faults_surface_as_events() {
    let graph = GraphBuilder::new()
        .add_stage("fragile", AlwaysFails)
        .with_runtime_config(memory_only_config())
        .compile()
        .unwrap();

    graph.start().unwrap();
    graph.sink("fragile").unwrap().send(1).unwrap();
    assert!(wait_until(Duration::from_secs(2), || !graph.is_running("fragile").unwrap()).await);
    graph.stop().await;

    let events = graph.memory_sink().unwrap().snapshot();
    assert!(events.iter().any(|e| matches!(
        e,
        Event::Stage(ev) if matches!(ev.kind(), StageEventKind::Fault { .. })
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        Event::Stage(ev) if matches!(
            ev.kind(),
            StageEventKind::Halted { reason: HaltReason::Fault }
        )
    )));
}

#[tokio::test]
async fn multiple_listen_calls_are_idempotent() {
    let sink = MemorySink::new();
    let snapshot = sink.clone();
    let bus = EventBus::with_sink(sink);

    bus.listen_for_events();
    bus.listen_for_events();
    bus.listen_for_events();

    let sender = bus.sender();
    sender.send(Event::diagnostic("s", "a")).unwrap();
    sender.send(Event::diagnostic("s", "b")).unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    bus.stop_listener().await;

    let entries = snapshot.snapshot();
    assert_eq!(entries.len(), 2);
}

#[tokio::test]
async fn stopping_without_events_is_noop() {
    let bus = EventBus::with_sink(MemorySink::new());
    bus.listen_for_events();
    bus.stop_listener().await;
}

#[tokio::test]
async fn channel_sink_forwards_events() {
    let (tx, rx) = flume::unbounded();
    let bus = EventBus::with_sink(ChannelSink::new(tx));
    bus.listen_for_events();

    bus.sender()
        .send(Event::diagnostic_with_meta("display", 3, "render", "shown"))
        .unwrap();

    let received = rx.recv_async().await.unwrap();
    assert_eq!(received.stage_label(), Some("display"));
    assert_eq!(received.scope_label(), "render");
    bus.stop_listener().await;
}

#[test]
fn events_export_as_json() {
    let event = Event::stage_halted("decoder", 12, HaltReason::Exhausted);
    let json = event.to_json_value();
    assert_eq!(json["type"], "stage");
    assert_eq!(json["stage"], "decoder");
    assert_eq!(json["sequence"], 12);
    assert_eq!(json["kind"], "halted");

    let raw = event.to_json_string().unwrap();
    assert!(raw.contains("\"kind\":\"halted\""));
}
