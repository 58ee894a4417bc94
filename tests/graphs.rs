mod common;

use common::*;
use flowline::graph::GraphError;
use flowline::graphs::{GraphBuilder, GraphCompileError};
use flowline::transform::Passthrough;

#[test]
fn compile_creates_taps_for_undeclared_targets() {
    let graph = GraphBuilder::<u32>::new()
        .add_stage("relay", Passthrough)
        .add_edge("relay", "out")
        .compile()
        .unwrap();

    assert!(graph.source("out").is_ok());
    let err = graph.source("missing").unwrap_err();
    assert!(matches!(err, GraphError::SourceNotFound { .. }));
}

#[test]
fn declared_stages_are_not_taps() {
    let graph = GraphBuilder::<u32>::new()
        .add_stage("a", Passthrough)
        .add_stage("b", Passthrough)
        .add_edge("a", "b")
        .compile()
        .unwrap();

    // "b" resolved to a stage inbound, so no external output was created.
    assert!(matches!(
        graph.source("b").unwrap_err(),
        GraphError::SourceNotFound { .. }
    ));
    assert_eq!(graph.source_names().count(), 0);
}

#[test]
fn compile_rejects_duplicate_stage() {
    let err = GraphBuilder::<u32>::new()
        .add_stage("a", Passthrough)
        .add_stage("a", Passthrough)
        .compile()
        .unwrap_err();
    assert!(matches!(err, GraphCompileError::DuplicateStage { name } if name == "a"));
}

#[test]
fn compile_rejects_unknown_edge_source() {
    let err = GraphBuilder::<u32>::new()
        .add_stage("a", Passthrough)
        .add_edge("ghost", "a")
        .compile()
        .unwrap_err();
    assert!(matches!(err, GraphCompileError::UnknownEdgeSource { name } if name == "ghost"));
}

#[test]
fn empty_graph_compiles() {
    let graph = GraphBuilder::<u32>::new().compile().unwrap();
    assert_eq!(graph.stage_names().count(), 0);
    assert_eq!(graph.source_names().count(), 0);
}

#[test]
fn unknown_names_error_on_the_graph_surface() {
    let graph = GraphBuilder::<u32>::new()
        .add_stage("a", Passthrough)
        .compile()
        .unwrap();

    assert!(matches!(
        graph.sink("nope").unwrap_err(),
        GraphError::StageNotFound { .. }
    ));
    assert!(matches!(
        graph.is_running("nope").unwrap_err(),
        GraphError::StageNotFound { .. }
    ));
    assert!(graph.sink("a").is_ok());
    assert!(!graph.is_running("a").unwrap());
}

#[test]
fn self_loop_is_structurally_allowed() {
    let graph = GraphBuilder::<u32>::new()
        .add_stage("echo", Passthrough)
        .add_edge("echo", "echo")
        .compile()
        .unwrap();
    assert!(graph.sink("echo").is_ok());
}

#[tokio::test]
async fn edge_to_declared_stage_routes_into_its_inbound() {
    let recorder = Recorder::new();
    let graph = GraphBuilder::new()
        .add_stage("head", Passthrough)
        .add_stage("tail", recorder.clone())
        .add_edge("head", "tail")
        .add_edge("tail", "out")
        .compile()
        .unwrap();

    graph.start().unwrap();
    graph.sink("head").unwrap().send(9).unwrap();

    let out = graph.source("out").unwrap();
    assert_eq!(out.recv_async().await.unwrap(), 9);
    assert_eq!(recorder.seen(), vec![9]);
    graph.stop().await;
}

#[tokio::test]
async fn shared_external_target_is_one_queue() {
    let graph = GraphBuilder::<u32>::new()
        .add_stage("a", Passthrough)
        .add_stage("b", Passthrough)
        .add_edge("a", "merged")
        .add_edge("b", "merged")
        .compile()
        .unwrap();

    graph.start().unwrap();
    graph.sink("a").unwrap().send(1).unwrap();
    graph.sink("b").unwrap().send(2).unwrap();

    let merged = graph.source("merged").unwrap();
    let mut got = vec![
        merged.recv_async().await.unwrap(),
        merged.recv_async().await.unwrap(),
    ];
    got.sort_unstable();
    assert_eq!(got, vec![1, 2]);
    graph.stop().await;
}

#[tokio::test]
async fn graph_restarts_after_stop() {
    let graph = GraphBuilder::<u32>::new()
        .add_stage("relay", Passthrough)
        .add_edge("relay", "out")
        .compile()
        .unwrap();

    graph.start().unwrap();
    graph.stop().await;
    assert!(!graph.is_running("relay").unwrap());

    graph.start().unwrap();
    graph.sink("relay").unwrap().send(5).unwrap();
    assert_eq!(graph.source("out").unwrap().recv_async().await.unwrap(), 5);
    graph.stop().await;
}

#[tokio::test]
async fn starting_a_running_graph_errors() {
    let graph = GraphBuilder::<u32>::new()
        .add_stage("relay", Passthrough)
        .compile()
        .unwrap();

    graph.start().unwrap();
    assert!(matches!(
        graph.start().unwrap_err(),
        GraphError::Stage(_)
    ));
    graph.stop().await;
}
