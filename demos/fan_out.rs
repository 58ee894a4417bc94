//! Minimal walkthrough: one stage fanning out to two external outputs.
//!
//! Run with `cargo run --example fan_out`.

use flowline::control::Directive;
use flowline::graphs::GraphBuilder;
use flowline::telemetry;
use flowline::transform::from_fn;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init_tracing();

    let graph = GraphBuilder::new()
        .add_stage("square", from_fn(|n: u64| Directive::Emit(n * n)))
        .add_edge("square", "left")
        .add_edge("square", "right")
        .compile()?;

    graph.start()?;

    let sink = graph.sink("square")?;
    for n in 1..=5u64 {
        sink.send(n)?;
    }

    let left = graph.source("left")?;
    let right = graph.source("right")?;
    for _ in 0..5 {
        let l = left.recv_async().await?;
        let r = right.recv_async().await?;
        println!("left={l} right={r}");
    }

    graph.stop().await;
    Ok(())
}
