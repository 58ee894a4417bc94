//! Simulated video pipeline: a frame source, three effect stages, and a
//! display that re-arms the source through a feedback cycle.
//!
//! The shape mirrors a real capture pipeline: the display pushes an
//! enable/continue control item back into the decoder after presenting each
//! frame, so exactly one frame is in flight per lap, and either end can shut
//! the run down: the decoder by exhausting its feed, the display by
//! "closing its window" after a fixed number of frames.
//!
//! Run with `cargo run --example video_pipeline`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use rand::RngExt;

use flowline::config::RuntimeConfig;
use flowline::control::Directive;
use flowline::graphs::GraphBuilder;
use flowline::telemetry;
use flowline::transform::{StageContext, Transform, TransformError};

/// The one item type flowing through the whole graph: frames downstream,
/// enable/continue control upstream through the cycle.
#[derive(Clone, Debug)]
enum Signal {
    Control(bool),
    Frame(Frame),
}

#[derive(Clone, Debug)]
struct Frame {
    index: u64,
    scanline: String,
}

/// Source: pulls one frame from the simulated feed for every `Control(true)`
/// it receives; halts on disable or when the feed is exhausted.
struct Decoder {
    feed: Mutex<VecDeque<String>>,
    cursor: AtomicU64,
}

impl Decoder {
    fn new(frames: impl IntoIterator<Item = String>) -> Self {
        Self {
            feed: Mutex::new(frames.into_iter().collect()),
            cursor: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl Transform<Signal> for Decoder {
    async fn apply(
        &self,
        item: Signal,
        ctx: StageContext,
    ) -> Result<Directive<Signal>, TransformError> {
        match item {
            Signal::Control(false) => {
                ctx.emit("feed", "disabled; releasing feed")?;
                Ok(Directive::Halt)
            }
            Signal::Control(true) => match self.feed.lock().unwrap().pop_front() {
                Some(scanline) => {
                    let index = self.cursor.fetch_add(1, Ordering::Relaxed);
                    Ok(Directive::Emit(Signal::Frame(Frame { index, scanline })))
                }
                None => {
                    ctx.emit("feed", "exhausted; releasing feed")?;
                    Ok(Directive::Halt)
                }
            },
            Signal::Frame(_) => Err(TransformError::InvalidItem(
                "decoder expects control items".into(),
            )),
        }
    }
}

/// Horizontal flip.
struct MirrorEffect;

#[async_trait]
impl Transform<Signal> for MirrorEffect {
    async fn apply(
        &self,
        item: Signal,
        _ctx: StageContext,
    ) -> Result<Directive<Signal>, TransformError> {
        let frame = expect_frame(item)?;
        Ok(Directive::Emit(Signal::Frame(Frame {
            scanline: frame.scanline.chars().rev().collect(),
            ..frame
        })))
    }
}

/// Random horizontal shake.
struct ShakeEffect {
    max_shift: usize,
}

#[async_trait]
impl Transform<Signal> for ShakeEffect {
    async fn apply(
        &self,
        item: Signal,
        _ctx: StageContext,
    ) -> Result<Directive<Signal>, TransformError> {
        let frame = expect_frame(item)?;
        let shift = rand::rng().random_range(0..=self.max_shift);
        Ok(Directive::Emit(Signal::Frame(Frame {
            scanline: format!("{}{}", " ".repeat(shift), frame.scanline),
            ..frame
        })))
    }
}

/// Stamps a marker onto the frame.
struct OverlayEffect {
    marker: &'static str,
}

#[async_trait]
impl Transform<Signal> for OverlayEffect {
    async fn apply(
        &self,
        item: Signal,
        _ctx: StageContext,
    ) -> Result<Directive<Signal>, TransformError> {
        let frame = expect_frame(item)?;
        Ok(Directive::Emit(Signal::Frame(Frame {
            scanline: format!("{} {}", frame.scanline, self.marker),
            ..frame
        })))
    }
}

/// Terminal sink: presents each frame, then pushes a continue signal back
/// into the graph instead of the frame itself. Halts once the "window" is
/// closed after `limit` frames.
struct Display {
    shown: AtomicU64,
    limit: u64,
}

#[async_trait]
impl Transform<Signal> for Display {
    async fn apply(
        &self,
        item: Signal,
        ctx: StageContext,
    ) -> Result<Directive<Signal>, TransformError> {
        let frame = expect_frame(item)?;
        println!("frame {:>3} | {}", frame.index, frame.scanline);

        let shown = self.shown.fetch_add(1, Ordering::Relaxed) + 1;
        if shown >= self.limit {
            ctx.emit("render", format!("window closed after {shown} frames"))?;
            return Ok(Directive::Halt);
        }
        Ok(Directive::Emit(Signal::Control(true)))
    }
}

fn expect_frame(item: Signal) -> Result<Frame, TransformError> {
    match item {
        Signal::Frame(frame) => Ok(frame),
        Signal::Control(_) => Err(TransformError::InvalidItem(
            "effect stages expect frames".into(),
        )),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init_tracing();

    let feed = (0..24usize).map(|n| format!("{:=<20}", "-".repeat(n % 5 + 1)));

    let graph = GraphBuilder::new()
        .add_stage("decoder", Decoder::new(feed))
        .add_stage("mirror", MirrorEffect)
        .add_stage("shake", ShakeEffect { max_shift: 6 })
        .add_stage("overlay", OverlayEffect { marker: "<3" })
        .add_stage("display", Display { shown: AtomicU64::new(0), limit: 16 })
        .add_edge("decoder", "mirror")
        .add_edge("mirror", "shake")
        .add_edge("shake", "overlay")
        .add_edge("overlay", "display")
        .add_edge("display", "decoder") // feedback: re-arm the source
        .with_runtime_config(RuntimeConfig::default().with_stdout_event_bus())
        .compile()?;

    graph.start()?;

    // One control item primes the cycle; after that the display keeps the
    // decoder armed, one frame in flight at a time.
    graph.sink("decoder")?.send(Signal::Control(true))?;

    graph.wait_for_halt(&["display", "decoder"]).await?;
    graph.stop().await;
    Ok(())
}
