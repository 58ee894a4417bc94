use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use flowline::control::Directive;
use flowline::transform::{StageContext, Transform, TransformError};

/// Forwards every item unchanged and records what it observed.
#[derive(Clone, Default)]
pub struct Recorder {
    seen: Arc<Mutex<Vec<u32>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> Vec<u32> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transform<u32> for Recorder {
    async fn apply(&self, item: u32, _ctx: StageContext) -> Result<Directive<u32>, TransformError> {
        self.seen.lock().unwrap().push(item);
        Ok(Directive::Emit(item))
    }
}

/// Forwards items until the `limit`-th one, which halts the stage without
/// forwarding.
#[derive(Clone, Copy)]
pub struct HaltAfter {
    pub limit: u64,
}

#[async_trait]
impl Transform<u32> for HaltAfter {
    async fn apply(&self, item: u32, ctx: StageContext) -> Result<Directive<u32>, TransformError> {
        if ctx.sequence >= self.limit {
            Ok(Directive::Halt)
        } else {
            Ok(Directive::Emit(item))
        }
    }
}

/// Adds one and forwards; handy for counting round trips through a cycle.
#[derive(Clone, Copy, Default)]
pub struct Increment;

#[async_trait]
impl Transform<u32> for Increment {
    async fn apply(&self, item: u32, _ctx: StageContext) -> Result<Directive<u32>, TransformError> {
        Ok(Directive::Emit(item + 1))
    }
}

/// Emits a diagnostic for every item, then forwards it unchanged.
#[derive(Clone, Copy, Default)]
pub struct Announcer;

#[async_trait]
impl Transform<u32> for Announcer {
    async fn apply(&self, item: u32, ctx: StageContext) -> Result<Directive<u32>, TransformError> {
        ctx.emit("announce", format!("saw {item}"))?;
        Ok(Directive::Emit(item))
    }
}

/// Fails on every item.
#[derive(Clone, Copy, Default)]
pub struct AlwaysFails;

#[async_trait]
impl Transform<u32> for AlwaysFails {
    async fn apply(&self, _item: u32, _ctx: StageContext) -> Result<Directive<u32>, TransformError> {
        Err(TransformError::InvalidItem("refusing every item".into()))
    }
}
