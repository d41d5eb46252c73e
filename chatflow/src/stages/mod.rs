//! Middleware trait and the built-in stages.
//!
//! Stages are the units of work a [`crate::pipeline::PipelineRunner`] drives,
//! one after another, against a single [`PipelineContext`].

mod emote;
mod ports;
mod render;
mod xp;

pub use emote::{platform_emotes, EmoteStage};
pub use ports::Collaborators;
pub use render::RenderStage;
pub use xp::XpStage;

use crate::context::PipelineContext;
use crate::errors::Result;
use async_trait::async_trait;
use std::fmt::Debug;

/// What the runner should do once a stage returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Run the next stage.
    Continue,
    /// Stop here; later stages do not run.
    Halt,
}

/// Trait for pipeline stages.
///
/// A stage may read and write the context, suspend while it waits on a
/// collaborator, and then decide whether the pipeline continues. Returning
/// an error aborts the pipeline for this context.
#[async_trait]
pub trait Middleware: Send + Sync + Debug {
    /// Returns the name of the stage.
    fn name(&self) -> &str;

    /// Executes the stage against one context.
    async fn execute(&self, ctx: &mut PipelineContext) -> Result<Flow>;
}

/// A stage backed by a synchronous closure.
pub struct FnMiddleware<F>
where
    F: Fn(&mut PipelineContext) -> Result<Flow> + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: Fn(&mut PipelineContext) -> Result<Flow> + Send + Sync,
{
    /// Creates a new function-based stage.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnMiddleware<F>
where
    F: Fn(&mut PipelineContext) -> Result<Flow> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnMiddleware")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&mut PipelineContext) -> Result<Flow> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<Flow> {
        (self.func)(ctx)
    }
}
